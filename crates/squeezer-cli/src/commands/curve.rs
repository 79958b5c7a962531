//! Static curve printing command.

use super::common::{ParamOverrides, load_config};
use clap::Args;
use squeezer_core::GainComputer;
use std::path::PathBuf;

#[derive(Args)]
pub struct CurveArgs {
    /// Configuration file (TOML)
    #[arg(short, long, conflicts_with = "preset")]
    config: Option<PathBuf>,

    /// Factory preset name
    #[arg(short, long)]
    preset: Option<String>,

    #[command(flatten)]
    params: ParamOverrides,

    /// Input level step in dB
    #[arg(long, default_value = "3")]
    step: u32,
}

/// `(input dB, gain reduction dB, output dB)` rows from -60 dB to 0 dB.
pub fn curve_table(computer: &GainComputer<f32>, step: u32) -> Vec<(f32, f32, f32)> {
    // count down from 0 dB so the table always ends there
    let mut levels: Vec<i32> = (0..=60).step_by(step.max(1) as usize).map(|x| -x).collect();
    levels.reverse();

    levels
        .into_iter()
        .map(|db| {
            let input = db as f32;
            let reduction = computer.process_gain(input);
            (input, reduction, input - reduction)
        })
        .collect()
}

pub fn run(args: &CurveArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref(), args.preset.as_deref(), &args.params)?;

    let mut computer = GainComputer::new();
    computer.set_threshold(config.threshold_db);
    computer.set_ratio(config.ratio);
    computer.set_knee_width(config.knee_width_db);

    println!(
        "Threshold {:.1} dB, ratio {:.2}:1, knee {:.1} dB\n",
        config.threshold_db, config.ratio, config.knee_width_db
    );
    println!("{:>10}  {:>10}  {:>10}", "input", "reduction", "output");
    println!("{}", "-".repeat(34));
    for (input, reduction, output) in curve_table(&computer, args.step) {
        println!("{input:>7.1} dB  {reduction:>7.2} dB  {output:>7.2} dB");
    }

    Ok(())
}
