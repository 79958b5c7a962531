//! Factory preset listing command.

use clap::Args;
use squeezer_config::{factory_preset_toml, factory_presets};

#[derive(Args)]
pub struct PresetsArgs {
    /// Print the TOML of one preset instead of the list
    #[arg(long, value_name = "NAME")]
    dump: Option<String>,
}

pub fn run(args: &PresetsArgs) -> anyhow::Result<()> {
    if let Some(name) = &args.dump {
        let toml_str = factory_preset_toml(name).ok_or_else(|| {
            anyhow::anyhow!("Preset '{name}' not found. Use 'squeezer presets' to see available presets.")
        })?;
        println!("{}", toml_str.trim());
        return Ok(());
    }

    println!("Factory Presets\n");
    for (name, preset) in squeezer_config::FACTORY_PRESET_NAMES.iter().zip(factory_presets()) {
        println!(
            "  {name:<14} {:<6} {:<17} {}",
            preset.gain_stage,
            preset.detector,
            preset.description.as_deref().unwrap_or("")
        );
    }
    println!("\nUse 'squeezer presets --dump NAME' to print a preset as TOML.");

    Ok(())
}
