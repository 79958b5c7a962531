//! File-based compression command.
//!
//! Audio is streamed through a [`RingBuffer`] whose pre-delay is the
//! configured look-ahead. Each block the newest samples (or the matching
//! block of an external side-chain file) key the compressor's side chain,
//! while the samples falling out of the ring at the delayed read cursor are
//! compressed. Gain reduction therefore starts up to one look-ahead before
//! a transient reaches the output. The output is trimmed by the pre-delay
//! so it lines up with the input.

use super::common::{ParamOverrides, linear_to_db, load_config, peak};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use squeezer_core::{Compressor, Design, RingBuffer};
use squeezer_io::{WavSpec, read_wav, write_wav};
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct ProcessArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Configuration file (TOML)
    #[arg(short, long, conflicts_with = "preset")]
    config: Option<PathBuf>,

    /// Factory preset name
    #[arg(short, long)]
    preset: Option<String>,

    #[command(flatten)]
    params: ParamOverrides,

    /// External side-chain WAV file (mono or same channels as INPUT)
    #[arg(long, value_name = "FILE")]
    side_chain: Option<PathBuf>,

    /// Samples read from the file per block
    #[arg(long, default_value = "512")]
    block_size: usize,

    /// Output bit depth (8, 16, 24 or 32; defaults to the input's)
    #[arg(long)]
    bit_depth: Option<u16>,

    /// Write the effective configuration to this TOML file
    #[arg(long)]
    save_config: Option<PathBuf>,
}

/// Copy `count` samples from `source[channel][start..]` into `block`,
/// padding with silence past the end of the source.
fn copy_block(source: &[Vec<f32>], start: usize, count: usize, block: &mut [Vec<f32>]) {
    for (dst, src) in block.iter_mut().zip(source) {
        let from = start.min(src.len());
        let available = (src.len() - from).min(count);
        dst.clear();
        dst.extend_from_slice(&src[from..from + available]);
        dst.resize(count, 0.0);
    }
}

/// Render `input` through `compressor`, keyed by `key`, with `look_ahead`
/// samples of look-ahead.
///
/// In feed-forward mode `key` always drives detection, so pass `input`
/// itself when there is no external side chain.
///
/// Returns channels of the input's length and the largest gain reduction
/// seen at a block boundary.
fn render(
    input: &[Vec<f32>],
    key: &[Vec<f32>],
    compressor: &mut Compressor<f32>,
    look_ahead: usize,
    block_size: usize,
    progress: &ProgressBar,
) -> (Vec<Vec<f32>>, f32) {
    let channels = input.len();
    let frames = input.first().map_or(0, Vec::len);
    let total = frames + look_ahead;

    // feed-forward detection always reads the undelayed key; feed-back
    // detection stays on the output unless an external key was requested
    if compressor.design() == Design::FeedForward {
        compressor.set_external_side_chain(true);
    }

    let mut ring = RingBuffer::<f32>::new(channels, block_size, look_ahead, block_size);
    let buffers = |capacity: usize| -> Vec<Vec<f32>> {
        (0..channels).map(|_| Vec::with_capacity(capacity)).collect()
    };
    let mut fresh = buffers(block_size);
    let mut side = buffers(block_size);
    let mut delayed = buffers(block_size);
    let mut output = buffers(total);
    let mut max_gain_reduction = 0.0_f32;

    // past the end of the input, silence flushes the look-ahead tail
    let mut position = 0;
    while position < total {
        let n = block_size.min(total - position);
        copy_block(input, position, n, &mut fresh);
        copy_block(key, position, n, &mut side);
        for channel in &mut delayed {
            channel.resize(n, 0.0);
        }

        ring.add_from(&fresh, 0, n);
        ring.remove_to(&mut delayed, 0, n);
        compressor.process_block_with_side_chain(&mut delayed, &side);
        max_gain_reduction = max_gain_reduction.max(compressor.max_gain_reduction());

        for (out, block) in output.iter_mut().zip(&delayed) {
            out.extend_from_slice(block);
        }
        position += n;
        progress.set_position(position.min(frames) as u64);
    }

    tracing::debug!(look_ahead, block_size, "flushed look-ahead");

    for channel in &mut output {
        channel.drain(..look_ahead);
    }
    (output, max_gain_reduction)
}

/// Read the external side-chain file, matched to `channels` channels.
fn read_side_chain(
    path: &Path,
    channels: usize,
    sample_rate: u32,
) -> anyhow::Result<Vec<Vec<f32>>> {
    let (key, spec) = read_wav(path)?;
    anyhow::ensure!(
        spec.sample_rate == sample_rate,
        "side chain runs at {} Hz, input at {sample_rate} Hz",
        spec.sample_rate
    );

    match key.len() {
        n if n == channels => Ok(key),
        1 => Ok(vec![key[0].clone(); channels]),
        n => anyhow::bail!("side chain has {n} channel(s), input has {channels}"),
    }
}

pub fn run(args: ProcessArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.block_size > 0, "block size must be positive");

    let mut config = load_config(args.config.as_deref(), args.preset.as_deref(), &args.params)?;
    if args.side_chain.is_some() {
        config.external_side_chain = true;
    }
    if let Some(name) = &config.name {
        println!("Using preset: {name}");
    }
    if let Some(path) = &args.save_config {
        config.save(path)?;
        println!("Saved configuration to {}", path.display());
    }

    println!("Reading {}...", args.input.display());
    let (input, spec) = read_wav(&args.input)?;
    let frames = input.first().map_or(0, Vec::len);
    anyhow::ensure!(!input.is_empty(), "input file has no channels");

    println!(
        "  {} channel(s), {} frames, {} Hz, {:.2}s",
        spec.channels,
        frames,
        spec.sample_rate,
        frames as f32 / spec.sample_rate as f32
    );

    let side_chain = match &args.side_chain {
        Some(path) => {
            println!("Reading side chain {}...", path.display());
            Some(read_side_chain(path, input.len(), spec.sample_rate)?)
        }
        None => None,
    };
    let key = side_chain.as_deref().unwrap_or(&input);

    let mut compressor = Compressor::<f32>::new(input.len(), spec.sample_rate as f32);
    config.apply(&mut compressor);
    let look_ahead = config.look_ahead_samples(spec.sample_rate);

    println!(
        "Compressing: threshold {:.1} dB, ratio {:.2}:1, {} / {} / {}, look-ahead {} samples",
        config.threshold_db,
        config.ratio,
        config.design(),
        config.detector(),
        config.gain_stage(),
        look_ahead
    );

    let progress = ProgressBar::new(frames as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let (output, max_gain_reduction) = render(
        &input,
        key,
        &mut compressor,
        look_ahead,
        args.block_size,
        &progress,
    );
    progress.finish_with_message("done");

    let input_peak = input.iter().map(|c| peak(c)).fold(0.0, f32::max);
    let output_peak = output.iter().map(|c| peak(c)).fold(0.0, f32::max);
    let channels = 0..compressor.channels();
    let meter_peak = channels
        .clone()
        .map(|c| compressor.peak_output_level(c))
        .fold(f32::MIN, f32::max);
    let meter_average = channels
        .map(|c| compressor.average_output_level(c))
        .fold(f32::MIN, f32::max);

    println!("\nStats:");
    println!("  Input:  Peak {:.1} dB", linear_to_db(input_peak));
    println!("  Output: Peak {:.1} dB", linear_to_db(output_peak));
    println!("  Max gain reduction: {max_gain_reduction:.1} dB");
    println!("  Final output meter: peak {meter_peak:.1} dB, average {meter_average:.1} dB");

    let out_spec = WavSpec {
        bits_per_sample: args.bit_depth.unwrap_or(spec.bits_per_sample),
        ..spec
    };

    println!("\nWriting {}...", args.output.display());
    write_wav(&args.output, &output, out_spec)?;
    println!("Done!");

    Ok(())
}
