//! Squeezer CLI - render audio files through the compressor.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "squeezer")]
#[command(author, version, about = "Squeezer compressor CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a WAV file
    Process(commands::process::ProcessArgs),

    /// Print the static gain-computer curve
    Curve(commands::curve::CurveArgs),

    /// List factory presets
    Presets(commands::presets::PresetsArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Process(args) => commands::process::run(args),
        Commands::Curve(args) => commands::curve::run(&args),
        Commands::Presets(args) => commands::presets::run(&args),
    }
}
