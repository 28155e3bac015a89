//! ReliefScan CLI - carriage track / ridge / hollow detection on LiDAR
//! tile sets.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::{config, detect, tiles};
use crate::error::CliError;

#[derive(Parser)]
#[command(name = "reliefscan", version, about = "Linear structure detection on LiDAR DTM tiles")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one detection from a stroke
    Detect(detect::DetectArgs),
    /// Tile management (import, info)
    Tiles {
        #[command(subcommand)]
        action: tiles::TilesAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    tracing::debug!("reliefscan {}", env!("CARGO_PKG_VERSION"));
    let result: Result<(), CliError> = match cli.command {
        Command::Detect(args) => detect::run(args),
        Command::Tiles { action } => tiles::run(action),
        Command::Config { action } => config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
