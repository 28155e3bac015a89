//! Configuration management commands.

use std::path::PathBuf;

use clap::Subcommand;
use reliefscan::config::DetectionConfig;

use crate::error::CliError;

/// Configuration action subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Write a default configuration file
    Init {
        /// Target file path
        path: PathBuf,
    },
    /// Print a summary of a configuration file
    Show {
        /// Configuration file path
        path: PathBuf,
    },
}

/// Run a config subcommand.
pub fn run(action: ConfigAction) -> Result<(), CliError> {
    match action {
        ConfigAction::Init { path } => {
            DetectionConfig::default().save(&path)?;
            println!("wrote {}", path.display());
            Ok(())
        }
        ConfigAction::Show { path } => {
            let cfg = DetectionConfig::load(&path)?;
            println!("cloud access:  {:?} (1/{} cells)", cfg.cloud_access, cfg.cloud_access.subdivision());
            println!("mode:          {:?}", cfg.mode);
            println!("ctrack:        lack {} / min length {} mm", cfg.ctrack.lack_tolerance, cfg.ctrack.model.min_length);
            println!("ridge:         lack {} / min height {} mm", cfg.ridge.lack_tolerance, cfg.ridge.model.min_height);
            match cfg.stroke {
                Some(s) => println!(
                    "stroke:        ({}, {}) -> ({}, {})",
                    s.p1.x(),
                    s.p1.y(),
                    s.p2.x(),
                    s.p2.y()
                ),
                None => println!("stroke:        none"),
            }
            Ok(())
        }
    }
}
