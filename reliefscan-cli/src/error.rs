//! CLI error type.

use thiserror::Error;

/// Errors surfaced to the command line user.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file problem.
    #[error("configuration: {0}")]
    Config(#[from] reliefscan::config::ConfigError),

    /// Tile loading or import problem.
    #[error("tiles: {0}")]
    Tile(#[from] reliefscan::cloud::TileError),

    /// Export problem.
    #[error("export: {0}")]
    Export(#[from] reliefscan::export::ExportError),

    /// Invalid command-line usage.
    #[error("{0}")]
    Usage(String),

    /// Other I/O problem.
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
}
