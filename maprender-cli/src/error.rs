//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use maprender::config::ConfigFileError;
use maprender::{ErrorKind, MapError};

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file or argument problem
    Config(String),
    /// Map loading or rendering failed
    Map(MapError),
    /// Failed to write output file
    FileWrite { path: String, error: std::io::Error },
    /// Failed to serialize JSON output
    Json(serde_json::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Map(e) if e.kind() == ErrorKind::UnknownFormat => {
                eprintln!();
                eprintln!("Pass --format explicitly or use one of these extensions:");
                eprintln!("  .png .jpg .jpeg .tif .tiff .bmp .svg");
            }
            CliError::Map(e) if e.kind() == ErrorKind::Runtime => {
                eprintln!();
                eprintln!("If the map has no data to zoom to, pass --bbox minx,miny,maxx,maxy");
            }
            CliError::Config(_) => {
                eprintln!();
                eprintln!(
                    "Configuration is read from {}",
                    maprender::config::config_file_path().display()
                );
            }
            _ => {}
        }

        process::exit(exit_code(self))
    }
}

/// Usage errors exit with 2, everything else with 1.
fn exit_code(error: &CliError) -> i32 {
    match error {
        CliError::Map(e) if e.is_validation() => 2,
        CliError::Config(_) => 2,
        _ => 1,
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Map(e) => write!(f, "Map error ({}): {}", e.kind(), e),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path, error)
            }
            CliError::Json(e) => write!(f, "Failed to serialize output: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Map(e) => Some(e),
            CliError::FileWrite { error, .. } => Some(error),
            CliError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MapError> for CliError {
    fn from(e: MapError) -> Self {
        CliError::Map(e)
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}
