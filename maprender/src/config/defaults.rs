//! Default values for every configuration setting.

use std::path::PathBuf;

use super::settings::*;
use crate::executor::AUTO_WORKERS;
use crate::grid::{DEFAULT_GRID_KEY, DEFAULT_GRID_RESOLUTION};

// =============================================================================
// Render defaults
// =============================================================================

pub const DEFAULT_WORKERS: usize = AUTO_WORKERS;

pub const DEFAULT_FORMAT: &str = "png";

pub const DEFAULT_BUFFER_SIZE: i32 = 0;

// =============================================================================
// Logging defaults
// =============================================================================

pub const DEFAULT_LOG_FILE: &str = "maprender.log";

/// `~/.maprender/logs`
pub fn default_log_directory() -> PathBuf {
    super::file::config_directory().join("logs")
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            render: RenderSettings::default(),
            grid: GridSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            format: DEFAULT_FORMAT.to_string(),
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            key: DEFAULT_GRID_KEY.to_string(),
            resolution: DEFAULT_GRID_RESOLUTION,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: default_log_directory(),
            file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}
