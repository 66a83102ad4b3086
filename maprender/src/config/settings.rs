//! Settings structs, one per `[section]` of the INI file.

use std::path::PathBuf;

use crate::grid::GridOptions;

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub render: RenderSettings,
    pub grid: GridSettings,
    pub logging: LoggingSettings,
}

/// `[render]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    /// Concurrent render workers; 0 means one per core.
    pub workers: usize,
    /// Output format used when none is given and the path has no extension.
    pub format: String,
    /// Pixels of extra data queried around the extent.
    pub buffer_size: i32,
}

/// `[grid]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSettings {
    /// Join field used as the feature key.
    pub key: String,
    /// Map pixels per grid cell.
    pub resolution: u32,
}

impl GridSettings {
    /// Grid options seeded from these settings, with no fields requested.
    pub fn to_options(&self) -> GridOptions {
        GridOptions::default()
            .with_key(self.key.clone())
            .with_resolution(self.resolution)
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
}
