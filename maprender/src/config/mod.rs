//! User configuration stored in `~/.maprender/config.ini`.
//!
//! Settings structs live in [`settings`], constants in [`defaults`], INI
//! parsing in `parser` and serialization in `writer`.
//!
//! ```no_run
//! use maprender::config::ConfigFile;
//! use maprender::executor::DispatcherConfig;
//!
//! let config = ConfigFile::load().unwrap_or_default();
//! let dispatcher_config = DispatcherConfig::from(&config.render);
//! ```

pub mod defaults;
mod file;
mod parser;
pub mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{ConfigFile, GridSettings, LoggingSettings, RenderSettings};
