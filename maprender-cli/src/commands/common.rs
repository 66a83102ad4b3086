//! Helpers shared across CLI commands.

use std::path::Path;

use maprender::config::ConfigFile;
use maprender::executor::{Dispatcher, DispatcherConfig};
use maprender::map::Map;
use maprender::render::guess_format;
use tracing::info;

use crate::error::CliError;

/// Map extent parsed from `minx,miny,maxx,maxy`.
///
/// Only the shape is checked here; the library validates the values.
#[derive(Debug, Clone, PartialEq)]
pub struct Extent(pub Vec<f64>);

pub fn parse_extent(s: &str) -> Result<Extent, String> {
    let values = s
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|_| format!("'{}' is not a number", part.trim()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if values.len() != 4 {
        return Err(format!(
            "expected minx,miny,maxx,maxy, got {} values",
            values.len()
        ));
    }
    Ok(Extent(values))
}

/// Loads a stylesheet into a map of the given size.
pub fn load_map(
    stylesheet: &Path,
    width: u32,
    height: u32,
    config: &ConfigFile,
) -> Result<Map, CliError> {
    let mut map = Map::new(width, height)?;
    map.set_buffer_size(config.render.buffer_size);
    map.load(stylesheet)?;
    info!(
        stylesheet = %stylesheet.display(),
        layers = map.layers().len(),
        "Stylesheet loaded"
    );
    Ok(map)
}

/// Explicit format, else the output extension, else the configured default.
pub fn resolve_format(explicit: Option<&str>, output: &Path, config: &ConfigFile) -> String {
    if let Some(format) = explicit {
        return format.to_string();
    }
    match guess_format(output) {
        Ok(format) => format.to_string(),
        Err(_) => config.render.format.clone(),
    }
}

/// Dispatcher sized from the config, reported in panic output.
pub fn dispatcher(config: &ConfigFile) -> Dispatcher {
    let dispatcher = Dispatcher::current(DispatcherConfig::from(&config.render));
    let reporter = dispatcher.clone();
    maprender::panic::set_stats_callback(move || reporter.stats());
    dispatcher
}

pub fn write_output(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    std::fs::write(path, bytes).map_err(|error| CliError::FileWrite {
        path: path.display().to_string(),
        error,
    })?;
    info!(path = %path.display(), bytes = bytes.len(), "Output written");
    Ok(())
}
