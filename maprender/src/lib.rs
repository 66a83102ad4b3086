//! MapRender - asynchronous map rendering
//!
//! A [`map::Map`] holds the layers, styles and extent of a map. Loaded from
//! an XML stylesheet, it is shared between render jobs as a
//! [`map::SharedMap`] and rendered to raster images, SVG documents or
//! UTFGrid-style feature grids.
//!
//! # High-Level API
//!
//! ```ignore
//! use maprender::executor::{Dispatcher, DispatcherConfig};
//! use maprender::map::{Map, SharedMap};
//!
//! let mut map = Map::new(256, 256)?;
//! map.load(Path::new("style.xml"))?;
//! let map = SharedMap::new(map);
//!
//! let dispatcher = Dispatcher::current(DispatcherConfig::default());
//! let handle = dispatcher.submit(&map, job)?;
//! let output = handle.wait().await?;
//! ```

pub mod config;
pub mod datasource;
pub mod error;
pub mod executor;
pub mod geometry;
pub mod grid;
pub mod logging;
pub mod map;
pub mod panic;
pub mod projection;
pub mod render;
pub mod style;

pub use error::{ErrorKind, MapError, MapResult};

/// Version of the MapRender library and CLI.
///
/// Defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
