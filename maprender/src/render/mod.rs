//! The render executor.
//!
//! Everything here is synchronous and works on a borrowed [`Map`]; the
//! dispatcher decides which thread and which lock it runs under.
//!
//! - [`render_image`] rasterizes the map with tiny-skia
//! - [`render_to_bytes`] encodes it (or routes to a document writer)
//! - [`render_to_file`] does the same into a file
//! - [`render_grid`] rasterizes one layer into a feature-id [`Grid`](crate::grid::Grid)

mod format;
mod grid;
mod path;
mod raster;
mod svg;
pub mod writer;

pub use format::{guess_format, Capability, OutputFormat, DEFAULT_JPEG_QUALITY};
pub use grid::render_grid;
pub use raster::render_image;
pub use svg::SvgWriter;
pub use writer::{document_writer, encode_raster, DocumentWriter};

use std::collections::BTreeSet;
use std::path::Path;

use tracing::{debug, warn};

use crate::datasource::{Feature, Query};
use crate::error::{MapError, MapResult};
use crate::geometry::{BBox, GeometryType, ViewTransform};
use crate::map::{Layer, Map};
use crate::projection::ProjTransform;
use crate::style::{Style, Symbolizer};

/// Renders the map at its current extent into encoded bytes.
pub fn render_to_bytes(map: &Map, format: &OutputFormat) -> MapResult<Vec<u8>> {
    match format.capability() {
        Capability::Raster => {
            let image = render_image(map)?;
            encode_raster(&image, format)
        }
        Capability::Document => document_writer(format)?.write(map, format),
    }
}

/// Renders into a file; the format is inferred from the extension when not given.
pub fn render_to_file(map: &Map, path: &Path, format: Option<&str>) -> MapResult<()> {
    let format = match format {
        Some(name) => OutputFormat::parse(name)?,
        None => guess_format(path)?,
    };
    let bytes = render_to_bytes(map, &format)?;
    std::fs::write(path, &bytes).map_err(|e| {
        MapError::Codec(format!("failed to write '{}': {}", path.display(), e))
    })?;
    debug!(path = %path.display(), %format, bytes = bytes.len(), "Rendered map to file");
    Ok(())
}

/// Queries a layer for everything visible in `extent` (plus the map's
/// buffer), returning features with geometries in the map's reference.
pub(crate) fn query_layer(
    map: &Map,
    layer: &Layer,
    extent: &BBox,
    properties: Option<BTreeSet<String>>,
) -> MapResult<Vec<Feature>> {
    let Some(datasource) = &layer.datasource else {
        return Ok(Vec::new());
    };

    let view = ViewTransform::new(map.width(), map.height(), *extent);
    let pad = map.buffer_size().max(0) as f64 * view.units_per_pixel();
    let buffered = extent.padded(pad, pad);

    let transform = ProjTransform::from_srs(&layer.srs, map.srs())?;
    let query = Query {
        bbox: transform.backward_box(&buffered)?,
        properties,
    };

    let mut features = datasource.features(&query)?;
    if !transform.is_identity() {
        for feature in &mut features {
            feature.geometry = transform.forward_geometry(&feature.geometry)?;
        }
    }
    debug!(layer = %layer.name, features = features.len(), "Queried layer");
    Ok(features)
}

/// The styles a layer draws with.
pub(crate) enum LayerStyles<'a> {
    Named(Vec<&'a Style>),
    /// The layer names no style; each geometry gets the default for its type.
    Default,
}

impl<'a> LayerStyles<'a> {
    pub(crate) fn resolve(map: &'a Map, layer: &Layer) -> Self {
        if layer.styles.is_empty() {
            return LayerStyles::Default;
        }
        let styles = layer
            .styles
            .iter()
            .filter_map(|name| {
                let style = map.style(name);
                if style.is_none() {
                    warn!(layer = %layer.name, style = %name, "Layer references unknown style");
                }
                style
            })
            .collect();
        LayerStyles::Named(styles)
    }

    pub(crate) fn each_symbolizer(&self, geometry: GeometryType, mut f: impl FnMut(&Symbolizer)) {
        match self {
            LayerStyles::Named(styles) => styles
                .iter()
                .flat_map(|s| s.symbolizers())
                .for_each(|s| f(s)),
            LayerStyles::Default => Style::default_for(geometry)
                .symbolizers()
                .for_each(|s| f(s)),
        }
    }
}
