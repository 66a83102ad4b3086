//! Rasterizing a layer into a feature-id grid.

use tiny_skia::{FillRule, Mask, Path, Stroke, Transform};
use tracing::{debug, trace};

use super::path::{area_path, line_path, marker_path};
use super::{query_layer, LayerStyles};
use crate::error::{MapError, MapResult};
use crate::geometry::{Geometry, GeometryExt, ViewTransform};
use crate::grid::Grid;
use crate::map::{resolve, LayerSelector, Map};
use crate::style::Symbolizer;

/// Smallest marker radius, in grid cells, so points always claim a cell.
const MIN_MARKER_RADIUS: f32 = 0.75;

/// Renders the selected layer at the map's current extent into `grid`.
///
/// The layer is resolved before anything is drawn. Later features overwrite
/// earlier ones cell by cell.
pub fn render_grid(map: &Map, selector: &LayerSelector, grid: &mut Grid) -> MapResult<()> {
    let (_, layer) = resolve(map.layers(), selector)?;
    if grid.width() == 0 || grid.height() == 0 {
        debug!(layer = %layer.name, "Grid has no cells, nothing to render");
        return Ok(());
    }

    let extent = map.render_extent()?;
    let features = query_layer(map, layer, &extent, Some(grid.query_attributes()))?;
    let view = ViewTransform::new(map.width(), map.height(), extent);
    let step = grid.resolution() as f32;
    let to_grid = Transform::from_scale(1.0 / step, 1.0 / step);
    let styles = LayerStyles::resolve(map, layer);

    let mut skipped = 0usize;
    for feature in &features {
        let Some(slot) = grid.add_feature(feature) else {
            skipped += 1;
            continue;
        };
        let mut mask = Mask::new(grid.width(), grid.height()).ok_or_else(|| {
            MapError::Runtime(format!(
                "failed to allocate a {}x{} grid mask",
                grid.width(),
                grid.height()
            ))
        })?;

        styles.each_symbolizer(feature.geometry.geometry_type(), |symbolizer| {
            if let Some(path) = coverage_path(&feature.geometry, &view, symbolizer, step) {
                mask.fill_path(&path, FillRule::EvenOdd, false, to_grid);
            }
        });
        grid.paint(slot, mask.data());
    }

    if skipped > 0 {
        trace!(layer = %layer.name, skipped, key = grid.key(), "Features without a join value");
    }
    debug!(
        layer = %layer.name,
        features = features.len(),
        width = grid.width(),
        height = grid.height(),
        "Rendered grid"
    );
    Ok(())
}

/// Area a symbolizer covers, in map pixels.
fn coverage_path(
    geometry: &Geometry,
    view: &ViewTransform,
    symbolizer: &Symbolizer,
    step: f32,
) -> Option<Path> {
    match symbolizer {
        Symbolizer::Polygon(_) => area_path(geometry, view),
        Symbolizer::Line(s) => {
            let stroke = Stroke {
                // at least one grid cell wide
                width: s.stroke_width.max(step),
                ..Default::default()
            };
            line_path(geometry, view)?.stroke(&stroke, 1.0)
        }
        Symbolizer::Marker(s) => marker_path(geometry, view, s.radius.max(MIN_MARKER_RADIUS * step)),
    }
}
