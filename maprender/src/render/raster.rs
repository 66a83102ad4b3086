//! Raster rendering with tiny-skia.

use image::RgbaImage;
use tiny_skia::{FillRule, Paint, Pixmap, Shader, Stroke, Transform};

use super::path::{area_path, line_path, marker_path};
use super::{query_layer, LayerStyles};
use crate::error::{MapError, MapResult};
use crate::geometry::{Geometry, GeometryExt, ViewTransform};
use crate::map::Map;
use crate::style::{Color, Symbolizer};

/// Renders every layer at the map's current extent.
pub fn render_image(map: &Map) -> MapResult<RgbaImage> {
    let extent = map.render_extent()?;
    let (width, height) = (map.width(), map.height());
    let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
        MapError::Runtime(format!("failed to allocate a {}x{} canvas", width, height))
    })?;
    if let Some(background) = map.background() {
        pixmap.fill(background.to_skia());
    }

    let view = ViewTransform::new(width, height, extent);
    for layer in map.layers() {
        let features = query_layer(map, layer, &extent, Some(Default::default()))?;
        let styles = LayerStyles::resolve(map, layer);
        for feature in &features {
            styles.each_symbolizer(feature.geometry.geometry_type(), |symbolizer| {
                draw(&mut pixmap, &view, &feature.geometry, symbolizer)
            });
        }
    }

    to_image(&pixmap)
}

fn paint(color: Color, opacity: f32) -> Paint<'static> {
    Paint {
        shader: Shader::SolidColor(color.with_opacity(opacity).to_skia()),
        anti_alias: true,
        ..Default::default()
    }
}

fn draw(pixmap: &mut Pixmap, view: &ViewTransform, geometry: &Geometry, symbolizer: &Symbolizer) {
    match symbolizer {
        Symbolizer::Polygon(s) => {
            if let Some(path) = area_path(geometry, view) {
                pixmap.fill_path(
                    &path,
                    &paint(s.fill, s.fill_opacity),
                    FillRule::EvenOdd,
                    Transform::identity(),
                    None,
                );
            }
        }
        Symbolizer::Line(s) => {
            if let Some(path) = line_path(geometry, view) {
                pixmap.stroke_path(
                    &path,
                    &paint(s.stroke, s.stroke_opacity),
                    &Stroke {
                        width: s.stroke_width,
                        ..Default::default()
                    },
                    Transform::identity(),
                    None,
                );
            }
        }
        Symbolizer::Marker(s) => {
            if let Some(path) = marker_path(geometry, view, s.radius) {
                pixmap.fill_path(
                    &path,
                    &paint(s.fill, s.opacity),
                    FillRule::Winding,
                    Transform::identity(),
                    None,
                );
            }
        }
    }
}

/// Converts tiny-skia's premultiplied pixels into a straight-alpha image.
fn to_image(pixmap: &Pixmap) -> MapResult<RgbaImage> {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), data)
        .ok_or_else(|| MapError::Runtime("rendered buffer has unexpected size".to_string()))
}
