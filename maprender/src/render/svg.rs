//! SVG document writer.

use std::fmt::{self, Write as _};

use super::writer::DocumentWriter;
use super::{query_layer, LayerStyles, OutputFormat};
use crate::error::{MapError, MapResult};
use crate::geometry::{rings, Geometry, GeometryExt, LineString, ViewTransform};
use crate::map::Map;
use crate::style::Symbolizer;

/// Writes maps as SVG, one `<g>` per layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgWriter;

impl DocumentWriter for SvgWriter {
    fn name(&self) -> &'static str {
        "svg"
    }

    fn supports(&self, format: &OutputFormat) -> bool {
        matches!(format, OutputFormat::Svg)
    }

    fn write(&self, map: &Map, _format: &OutputFormat) -> MapResult<Vec<u8>> {
        let extent = map.render_extent()?;
        let (width, height) = (map.width(), map.height());
        let view = ViewTransform::new(width, height, extent);

        let mut out = String::new();
        write_header(&mut out, map).map_err(svg_error)?;
        for layer in map.layers() {
            let features = query_layer(map, layer, &extent, Some(Default::default()))?;
            let styles = LayerStyles::resolve(map, layer);
            writeln!(out, "  <g id=\"{}\">", attr_escape(&layer.name)).map_err(svg_error)?;
            let mut written = Ok(());
            for feature in &features {
                styles.each_symbolizer(feature.geometry.geometry_type(), |symbolizer| {
                    if written.is_ok() {
                        written = write_feature(&mut out, &view, &feature.geometry, symbolizer);
                    }
                });
            }
            written.map_err(svg_error)?;
            out.push_str("  </g>\n");
        }
        out.push_str("</svg>\n");
        Ok(out.into_bytes())
    }
}

fn svg_error(e: fmt::Error) -> MapError {
    MapError::Codec(format!("failed to write SVG document: {}", e))
}

fn write_header(out: &mut String, map: &Map) -> fmt::Result {
    let (w, h) = (map.width(), map.height());
    writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">"
    )?;
    if let Some(bg) = map.background() {
        writeln!(
            out,
            "  <rect width=\"100%\" height=\"100%\" fill=\"{}\" fill-opacity=\"{}\"/>",
            bg.to_hex(),
            bg.opacity()
        )?;
    }
    Ok(())
}

fn write_feature(
    out: &mut String,
    view: &ViewTransform,
    geometry: &Geometry,
    symbolizer: &Symbolizer,
) -> fmt::Result {
    match symbolizer {
        Symbolizer::Polygon(s) => {
            let d = path_data(geometry, view, true)?;
            if !d.is_empty() {
                let fill = s.fill.with_opacity(s.fill_opacity);
                writeln!(
                    out,
                    "    <path d=\"{}\" fill=\"{}\" fill-opacity=\"{}\" fill-rule=\"evenodd\"/>",
                    d,
                    fill.to_hex(),
                    fill.opacity()
                )?;
            }
        }
        Symbolizer::Line(s) => {
            let d = path_data(geometry, view, false)?;
            if !d.is_empty() {
                let stroke = s.stroke.with_opacity(s.stroke_opacity);
                writeln!(
                    out,
                    "    <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-opacity=\"{}\" stroke-width=\"{}\"/>",
                    d,
                    stroke.to_hex(),
                    stroke.opacity(),
                    s.stroke_width
                )?;
            }
        }
        Symbolizer::Marker(s) => {
            let fill = s.fill.with_opacity(s.opacity);
            for c in geometry.marker_positions() {
                let (x, y) = view.forward(c);
                writeln!(
                    out,
                    "    <circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"{}\" fill-opacity=\"{}\"/>",
                    x,
                    y,
                    s.radius,
                    fill.to_hex(),
                    fill.opacity()
                )?;
            }
        }
    }
    Ok(())
}

fn push_line(d: &mut String, view: &ViewTransform, line: &LineString, close: bool) -> fmt::Result {
    for (i, c) in line.coords().enumerate() {
        let (x, y) = view.forward(*c);
        write!(d, "{}{} {} ", if i == 0 { "M" } else { "L" }, x, y)?;
    }
    if close && line.0.first().is_some() {
        d.push_str("Z ");
    }
    Ok(())
}

/// SVG path data; `areas` selects polygon rings only, otherwise lines and
/// polygon outlines.
fn path_data(geometry: &Geometry, view: &ViewTransform, areas: bool) -> Result<String, fmt::Error> {
    let mut d = String::new();
    if !areas {
        for line in geometry.line_parts() {
            push_line(&mut d, view, &line, false)?;
        }
    }
    for polygon in geometry.polygon_parts() {
        for ring in rings(&polygon) {
            push_line(&mut d, view, ring, true)?;
        }
    }
    Ok(d.trim_end().to_string())
}

fn attr_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::{Feature, MemoryDatasource};
    use crate::geometry::{BBox, Point, Rect};
    use crate::map::Layer;

    fn map() -> Map {
        let mut map = Map::new(64, 32).unwrap();
        map.add_layer(
            Layer::new("mixed").with_datasource(MemoryDatasource::new(vec![
                Feature::new(1, Point::new(5.0, 5.0)),
                Feature::new(2, LineString::from(vec![(0.0, 0.0), (10.0, 10.0)])),
            ])),
        );
        map.zoom_to_box(BBox::new(0.0, 0.0, 20.0, 10.0));
        map
    }

    #[test]
    fn test_svg_document_structure() {
        let bytes = SvgWriter.write(&map(), &OutputFormat::Svg).unwrap();
        let svg = String::from_utf8(bytes).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("width=\"64\" height=\"32\""));
        assert!(svg.contains("<g id=\"mixed\">"));
        assert!(svg.contains("<circle"));
        assert!(svg.contains("stroke=\"#000000\""));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_path_data_for_line() {
        let view = ViewTransform::new(10, 10, BBox::new(0.0, 0.0, 10.0, 10.0));
        let line = Geometry::LineString(LineString::from(vec![(0.0, 0.0), (10.0, 10.0)]));
        assert_eq!(path_data(&line, &view, false).unwrap(), "M0 10 L10 0");
        assert_eq!(path_data(&line, &view, true).unwrap(), "");
    }

    #[test]
    fn test_path_data_closes_polygon_rings() {
        let view = ViewTransform::new(10, 10, BBox::new(0.0, 0.0, 10.0, 10.0));
        let square = Geometry::Rect(Rect::new((0.0, 0.0), (10.0, 10.0)));
        let d = path_data(&square, &view, true).unwrap();
        assert_eq!(d.matches('M').count(), 1);
        assert!(d.contains("0 0") && d.contains("10 10"));
        assert!(d.ends_with('Z'));
        assert_eq!(path_data(&square, &view, false).unwrap(), d);
    }
}
