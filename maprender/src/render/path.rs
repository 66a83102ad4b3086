//! Geometry to tiny-skia path conversion in map pixel space.

use tiny_skia::{Path, PathBuilder};

use crate::geometry::{rings, Geometry, GeometryExt, LineString, ViewTransform};

fn push_line(pb: &mut PathBuilder, view: &ViewTransform, line: &LineString, close: bool) {
    let mut points = line.coords().map(|c| view.forward(*c));
    let Some((x, y)) = points.next() else {
        return;
    };
    pb.move_to(x, y);
    for (x, y) in points {
        pb.line_to(x, y);
    }
    if close {
        pb.close();
    }
}

fn push_rings(pb: &mut PathBuilder, view: &ViewTransform, geometry: &Geometry) {
    for polygon in geometry.polygon_parts() {
        for ring in rings(&polygon) {
            push_line(pb, view, ring, true);
        }
    }
}

/// Filled area of polygonal geometries; `None` for points and lines.
pub(crate) fn area_path(geometry: &Geometry, view: &ViewTransform) -> Option<Path> {
    let mut pb = PathBuilder::new();
    push_rings(&mut pb, view, geometry);
    pb.finish()
}

/// Centre lines of linear geometries and outlines of polygons.
pub(crate) fn line_path(geometry: &Geometry, view: &ViewTransform) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for line in geometry.line_parts() {
        push_line(&mut pb, view, &line, false);
    }
    push_rings(&mut pb, view, geometry);
    pb.finish()
}

/// Discs of `radius` pixels at each marker position.
pub(crate) fn marker_path(geometry: &Geometry, view: &ViewTransform, radius: f32) -> Option<Path> {
    if radius <= 0.0 {
        return None;
    }
    let mut pb = PathBuilder::new();
    for c in geometry.marker_positions() {
        let (x, y) = view.forward(c);
        pb.push_circle(x, y, radius);
    }
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{BBox, MultiLineString, Point, Rect};

    fn view() -> ViewTransform {
        ViewTransform::new(100, 100, BBox::new(0.0, 0.0, 100.0, 100.0))
    }

    fn square() -> Geometry {
        Geometry::Rect(Rect::new((10.0, 10.0), (50.0, 50.0)))
    }

    fn point(x: f64, y: f64) -> Geometry {
        Geometry::Point(Point::new(x, y))
    }

    #[test]
    fn test_area_path_bounds_flip_y() {
        let path = area_path(&square(), &view()).unwrap();
        let b = path.bounds();
        assert_eq!((b.left(), b.top(), b.right(), b.bottom()), (10.0, 50.0, 50.0, 90.0));
    }

    #[test]
    fn test_area_path_none_for_points() {
        assert!(area_path(&point(1.0, 1.0), &view()).is_none());
    }

    #[test]
    fn test_line_path_for_polygon_outline() {
        assert!(line_path(&square(), &view()).is_some());
        assert!(line_path(&point(1.0, 1.0), &view()).is_none());
    }

    #[test]
    fn test_line_path_for_multilinestring() {
        let lines = Geometry::MultiLineString(MultiLineString::new(vec![
            LineString::from(vec![(0.0, 0.0), (10.0, 0.0)]),
            LineString::from(vec![(0.0, 20.0), (10.0, 20.0)]),
        ]));
        let b = line_path(&lines, &view()).unwrap().bounds();
        assert_eq!((b.top(), b.bottom()), (80.0, 100.0));
        assert!(area_path(&lines, &view()).is_none());
    }

    #[test]
    fn test_marker_path_radius() {
        let path = marker_path(&point(50.0, 50.0), &view(), 4.0).unwrap();
        let b = path.bounds();
        assert!((b.width() - 8.0).abs() < 0.01);
        assert!(marker_path(&point(50.0, 50.0), &view(), 0.0).is_none());
    }
}
