//! Geometry primitives shared by datasources, renderers and the grid encoder.
//!
//! Feature geometries are [`geo_types`] values in the units of whichever
//! spatial reference the owning layer or map declares; reprojection lives in
//! [`crate::projection`]. [`BBox`] carries map extents and the aspect-ratio
//! logic applied by `zoom_to_box`.

mod bbox;
mod transform;

use std::borrow::Cow;

use geo::BoundingRect;
use serde::Serialize;

pub use bbox::BBox;
pub use transform::ViewTransform;

/// A single position.
pub type Coord = geo_types::Coord<f64>;
/// Feature geometry.
pub type Geometry = geo_types::Geometry<f64>;
pub type Point = geo_types::Point<f64>;
pub type LineString = geo_types::LineString<f64>;
pub type Polygon = geo_types::Polygon<f64>;
pub type MultiPoint = geo_types::MultiPoint<f64>;
pub type MultiLineString = geo_types::MultiLineString<f64>;
pub type MultiPolygon = geo_types::MultiPolygon<f64>;
pub type Rect = geo_types::Rect<f64>;
pub type GeometryCollection = geo_types::GeometryCollection<f64>;

/// Broad geometry category, used for datasource descriptions and default styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryType {
    Point,
    Linestring,
    Polygon,
    Collection,
}

impl From<Rect> for BBox {
    fn from(rect: Rect) -> Self {
        BBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }
}

/// Rendering-oriented queries over a feature geometry.
pub trait GeometryExt {
    fn geometry_type(&self) -> GeometryType;

    /// Bounding box of all vertices; `BBox::empty()` when there are none.
    fn envelope(&self) -> BBox;

    /// Polygonal parts, with rectangles and triangles converted.
    fn polygon_parts(&self) -> Vec<Cow<'_, Polygon>>;

    /// Linear parts; polygon rings are not included.
    fn line_parts(&self) -> Vec<Cow<'_, LineString>>;

    /// Point positions for marker placement: the vertices of point
    /// geometries, the envelope centre of everything else.
    fn marker_positions(&self) -> Vec<Coord>;
}

impl GeometryExt for Geometry {
    fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::Point(_) | Geometry::MultiPoint(_) => GeometryType::Point,
            Geometry::Line(_) | Geometry::LineString(_) | Geometry::MultiLineString(_) => {
                GeometryType::Linestring
            }
            Geometry::Polygon(_)
            | Geometry::MultiPolygon(_)
            | Geometry::Rect(_)
            | Geometry::Triangle(_) => GeometryType::Polygon,
            Geometry::GeometryCollection(_) => GeometryType::Collection,
        }
    }

    fn envelope(&self) -> BBox {
        self.bounding_rect().map(BBox::from).unwrap_or_else(BBox::empty)
    }

    fn polygon_parts(&self) -> Vec<Cow<'_, Polygon>> {
        match self {
            Geometry::Polygon(p) => vec![Cow::Borrowed(p)],
            Geometry::MultiPolygon(mp) => mp.0.iter().map(Cow::Borrowed).collect(),
            Geometry::Rect(r) => vec![Cow::Owned(r.to_polygon())],
            Geometry::Triangle(t) => vec![Cow::Owned(t.to_polygon())],
            Geometry::GeometryCollection(gc) => gc.0.iter().flat_map(|g| g.polygon_parts()).collect(),
            _ => Vec::new(),
        }
    }

    fn line_parts(&self) -> Vec<Cow<'_, LineString>> {
        match self {
            Geometry::Line(l) => vec![Cow::Owned(LineString::new(vec![l.start, l.end]))],
            Geometry::LineString(ls) => vec![Cow::Borrowed(ls)],
            Geometry::MultiLineString(mls) => mls.0.iter().map(Cow::Borrowed).collect(),
            Geometry::GeometryCollection(gc) => gc.0.iter().flat_map(|g| g.line_parts()).collect(),
            _ => Vec::new(),
        }
    }

    fn marker_positions(&self) -> Vec<Coord> {
        match self {
            Geometry::Point(p) => vec![p.0],
            Geometry::MultiPoint(mp) => mp.0.iter().map(|p| p.0).collect(),
            Geometry::GeometryCollection(gc) => {
                gc.0.iter().flat_map(|g| g.marker_positions()).collect()
            }
            _ => match self.bounding_rect() {
                Some(rect) => vec![rect.center()],
                None => Vec::new(),
            },
        }
    }
}

/// Exterior ring followed by the holes.
pub fn rings(polygon: &Polygon) -> impl Iterator<Item = &LineString> {
    std::iter::once(polygon.exterior()).chain(polygon.interiors())
}
