//! Spatial reference parsing and reprojection.
//!
//! Only the two reference systems web maps actually use are understood:
//! geographic WGS84 longitude/latitude and spherical Web Mercator. Anything
//! else is reported as a [`MapError::Projection`].

use std::f64::consts::PI;

use geo::MapCoords;

use crate::error::{MapError, MapResult};
use crate::geometry::{BBox, Coord, Geometry};

/// Default map and layer spatial reference.
pub const DEFAULT_SRS: &str = "+proj=longlat +ellps=WGS84 +datum=WGS84 +no_defs";

/// Web Mercator spatial reference string.
pub const MERCATOR_SRS: &str = "+proj=merc +a=6378137 +b=6378137 +lat_ts=0.0 +lon_0=0.0 +x_0=0.0 +y_0=0.0 +k=1.0 +units=m +nadgrids=@null +wktext +no_defs +over";

/// Spherical earth radius used by Web Mercator.
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Web Mercator valid latitude range.
const MAX_MERCATOR_LAT: f64 = 85.0511287798066;

/// A recognised spatial reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Longitude/latitude degrees.
    Geographic,
    /// Spherical Mercator metres.
    WebMercator,
}

impl Projection {
    /// Parses a proj4 string or an `epsg:` code.
    pub fn parse(srs: &str) -> MapResult<Self> {
        let normalized = srs.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(MapError::Projection("empty spatial reference".to_string()));
        }

        let init = normalized
            .strip_prefix("+init=")
            .unwrap_or(normalized.as_str());
        match init {
            "epsg:4326" => return Ok(Projection::Geographic),
            "epsg:3857" | "epsg:900913" | "epsg:3785" => return Ok(Projection::WebMercator),
            _ => {}
        }

        let proj = normalized
            .split_whitespace()
            .find_map(|token| token.strip_prefix("+proj="));
        match proj {
            Some("longlat") | Some("latlong") | Some("lonlat") | Some("latlon") => {
                Ok(Projection::Geographic)
            }
            Some("merc") => Ok(Projection::WebMercator),
            _ => Err(MapError::Projection(format!(
                "unsupported spatial reference: '{}'",
                srs
            ))),
        }
    }

    pub fn is_geographic(&self) -> bool {
        matches!(self, Projection::Geographic)
    }
}

/// Transformation between two spatial references.
#[derive(Debug, Clone, Copy)]
pub struct ProjTransform {
    source: Projection,
    dest: Projection,
}

impl ProjTransform {
    pub fn new(source: Projection, dest: Projection) -> Self {
        Self { source, dest }
    }

    /// Builds a transform from two SRS strings.
    pub fn from_srs(source: &str, dest: &str) -> MapResult<Self> {
        Ok(Self::new(Projection::parse(source)?, Projection::parse(dest)?))
    }

    pub fn is_identity(&self) -> bool {
        self.source == self.dest
    }

    pub fn forward(&self, c: Coord) -> MapResult<Coord> {
        convert(self.source, self.dest, c)
    }

    pub fn backward(&self, c: Coord) -> MapResult<Coord> {
        convert(self.dest, self.source, c)
    }

    pub fn forward_geometry(&self, geometry: &Geometry) -> MapResult<Geometry> {
        if self.is_identity() {
            return Ok(geometry.clone());
        }
        geometry.try_map_coords(|c| self.forward(c))
    }

    /// Reprojects a box by its corners and edge midpoints.
    pub fn forward_box(&self, bbox: &BBox) -> MapResult<BBox> {
        project_box(bbox, |c| self.forward(c))
    }

    pub fn backward_box(&self, bbox: &BBox) -> MapResult<BBox> {
        project_box(bbox, |c| self.backward(c))
    }
}

fn project_box(bbox: &BBox, f: impl Fn(Coord) -> MapResult<Coord>) -> MapResult<BBox> {
    if !bbox.is_valid() {
        return Ok(*bbox);
    }
    let (cx, cy) = bbox.center();
    let samples = [
        (bbox.minx, bbox.miny),
        (bbox.maxx, bbox.miny),
        (bbox.maxx, bbox.maxy),
        (bbox.minx, bbox.maxy),
        (cx, bbox.miny),
        (cx, bbox.maxy),
        (bbox.minx, cy),
        (bbox.maxx, cy),
    ];
    let mut out = BBox::empty();
    for (x, y) in samples {
        let c = f(Coord { x, y })?;
        out.expand_to_point(c.x, c.y);
    }
    Ok(out)
}

fn convert(from: Projection, to: Projection, c: Coord) -> MapResult<Coord> {
    match (from, to) {
        (Projection::Geographic, Projection::WebMercator) => lonlat_to_merc(c),
        (Projection::WebMercator, Projection::Geographic) => Ok(merc_to_lonlat(c)),
        _ => Ok(c),
    }
}

fn lonlat_to_merc(c: Coord) -> MapResult<Coord> {
    if !c.x.is_finite() || !c.y.is_finite() {
        return Err(MapError::Projection(format!(
            "cannot project non-finite coordinate ({}, {})",
            c.x, c.y
        )));
    }
    let lat = c.y.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    let x = c.x * PI / 180.0 * EARTH_RADIUS;
    let lat_rad = lat * PI / 180.0;
    let y = (PI / 4.0 + lat_rad / 2.0).tan().ln() * EARTH_RADIUS;
    Ok(Coord { x, y })
}

fn merc_to_lonlat(c: Coord) -> Coord {
    let lon = c.x / EARTH_RADIUS * 180.0 / PI;
    let lat = (2.0 * (c.y / EARTH_RADIUS).exp().atan() - PI / 2.0) * 180.0 / PI;
    Coord { x: lon, y: lat }
}
