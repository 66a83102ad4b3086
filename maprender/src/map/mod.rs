//! The map resource: dimensions, spatial reference, current extent, ordered
//! layers and named styles.
//!
//! A [`Map`] is plain mutable state. Sharing it with render jobs goes through
//! [`SharedMap`], which adds the lock and the usage counter.

mod layer;
mod shared;
pub mod stylesheet;

pub use layer::{resolve, Layer, LayerSelector, LayerSummary};
pub use shared::{SharedMap, UsageGuard};

use std::collections::BTreeMap;
use std::f64::consts::PI;

use tracing::debug;

use crate::datasource::{slice_features, DatasourceDescription, Feature, Query};
use crate::error::{MapError, MapResult};
use crate::geometry::BBox;
use crate::projection::{Projection, DEFAULT_SRS, EARTH_RADIUS};
use crate::style::{Color, Style};

/// Physical size of a rendered pixel in metres (0.28 mm).
pub const STANDARD_PIXEL_SIZE: f64 = 0.00028;

/// Metres per degree at the equator.
const METERS_PER_DEGREE: f64 = EARTH_RADIUS * 2.0 * PI / 360.0;

#[derive(Debug, Clone)]
pub struct Map {
    width: u32,
    height: u32,
    srs: String,
    buffer_size: i32,
    background: Option<Color>,
    current_extent: BBox,
    layers: Vec<Layer>,
    styles: BTreeMap<String, Style>,
}

impl Map {
    /// Creates an empty map in the default geographic reference.
    pub fn new(width: u32, height: u32) -> MapResult<Self> {
        Self::with_srs(width, height, DEFAULT_SRS)
    }

    pub fn with_srs(width: u32, height: u32, srs: impl Into<String>) -> MapResult<Self> {
        validate_size(width, height)?;
        Ok(Self {
            width,
            height,
            srs: srs.into(),
            buffer_size: 0,
            background: None,
            current_extent: BBox::empty(),
            layers: Vec::new(),
            styles: BTreeMap::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn resize(&mut self, width: u32, height: u32) -> MapResult<()> {
        validate_size(width, height)?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    pub fn srs(&self) -> &str {
        &self.srs
    }

    pub fn set_srs(&mut self, srs: impl Into<String>) {
        self.srs = srs.into();
    }

    pub fn buffer_size(&self) -> i32 {
        self.buffer_size
    }

    /// Extra pixels around the extent from which features are queried.
    pub fn set_buffer_size(&mut self, buffer_size: i32) {
        self.buffer_size = buffer_size;
    }

    pub fn background(&self) -> Option<Color> {
        self.background
    }

    pub fn set_background(&mut self, color: Option<Color>) {
        self.background = color;
    }

    /// The current extent; `BBox::empty()` until zoomed.
    pub fn extent(&self) -> BBox {
        self.current_extent
    }

    /// Sets the extent, growing it to the map's aspect ratio.
    pub fn zoom_to_box(&mut self, bbox: BBox) {
        let mut extent = bbox;
        extent.grow_to_aspect(self.width, self.height);
        self.current_extent = extent;
    }

    /// Zooms to the union of all layer envelopes.
    ///
    /// Leaves the extent unchanged when no layer has data.
    pub fn zoom_all(&mut self) -> MapResult<()> {
        if let Some(bbox) = self.layers_envelope()? {
            self.zoom_to_box(bbox);
        }
        Ok(())
    }

    fn layers_envelope(&self) -> MapResult<Option<BBox>> {
        let mut union: Option<BBox> = None;
        for layer in &self.layers {
            if let Some(env) = layer.envelope_in(&self.srs)? {
                union.get_or_insert(env).expand_to_include(&env);
            }
        }
        Ok(union)
    }

    /// The extent renders use: the current extent when it has an area,
    /// otherwise the aspect-corrected union of the layer envelopes.
    pub fn render_extent(&self) -> MapResult<BBox> {
        if self.current_extent.has_area() {
            return Ok(self.current_extent);
        }
        if let Some(mut env) = self.layers_envelope()? {
            env.grow_to_aspect(self.width, self.height);
            if env.has_area() {
                debug!(extent = %env, "No extent set, rendering full layer envelope");
                return Ok(env);
            }
        }
        Err(MapError::Runtime(
            "map extent is not valid, call zoom_all or zoom_to_box before rendering".to_string(),
        ))
    }

    /// Map units per pixel.
    pub fn scale(&self) -> f64 {
        self.current_extent.width() / self.width as f64
    }

    pub fn scale_denominator(&self) -> f64 {
        let geographic = Projection::parse(&self.srs)
            .map(|p| p.is_geographic())
            .unwrap_or(false);
        let mut denominator = self.scale() / STANDARD_PIXEL_SIZE;
        if geographic {
            denominator *= METERS_PER_DEGREE;
        }
        denominator
    }

    pub fn add_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, selector: &LayerSelector) -> MapResult<&Layer> {
        resolve(&self.layers, selector).map(|(_, layer)| layer)
    }

    pub fn layer_mut(&mut self, selector: &LayerSelector) -> MapResult<&mut Layer> {
        let (index, _) = resolve(&self.layers, selector)?;
        Ok(&mut self.layers[index])
    }

    pub fn remove_layer(&mut self, selector: &LayerSelector) -> MapResult<Layer> {
        let (index, _) = resolve(&self.layers, selector)?;
        Ok(self.layers.remove(index))
    }

    /// Removes every layer and style.
    pub fn clear(&mut self) {
        self.layers.clear();
        self.styles.clear();
    }

    /// Adds or replaces a named style; returns the replaced one.
    pub fn insert_style(&mut self, name: impl Into<String>, style: Style) -> Option<Style> {
        self.styles.insert(name.into(), style)
    }

    pub fn style(&self, name: &str) -> Option<&Style> {
        self.styles.get(name)
    }

    pub fn styles(&self) -> &BTreeMap<String, Style> {
        &self.styles
    }

    pub fn layer_summaries(&self) -> Vec<LayerSummary> {
        self.layers.iter().map(Layer::summary).collect()
    }

    /// Datasource description per layer name, for layers with data.
    pub fn describe_data(&self) -> BTreeMap<String, DatasourceDescription> {
        self.layers
            .iter()
            .filter_map(|layer| {
                layer
                    .datasource
                    .as_ref()
                    .map(|ds| (layer.name.clone(), ds.describe()))
            })
            .collect()
    }

    /// Features of the layer at `index`, sliced by position.
    ///
    /// An index past the end yields an empty list, as does `last == 0` with
    /// `first` past the end.
    pub fn features(&self, index: usize, first: usize, last: usize) -> MapResult<Vec<Feature>> {
        let Some(datasource) = self.layers.get(index).and_then(|l| l.datasource.as_ref()) else {
            return Ok(Vec::new());
        };
        let features = datasource.features(&Query::all())?;
        Ok(slice_features(features, first, last))
    }
}

fn validate_size(width: u32, height: u32) -> MapResult<()> {
    if width == 0 || height == 0 {
        return Err(MapError::Validation(format!(
            "map dimensions must be positive, got {}x{}",
            width, height
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::MemoryDatasource;
    use crate::error::ErrorKind;
    use crate::geometry::Point;
    use crate::projection::MERCATOR_SRS;

    fn points_layer(name: &str, coords: &[(f64, f64)]) -> Layer {
        let features = coords
            .iter()
            .enumerate()
            .map(|(i, (x, y))| Feature::new(i as i64 + 1, Point::new(*x, *y)))
            .collect();
        Layer::new(name).with_datasource(MemoryDatasource::new(features))
    }

    #[test]
    fn test_new_rejects_zero_size() {
        assert_eq!(Map::new(0, 10).unwrap_err().kind(), ErrorKind::Validation);
        assert!(Map::new(10, 0).is_err());
    }

    #[test]
    fn test_resize_validates() {
        let mut map = Map::new(10, 10).unwrap();
        assert!(map.resize(0, 5).is_err());
        map.resize(20, 30).unwrap();
        assert_eq!((map.width(), map.height()), (20, 30));
    }

    #[test]
    fn test_zoom_to_box_fixes_aspect() {
        let mut map = Map::new(256, 256).unwrap();
        map.zoom_to_box(BBox::new(0.0, 0.0, 20.0, 10.0));
        assert_eq!(map.extent().to_array(), [0.0, -5.0, 20.0, 15.0]);
    }

    #[test]
    fn test_zoom_all_unions_layers() {
        let mut map = Map::new(100, 100).unwrap();
        map.add_layer(points_layer("a", &[(0.0, 0.0), (5.0, 5.0)]));
        map.add_layer(points_layer("b", &[(10.0, 10.0)]));
        map.zoom_all().unwrap();
        assert_eq!(map.extent().to_array(), [0.0, 0.0, 10.0, 10.0]);
    }

    #[test]
    fn test_zoom_all_reprojects_layers() {
        let mut map = Map::with_srs(100, 100, MERCATOR_SRS).unwrap();
        map.add_layer(points_layer("a", &[(-1.0, -1.0), (1.0, 1.0)]));
        map.zoom_all().unwrap();
        let extent = map.extent();
        assert!((extent.maxy - 111325.14).abs() < 1.0);
        assert!(extent.maxx > 111319.0);
    }

    #[test]
    fn test_zoom_all_without_data_keeps_extent() {
        let mut map = Map::new(100, 100).unwrap();
        map.add_layer(Layer::new("empty"));
        map.zoom_all().unwrap();
        assert!(!map.extent().is_valid());
    }

    #[test]
    fn test_render_extent_falls_back_to_layers() {
        let mut map = Map::new(100, 50).unwrap();
        map.add_layer(points_layer("a", &[(0.0, 0.0), (10.0, 10.0)]));
        assert_eq!(map.render_extent().unwrap().to_array(), [-5.0, 0.0, 15.0, 10.0]);
    }

    #[test]
    fn test_render_extent_without_anything_fails() {
        let map = Map::new(100, 50).unwrap();
        assert_eq!(map.render_extent().unwrap_err().kind(), ErrorKind::Runtime);
    }

    #[test]
    fn test_scale_denominator_geographic() {
        let mut map = Map::new(256, 256).unwrap();
        map.zoom_to_box(BBox::new(-180.0, -180.0, 180.0, 180.0));
        let expected = 360.0 / 256.0 / STANDARD_PIXEL_SIZE * METERS_PER_DEGREE;
        assert!((map.scale_denominator() - expected).abs() < 1e-3);
    }

    #[test]
    fn test_scale_denominator_projected() {
        let mut map = Map::with_srs(100, 100, MERCATOR_SRS).unwrap();
        map.zoom_to_box(BBox::new(0.0, 0.0, 2.8, 2.8));
        assert!((map.scale_denominator() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_clear_removes_layers_and_styles() {
        let mut map = Map::new(10, 10).unwrap();
        map.add_layer(Layer::new("a"));
        map.insert_style("s", Style::default());
        map.clear();
        assert!(map.layers().is_empty());
        assert!(map.styles().is_empty());
    }

    #[test]
    fn test_features_slicing_and_bad_index() {
        let mut map = Map::new(10, 10).unwrap();
        map.add_layer(points_layer("a", &[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]));
        assert_eq!(map.features(0, 0, 0).unwrap().len(), 3);
        assert_eq!(map.features(0, 1, 1).unwrap().len(), 1);
        assert!(map.features(5, 0, 0).unwrap().is_empty());
    }

    #[test]
    fn test_describe_data_keyed_by_layer() {
        let mut map = Map::new(10, 10).unwrap();
        map.add_layer(points_layer("pois", &[(0.0, 0.0)]));
        map.add_layer(Layer::new("nodata"));
        let described = map.describe_data();
        assert_eq!(described.len(), 1);
        assert!(described.contains_key("pois"));
    }

    #[test]
    fn test_remove_layer_by_name() {
        let mut map = Map::new(10, 10).unwrap();
        map.add_layer(Layer::new("a"));
        map.add_layer(Layer::new("b"));
        let removed = map.remove_layer(&"a".into()).unwrap();
        assert_eq!(removed.name, "a");
        assert_eq!(map.layers().len(), 1);
    }
}
