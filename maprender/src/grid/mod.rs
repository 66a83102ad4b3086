//! Feature-id grids for interactivity.
//!
//! A [`Grid`] is a coarse raster (one cell per `resolution × resolution`
//! map pixels) whose cells record which feature was drawn there last.
//! Features are joined by a key: the feature id when the key is `__id__`,
//! otherwise the string form of the named attribute. [`Grid::encode`] turns
//! the cells into the compact `grid`/`keys`/`data` form and
//! [`Grid::encode_utf`] into the UTFGrid wire form.

mod encode;

pub use encode::{codepoint, GridEncoding, GridRecord, UtfGrid, EMPTY_CODE};

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::datasource::{Feature, Value, FEATURE_ID_FIELD};
use crate::error::{MapError, MapResult};

pub const DEFAULT_GRID_KEY: &str = FEATURE_ID_FIELD;
pub const DEFAULT_GRID_RESOLUTION: u32 = 4;

/// Grid rendering options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridOptions {
    /// Join field; `__id__` joins on the feature id.
    pub key: String,
    /// Map pixels per grid cell along each axis.
    pub resolution: u32,
    /// Attributes to emit in `data`.
    pub fields: BTreeSet<String>,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            key: DEFAULT_GRID_KEY.to_string(),
            resolution: DEFAULT_GRID_RESOLUTION,
            fields: BTreeSet::new(),
        }
    }
}

impl GridOptions {
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(&self) -> MapResult<()> {
        if self.resolution == 0 {
            return Err(MapError::Validation(
                "grid resolution must be a positive integer".to_string(),
            ));
        }
        if self.key.is_empty() {
            return Err(MapError::Validation(
                "grid key must be a non-empty string".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct GridFeature {
    key: String,
    properties: BTreeMap<String, Value>,
}

/// Cell raster plus the features painted into it, in insertion order.
#[derive(Debug, Clone)]
pub struct Grid {
    width: u32,
    height: u32,
    key: String,
    resolution: u32,
    property_names: BTreeSet<String>,
    /// Row-major; 0 = empty, otherwise `features[slot - 1]`.
    cells: Vec<u32>,
    features: Vec<GridFeature>,
    slots: HashMap<String, u32>,
}

impl Grid {
    /// Sizes a grid for a map of `map_width × map_height` pixels.
    pub fn new(map_width: u32, map_height: u32, options: &GridOptions) -> MapResult<Self> {
        options.validate()?;
        let width = map_width / options.resolution;
        let height = map_height / options.resolution;
        Ok(Self {
            width,
            height,
            key: options.key.clone(),
            resolution: options.resolution,
            property_names: options.fields.clone(),
            cells: vec![EMPTY_CODE; width as usize * height as usize],
            features: Vec::new(),
            slots: HashMap::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn property_names(&self) -> &BTreeSet<String> {
        &self.property_names
    }

    /// Attributes a datasource must return for this grid: the requested
    /// fields plus the join field, which is dropped when it is the feature id.
    pub fn query_attributes(&self) -> BTreeSet<String> {
        let mut names = self.property_names.clone();
        if self.key == FEATURE_ID_FIELD {
            names.remove(&self.key);
        } else {
            names.insert(self.key.clone());
        }
        names
    }

    /// The join value of a feature; `None` when it has none.
    pub fn feature_key(&self, feature: &Feature) -> Option<String> {
        if self.key == FEATURE_ID_FIELD {
            return Some(feature.id.to_string());
        }
        feature
            .get(&self.key)
            .filter(|v| !v.is_null())
            .map(Value::to_string)
    }

    /// Registers a feature and returns its slot.
    ///
    /// Features sharing a key share a slot; the first one's attributes are kept.
    pub fn add_feature(&mut self, feature: &Feature) -> Option<u32> {
        let key = self.feature_key(feature)?;
        if let Some(slot) = self.slots.get(&key) {
            return Some(*slot);
        }
        let properties = self
            .property_names
            .iter()
            .filter_map(|name| {
                let value = if name == FEATURE_ID_FIELD {
                    Some(Value::Integer(feature.id))
                } else {
                    feature.get(name).cloned()
                };
                value.map(|v| (name.clone(), v))
            })
            .collect();
        self.features.push(GridFeature {
            key: key.clone(),
            properties,
        });
        let slot = self.features.len() as u32;
        self.slots.insert(key, slot);
        Some(slot)
    }

    /// Writes `slot` into every cell whose coverage byte is non-zero.
    pub fn paint(&mut self, slot: u32, coverage: &[u8]) {
        for (cell, covered) in self.cells.iter_mut().zip(coverage) {
            if *covered > 0 {
                *cell = slot;
            }
        }
    }

    /// Slot at a cell; 0 when empty or out of bounds.
    pub fn cell(&self, x: u32, y: u32) -> u32 {
        if x >= self.width || y >= self.height {
            return EMPTY_CODE;
        }
        self.cells[cell_index(self.width, x, y)]
    }

    /// Key of the feature drawn at a cell.
    pub fn key_at(&self, x: u32, y: u32) -> Option<&str> {
        match self.cell(x, y) {
            EMPTY_CODE => None,
            slot => self.features.get(slot as usize - 1).map(|f| f.key.as_str()),
        }
    }

    /// Number of distinct features registered.
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub fn clear(&mut self) {
        self.cells.fill(EMPTY_CODE);
        self.features.clear();
        self.slots.clear();
    }
}

/// Row-major offset of a cell, computed in `usize` so large grids cannot wrap.
fn cell_index(width: u32, x: u32, y: u32) -> usize {
    y as usize * width as usize + x as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::geometry::Point;

    fn feature(id: i64, name: &str) -> Feature {
        Feature::new(id, Point::new(0.0, 0.0))
            .with_property("id", id)
            .with_property("name", name)
    }

    #[test]
    fn test_default_options() {
        let options = GridOptions::default();
        assert_eq!(options.key, "__id__");
        assert_eq!(options.resolution, 4);
        assert!(options.fields.is_empty());
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: GridOptions =
            serde_json::from_str(r#"{"key": "id", "fields": ["name"]}"#).unwrap();
        assert_eq!(options.resolution, DEFAULT_GRID_RESOLUTION);
        assert_eq!(options.key, "id");
        assert!(options.fields.contains("name"));
    }

    #[test]
    fn test_validation() {
        let zero = GridOptions::default().with_resolution(0);
        assert_eq!(Grid::new(256, 256, &zero).unwrap_err().kind(), ErrorKind::Validation);
        let empty_key = GridOptions::default().with_key("");
        assert_eq!(empty_key.validate().unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_dimensions_floor() {
        let grid = Grid::new(256, 250, &GridOptions::default()).unwrap();
        assert_eq!((grid.width(), grid.height()), (64, 62));
        let tiny = Grid::new(3, 3, &GridOptions::default()).unwrap();
        assert_eq!((tiny.width(), tiny.height()), (0, 0));
    }

    #[test]
    fn test_query_attributes_drops_id_key() {
        let options = GridOptions::default().with_fields(["__id__", "name"]);
        let grid = Grid::new(8, 8, &options).unwrap();
        let expected: BTreeSet<String> = ["name".to_string()].into_iter().collect();
        assert_eq!(grid.query_attributes(), expected);
    }

    #[test]
    fn test_query_attributes_adds_join_field() {
        let options = GridOptions::default().with_key("id").with_fields(["name"]);
        let grid = Grid::new(8, 8, &options).unwrap();
        let attrs = grid.query_attributes();
        assert!(attrs.contains("id"));
        assert!(attrs.contains("name"));
    }

    #[test]
    fn test_feature_key_by_id_and_attribute() {
        let by_id = Grid::new(8, 8, &GridOptions::default()).unwrap();
        assert_eq!(by_id.feature_key(&feature(7, "x")).as_deref(), Some("7"));

        let by_name = Grid::new(8, 8, &GridOptions::default().with_key("name")).unwrap();
        assert_eq!(by_name.feature_key(&feature(7, "x")).as_deref(), Some("x"));

        let by_missing = Grid::new(8, 8, &GridOptions::default().with_key("nope")).unwrap();
        assert_eq!(by_missing.feature_key(&feature(7, "x")), None);
    }

    #[test]
    fn test_same_key_shares_slot() {
        let mut grid = Grid::new(8, 8, &GridOptions::default().with_key("name")).unwrap();
        assert_eq!(grid.add_feature(&feature(1, "a")), Some(1));
        assert_eq!(grid.add_feature(&feature(2, "b")), Some(2));
        assert_eq!(grid.add_feature(&feature(3, "a")), Some(1));
        assert_eq!(grid.feature_count(), 2);
    }

    #[test]
    fn test_paint_and_lookup() {
        let mut grid = Grid::new(8, 8, &GridOptions::default()).unwrap();
        let slot = grid.add_feature(&feature(5, "e")).unwrap();
        grid.paint(slot, &[0, 255, 0, 0]);
        assert_eq!(grid.cell(1, 0), slot);
        assert_eq!(grid.cell(0, 0), EMPTY_CODE);
        assert_eq!(grid.key_at(1, 0), Some("5"));
        assert_eq!(grid.cell(9, 9), EMPTY_CODE);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_cell_index_beyond_u32() {
        assert_eq!(cell_index(70_000, 5, 70_000), 4_900_000_005);
        assert_eq!(cell_index(16, 3, 2), 35);
    }
}
