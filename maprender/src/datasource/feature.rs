//! Features: an id, a geometry and named attributes.

use std::collections::{BTreeMap, BTreeSet};

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::Value;
use crate::geometry::Geometry;

/// Attribute name under which the feature id is exposed.
pub const FEATURE_ID_FIELD: &str = "__id__";

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: i64,
    pub geometry: Geometry,
    pub properties: BTreeMap<String, Value>,
}

impl Feature {
    pub fn new(id: i64, geometry: impl Into<Geometry>) -> Self {
        Self {
            id,
            geometry: geometry.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Keeps only the named attributes.
    pub fn retain_properties(&mut self, names: &BTreeSet<String>) {
        self.properties.retain(|k, _| names.contains(k));
    }
}

/// Serializes as the flat attribute record `{"__id__": id, ...properties}`.
impl Serialize for Feature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.properties.len() + 1))?;
        map.serialize_entry(FEATURE_ID_FIELD, &self.id)?;
        for (k, v) in &self.properties {
            if k != FEATURE_ID_FIELD {
                map.serialize_entry(k, v)?;
            }
        }
        map.end()
    }
}

/// Selects features by position: `idx >= first && (idx <= last || last == 0)`.
pub fn slice_features(features: Vec<Feature>, first: usize, last: usize) -> Vec<Feature> {
    features
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| *idx >= first && (*idx <= last || last == 0))
        .map(|(_, f)| f)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn numbered(n: i64) -> Vec<Feature> {
        (1..=n)
            .map(|i| Feature::new(i, Point::new(0.0, 0.0)))
            .collect()
    }

    #[test]
    fn test_serialize_as_record() {
        let f = Feature::new(7, Point::new(0.0, 0.0)).with_property("name", "A");
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json, serde_json::json!({"__id__": 7, "name": "A"}));
    }

    #[test]
    fn test_slice_all_when_last_zero() {
        assert_eq!(slice_features(numbered(5), 0, 0).len(), 5);
    }

    #[test]
    fn test_slice_inclusive_range() {
        let ids: Vec<i64> = slice_features(numbered(5), 1, 3)
            .iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[test]
    fn test_slice_first_beyond_end() {
        assert!(slice_features(numbered(3), 10, 0).is_empty());
    }
}
