//! Datasources: where layer features come from.
//!
//! Layers hold an `Arc<dyn Datasource>`. The only built-in implementation is
//! [`MemoryDatasource`], filled from code or from GeoJSON; [`create`] builds
//! one from the `type`/`file`/`inline` parameters a stylesheet carries.

mod feature;
pub mod geojson;
mod memory;
mod value;

pub use feature::{slice_features, Feature, FEATURE_ID_FIELD};
pub use memory::MemoryDatasource;
pub use value::Value;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{MapError, MapResult};
use crate::geometry::{BBox, GeometryType};

/// Datasource parameters, as written in a stylesheet.
pub type Parameters = BTreeMap<String, String>;

/// Parameter naming the datasource plugin.
pub const TYPE_PARAM: &str = "type";

/// A feature request.
#[derive(Debug, Clone)]
pub struct Query {
    /// Only features whose envelope intersects this box are returned.
    /// An invalid box disables spatial filtering.
    pub bbox: BBox,
    /// Attribute names to return; `None` returns all of them.
    pub properties: Option<BTreeSet<String>>,
}

impl Query {
    pub fn all() -> Self {
        Self {
            bbox: BBox::empty(),
            properties: None,
        }
    }

    pub fn new(bbox: BBox) -> Self {
        Self {
            bbox,
            properties: None,
        }
    }

    pub fn with_properties(mut self, names: BTreeSet<String>) -> Self {
        self.properties = Some(names);
        self
    }
}

/// Summary of a datasource's content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasourceDescription {
    #[serde(rename = "type")]
    pub kind: String,
    pub encoding: String,
    pub geometry_type: Option<GeometryType>,
    pub extent: Option<[f64; 4]>,
    /// Attribute name → type name.
    pub fields: BTreeMap<String, String>,
}

/// Source of features for a layer.
pub trait Datasource: Send + Sync + fmt::Debug {
    /// Parameters that recreate this datasource through [`create`].
    fn params(&self) -> &Parameters;

    /// Bounds of all features in the datasource's own spatial reference.
    fn envelope(&self) -> MapResult<BBox>;

    /// Features matching the query, in datasource order.
    fn features(&self, query: &Query) -> MapResult<Vec<Feature>>;

    fn describe(&self) -> DatasourceDescription;
}

/// Builds a datasource from stylesheet parameters.
///
/// Relative `file` parameters resolve against `base_path` when given.
pub fn create(params: &Parameters, base_path: Option<&Path>) -> MapResult<Arc<dyn Datasource>> {
    let kind = params
        .get(TYPE_PARAM)
        .ok_or_else(|| MapError::Datasource("missing datasource 'type' parameter".to_string()))?;

    match kind.as_str() {
        "geojson" | "memory" => Ok(Arc::new(MemoryDatasource::from_params(
            params.clone(),
            base_path,
        )?)),
        other => Err(MapError::Datasource(format!(
            "Could not create datasource for type: '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_create_requires_type() {
        let err = create(&Parameters::new(), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Datasource);
    }

    #[test]
    fn test_create_unknown_type() {
        let mut params = Parameters::new();
        params.insert("type".into(), "shape".into());
        let err = create(&params, None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not create datasource for type: 'shape'"
        );
    }

    #[test]
    fn test_create_inline_geojson() {
        let mut params = Parameters::new();
        params.insert("type".into(), "geojson".into());
        params.insert(
            "inline".into(),
            r#"{"type":"Point","coordinates":[5,6]}"#.into(),
        );
        let ds = create(&params, None).unwrap();
        assert_eq!(ds.envelope().unwrap().to_array(), [5.0, 6.0, 5.0, 6.0]);
    }
}
