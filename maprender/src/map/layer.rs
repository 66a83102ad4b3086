//! Layers and layer selection.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use crate::datasource::{Datasource, Parameters};
use crate::error::{MapError, MapResult};
use crate::geometry::BBox;
use crate::projection::{ProjTransform, DEFAULT_SRS};

/// A named, styled view of one datasource.
#[derive(Clone)]
pub struct Layer {
    pub name: String,
    pub srs: String,
    /// Names of the styles applied, in draw order.
    pub styles: Vec<String>,
    pub datasource: Option<Arc<dyn Datasource>>,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            srs: DEFAULT_SRS.to_string(),
            styles: Vec::new(),
            datasource: None,
        }
    }

    pub fn with_srs(mut self, srs: impl Into<String>) -> Self {
        self.srs = srs.into();
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.styles.push(style.into());
        self
    }

    pub fn with_datasource(mut self, datasource: impl Datasource + 'static) -> Self {
        self.datasource = Some(Arc::new(datasource));
        self
    }

    pub fn set_datasource(&mut self, datasource: Arc<dyn Datasource>) {
        self.datasource = Some(datasource);
    }

    /// Envelope reprojected into `map_srs`; `None` without data.
    pub fn envelope_in(&self, map_srs: &str) -> MapResult<Option<BBox>> {
        let Some(datasource) = &self.datasource else {
            return Ok(None);
        };
        let envelope = datasource.envelope()?;
        if !envelope.is_valid() {
            return Ok(None);
        }
        let transform = ProjTransform::from_srs(&self.srs, map_srs)?;
        Ok(Some(transform.forward_box(&envelope)?))
    }

    pub fn summary(&self) -> LayerSummary {
        LayerSummary {
            name: self.name.clone(),
            srs: self.srs.clone(),
            styles: self.styles.clone(),
            datasource: self
                .datasource
                .as_ref()
                .map(|ds| ds.params().clone())
                .unwrap_or_default(),
        }
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("name", &self.name)
            .field("srs", &self.srs)
            .field("styles", &self.styles)
            .field("has_datasource", &self.datasource.is_some())
            .finish()
    }
}

/// Serializable description of a layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSummary {
    pub name: String,
    pub srs: String,
    pub styles: Vec<String>,
    pub datasource: Parameters,
}

/// Identifies a layer by zero-based position or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerSelector {
    Index(usize),
    Name(String),
}

impl From<usize> for LayerSelector {
    fn from(index: usize) -> Self {
        LayerSelector::Index(index)
    }
}

impl From<&str> for LayerSelector {
    fn from(name: &str) -> Self {
        LayerSelector::Name(name.to_string())
    }
}

impl From<String> for LayerSelector {
    fn from(name: String) -> Self {
        LayerSelector::Name(name)
    }
}

/// All-digit strings select by index, anything else by name.
impl FromStr for LayerSelector {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(MapError::Validation("layer selector must not be empty".into()));
        }
        if s.bytes().all(|b| b.is_ascii_digit()) {
            let index = s
                .parse()
                .map_err(|_| MapError::Validation(format!("layer index '{}' is too large", s)))?;
            return Ok(LayerSelector::Index(index));
        }
        Ok(LayerSelector::Name(s.to_string()))
    }
}

/// Selectors arriving as loosely typed JSON (request bodies, options bags).
impl TryFrom<&serde_json::Value> for LayerSelector {
    type Error = MapError;

    fn try_from(value: &serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::String(name) => Ok(LayerSelector::Name(name.clone())),
            serde_json::Value::Number(n) => n
                .as_u64()
                .and_then(|i| usize::try_from(i).ok())
                .map(LayerSelector::Index)
                .ok_or_else(invalid_selector),
            _ => Err(invalid_selector()),
        }
    }
}

fn invalid_selector() -> MapError {
    MapError::Validation(
        "InvalidArgument: layer must be either a layer name (string) or a layer index (integer)"
            .to_string(),
    )
}

impl fmt::Display for LayerSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerSelector::Index(i) => write!(f, "#{}", i),
            LayerSelector::Name(n) => f.write_str(n),
        }
    }
}

/// Resolves a selector against an ordered layer list.
///
/// Names match exactly and the first match wins.
pub fn resolve<'a>(layers: &'a [Layer], selector: &LayerSelector) -> MapResult<(usize, &'a Layer)> {
    match selector {
        LayerSelector::Index(index) => layers
            .get(*index)
            .map(|layer| (*index, layer))
            .ok_or(MapError::LayerIndexOutOfRange {
                index: *index,
                count: layers.len(),
            }),
        LayerSelector::Name(name) => layers
            .iter()
            .enumerate()
            .find(|(_, layer)| &layer.name == name)
            .ok_or_else(|| MapError::LayerNotFound(name.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn layers() -> Vec<Layer> {
        vec![Layer::new("a"), Layer::new("b"), Layer::new("a")]
    }

    #[test]
    fn test_resolve_by_index() {
        let layers = layers();
        let (idx, layer) = resolve(&layers, &LayerSelector::Index(1)).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(layer.name, "b");
    }

    #[test]
    fn test_resolve_index_out_of_range() {
        let err = resolve(&layers(), &LayerSelector::Index(3)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(
            err.to_string(),
            "Zero-based layer index '3' not valid, only '3' layers are in map"
        );
    }

    #[test]
    fn test_resolve_first_name_match_wins() {
        let (idx, _) = resolve(&layers(), &"a".into()).unwrap();
        assert_eq!(idx, 0);
    }

    #[test]
    fn test_resolve_unknown_name() {
        let err = resolve(&layers(), &"missing".into()).unwrap_err();
        assert_eq!(err, MapError::LayerNotFound("missing".into()));
    }

    #[test]
    fn test_resolve_name_is_case_sensitive() {
        assert!(resolve(&layers(), &"A".into()).is_err());
    }

    #[test]
    fn test_selector_from_json() {
        assert_eq!(
            LayerSelector::try_from(&json!(2)).unwrap(),
            LayerSelector::Index(2)
        );
        assert_eq!(
            LayerSelector::try_from(&json!("roads")).unwrap(),
            LayerSelector::Name("roads".into())
        );
        for bad in [json!(true), json!(1.5), json!(-1), json!(null), json!([0])] {
            let err = LayerSelector::try_from(&bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
    }

    #[test]
    fn test_selector_from_str() {
        assert_eq!("0".parse::<LayerSelector>().unwrap(), LayerSelector::Index(0));
        assert_eq!(
            "roads2".parse::<LayerSelector>().unwrap(),
            LayerSelector::Name("roads2".into())
        );
        assert!("".parse::<LayerSelector>().is_err());
    }
}
