//! In-memory feature store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{geojson, Datasource, DatasourceDescription, Feature, Parameters, Query, TYPE_PARAM};
use crate::error::{MapError, MapResult};
use crate::geometry::{BBox, GeometryExt, GeometryType};

/// Features held in memory, optionally loaded from GeoJSON.
#[derive(Debug, Clone)]
pub struct MemoryDatasource {
    features: Vec<Feature>,
    params: Parameters,
}

impl MemoryDatasource {
    /// Wraps features built in code.
    ///
    /// The parameters carry the features as inline GeoJSON so the layer can
    /// be written to a stylesheet and read back.
    pub fn new(features: Vec<Feature>) -> Self {
        let mut params = Parameters::new();
        params.insert(TYPE_PARAM.to_string(), "geojson".to_string());
        params.insert("inline".to_string(), geojson::to_string(&features));
        Self { features, params }
    }

    pub fn from_geojson_str(text: &str) -> MapResult<Self> {
        let mut params = Parameters::new();
        params.insert(TYPE_PARAM.to_string(), "geojson".to_string());
        params.insert("inline".to_string(), text.to_string());
        Ok(Self {
            features: geojson::parse(text)?,
            params,
        })
    }

    pub fn from_geojson_file(path: &Path) -> MapResult<Self> {
        let mut params = Parameters::new();
        params.insert(TYPE_PARAM.to_string(), "geojson".to_string());
        params.insert("file".to_string(), path.display().to_string());
        Self::from_params(params, None)
    }

    /// Loads from `file` (resolved against `base_path`) or `inline`.
    pub fn from_params(params: Parameters, base_path: Option<&Path>) -> MapResult<Self> {
        let features = if let Some(file) = params.get("file") {
            let path = resolve_path(file, base_path);
            debug!(path = %path.display(), "Loading GeoJSON datasource");
            let text = std::fs::read_to_string(&path).map_err(|e| {
                MapError::Datasource(format!(
                    "failed to read GeoJSON file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            geojson::parse(&text)?
        } else if let Some(inline) = params.get("inline") {
            geojson::parse(inline)?
        } else {
            return Err(MapError::Datasource(
                "geojson datasource requires a 'file' or 'inline' parameter".to_string(),
            ));
        };
        Ok(Self { features, params })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

fn resolve_path(file: &str, base_path: Option<&Path>) -> PathBuf {
    let path = PathBuf::from(file);
    match base_path {
        Some(base) if path.is_relative() => base.join(path),
        _ => path,
    }
}

impl Datasource for MemoryDatasource {
    fn params(&self) -> &Parameters {
        &self.params
    }

    fn envelope(&self) -> MapResult<BBox> {
        let mut bbox = BBox::empty();
        for feature in &self.features {
            let env = feature.geometry.envelope();
            if env.is_valid() {
                bbox.expand_to_include(&env);
            }
        }
        Ok(bbox)
    }

    fn features(&self, query: &Query) -> MapResult<Vec<Feature>> {
        let filter_spatially = query.bbox.is_valid();
        Ok(self
            .features
            .iter()
            .filter(|f| !filter_spatially || f.geometry.envelope().intersects(&query.bbox))
            .map(|f| {
                let mut f = f.clone();
                if let Some(names) = &query.properties {
                    f.retain_properties(names);
                }
                f
            })
            .collect())
    }

    fn describe(&self) -> DatasourceDescription {
        let mut fields = BTreeMap::new();
        for feature in &self.features {
            for (name, value) in &feature.properties {
                if !value.is_null() {
                    fields
                        .entry(name.clone())
                        .or_insert_with(|| value.type_name().to_string());
                }
            }
        }

        let mut kinds = self.features.iter().map(|f| f.geometry.geometry_type());
        let geometry_type = kinds.next().map(|first| {
            if kinds.all(|k| k == first) {
                first
            } else {
                GeometryType::Collection
            }
        });

        let extent = self
            .envelope()
            .ok()
            .filter(BBox::is_valid)
            .map(|b| b.to_array());

        DatasourceDescription {
            kind: "vector".to_string(),
            encoding: "utf-8".to_string(),
            geometry_type,
            extent,
            fields,
        }
    }
}
