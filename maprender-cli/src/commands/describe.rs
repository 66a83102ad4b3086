//! `maprender describe` - print a stylesheet's layers and data as JSON.

use std::path::PathBuf;

use clap::Args;
use maprender::config::ConfigFile;
use maprender::map::Map;
use serde_json::json;

use super::common;
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct DescribeArgs {
    /// XML stylesheet describing the map
    pub stylesheet: PathBuf,

    /// Also print up to this many features of each layer
    #[arg(long)]
    pub features: Option<usize>,
}

pub fn run(args: DescribeArgs, config: &ConfigFile) -> Result<(), CliError> {
    let mut map = common::load_map(&args.stylesheet, 256, 256, config)?;
    map.zoom_all()?;
    let report = describe(&map, args.features)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn describe(map: &Map, features: Option<usize>) -> Result<serde_json::Value, CliError> {
    let extent = map.extent();
    let mut report = json!({
        "srs": map.srs(),
        "extent": extent.is_valid().then(|| extent.to_array()),
        "scale_denominator": extent.has_area().then(|| map.scale_denominator()),
        "layers": map.layer_summaries(),
        "data": map.describe_data(),
    });

    if let Some(limit) = features {
        let mut samples = serde_json::Map::new();
        for (index, layer) in map.layers().iter().enumerate() {
            let sample: Vec<_> = map.features(index, 0, 0)?.into_iter().take(limit).collect();
            samples.insert(layer.name.clone(), serde_json::to_value(sample)?);
        }
        report["features"] = serde_json::Value::Object(samples);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use maprender::datasource::{Feature, MemoryDatasource};
    use maprender::geometry::Point;
    use maprender::map::Layer;

    fn sample_map() -> Map {
        let features = (1..=3)
            .map(|id| Feature::new(id, Point::new(id as f64, 0.0)).with_property("n", id))
            .collect();
        let mut map = Map::new(100, 100).unwrap();
        map.add_layer(Layer::new("pts").with_datasource(MemoryDatasource::new(features)));
        map.zoom_all().unwrap();
        map
    }

    #[test]
    fn test_describe_lists_layers() {
        let report = describe(&sample_map(), None).unwrap();
        assert_eq!(report["layers"][0]["name"], "pts");
        assert!(report["data"]["pts"].is_object());
        assert!(report.get("features").is_none());
    }

    #[test]
    fn test_describe_limits_features() {
        let report = describe(&sample_map(), Some(2)).unwrap();
        let features = report["features"]["pts"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0]["__id__"], 1);
    }
}
