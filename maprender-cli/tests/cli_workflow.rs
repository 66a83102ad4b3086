//! End-to-end tests for the `maprender` binary.
//!
//! Each test writes a GeoJSON file, a stylesheet and a config file into a
//! temporary directory and runs the built binary against them.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const POINTS: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "id": 1, "properties": {"id": 1, "name": "A"},
     "geometry": {"type": "Point", "coordinates": [-10.0, 0.0]}},
    {"type": "Feature", "id": 2, "properties": {"id": 2, "name": "B"},
     "geometry": {"type": "Point", "coordinates": [10.0, 0.0]}}
  ]
}"#;

const STYLESHEET: &str = r##"<Map srs="epsg:4326" background-color="#ffffff">
  <Style name="dots">
    <Rule>
      <MarkersSymbolizer fill="#ff0000" width="10"/>
    </Rule>
  </Style>
  <Layer name="points" srs="epsg:4326">
    <StyleName>dots</StyleName>
    <Datasource>
      <Parameter name="type">geojson</Parameter>
      <Parameter name="file">points.geojson</Parameter>
    </Datasource>
  </Layer>
</Map>
"##;

/// Workspace with data, stylesheet and a config that keeps logs inside it.
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(dir.path().join("points.geojson"), POINTS).unwrap();
        fs::write(dir.path().join("style.xml"), STYLESHEET).unwrap();
        let config = format!(
            "[render]\nworkers = 2\n\n[logging]\ndirectory = {}\nfile = test.log\n",
            dir.path().join("logs").display()
        );
        fs::write(dir.path().join("config.ini"), config).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn run(&self, args: &[&str]) -> Output {
        let config = self.path("config.ini");
        let stylesheet = self.path("style.xml");
        Command::new(env!("CARGO_BIN_EXE_maprender"))
            .arg("--config")
            .arg(&config)
            .args(args.iter().map(|a| a.replace("{style}", &stylesheet.display().to_string())))
            .output()
            .expect("Failed to execute CLI command")
    }
}

fn assert_success(output: &Output, context: &str) {
    if !output.status.success() {
        panic!(
            "{} failed:\nstdout: {}\nstderr: {}",
            context,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

// =============================================================================
// render
// =============================================================================

#[test]
fn test_render_extent_to_png() {
    let fixture = Fixture::new();
    let out = path_arg(&fixture.path("out.png"));

    let output = fixture.run(&["render", "{style}", "-o", &out, "--bbox", "-20,-20,20,20"]);

    assert_success(&output, "render --bbox");
    let bytes = fs::read(&out).unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn test_render_all_to_svg() {
    let fixture = Fixture::new();
    let out = path_arg(&fixture.path("out.svg"));

    let output = fixture.run(&["render", "{style}", "-o", &out]);

    assert_success(&output, "render svg");
    let svg = fs::read_to_string(&out).unwrap();
    assert!(svg.starts_with("<svg") || svg.starts_with("<?xml"));
    assert!(svg.contains("points"));
}

#[test]
fn test_render_unknown_format_fails() {
    let fixture = Fixture::new();
    let out = path_arg(&fixture.path("out.png"));

    let output = fixture.run(&["render", "{style}", "-o", &out, "--format", "gif"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown file type: gif"), "stderr: {}", stderr);
}

#[test]
fn test_render_rejects_malformed_bbox() {
    let fixture = Fixture::new();
    let out = path_arg(&fixture.path("out.png"));

    let output = fixture.run(&["render", "{style}", "-o", &out, "--bbox", "1,2,3"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(!fixture.path("out.png").exists());
}

// =============================================================================
// grid
// =============================================================================

#[test]
fn test_grid_json_output() {
    let fixture = Fixture::new();

    let output = fixture.run(&[
        "grid", "{style}", "--layer", "points", "--key", "id", "--fields", "name",
    ]);

    assert_success(&output, "grid");
    let grid: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(grid["grid"].as_array().unwrap().len(), 64);
    assert_eq!(grid["keys"], serde_json::json!(["1", "2"]));
    assert_eq!(grid["data"]["2"]["name"], "B");
}

#[test]
fn test_grid_utf_output_to_file() {
    let fixture = Fixture::new();
    let out = path_arg(&fixture.path("grid.json"));

    let output = fixture.run(&["grid", "{style}", "--layer", "0", "--utf", "-o", &out]);

    assert_success(&output, "grid --utf");
    let grid: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(grid["keys"][0], "");
    assert!(grid["grid"][0].is_string());
}

#[test]
fn test_grid_unknown_layer() {
    let fixture = Fixture::new();

    let output = fixture.run(&["grid", "{style}", "--layer", "roads"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Layer name 'roads' not found"), "stderr: {}", stderr);
}

// =============================================================================
// describe
// =============================================================================

#[test]
fn test_describe_prints_layers() {
    let fixture = Fixture::new();

    let output = fixture.run(&["describe", "{style}", "--features", "1"]);

    assert_success(&output, "describe");
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["layers"][0]["name"], "points");
    assert_eq!(report["features"]["points"].as_array().unwrap().len(), 1);
}

#[test]
fn test_describe_missing_stylesheet() {
    let fixture = Fixture::new();

    let output = fixture.run(&["describe", &path_arg(&fixture.path("missing.xml"))]);

    assert!(!output.status.success());
}
