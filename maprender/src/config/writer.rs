//! INI serialization: `ConfigFile` → commented config.ini text.

use std::path::Path;

use super::settings::ConfigFile;

pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let workers = if config.render.workers == 0 {
        "auto".to_string()
    } else {
        config.render.workers.to_string()
    };

    format!(
        r#"[render]
; Concurrent render workers (auto = one per CPU core)
workers = {}
; Output format when it cannot be inferred from the file name:
;   png, png32, jpeg, jpegNN (quality 1-100), tiff, bmp, svg
format = {}
; Extra pixels of data fetched around the extent, avoids clipped markers
buffer_size = {}

[grid]
; Feature field whose value identifies a feature in grids (__id__ = feature id)
key = {}
; Map pixels per grid cell
resolution = {}

[logging]
directory = {}
file = {}
"#,
        workers,
        config.render.format,
        config.render.buffer_size,
        config.grid.key,
        config.grid.resolution,
        path_to_string(&config.logging.directory),
        config.logging.file,
    )
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_saved_config_loads_back() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        let mut config = ConfigFile::default();
        config.render.workers = 5;
        config.render.format = "jpeg70".to_string();
        config.grid.key = "name".to_string();
        config.logging.directory = temp_dir.path().join("logs");
        config.save_to(&config_path).unwrap();

        assert_eq!(ConfigFile::load_from(&config_path).unwrap(), config);
    }

    #[test]
    fn test_auto_workers_written_as_auto() {
        let text = to_config_string(&ConfigFile::default());
        assert!(text.contains("workers = auto"));
        assert!(text.contains("[grid]"));
    }
}
