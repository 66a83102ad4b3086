//! INI parsing: `Ini` → `ConfigFile`.
//!
//! The single place where INI key names are mapped to struct fields.

use std::path::PathBuf;

use ini::Ini;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::render::OutputFormat;

/// Overlays the values found in `ini` onto `ConfigFile::default()`.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [render] section
    if let Some(section) = ini.section(Some("render")) {
        if let Some(v) = section.get("workers") {
            let v = v.trim();
            config.render.workers = if v.eq_ignore_ascii_case("auto") {
                0
            } else {
                v.parse().map_err(|_| invalid(
                    "render",
                    "workers",
                    v,
                    "must be 'auto' or a non-negative integer",
                ))?
            };
        }
        if let Some(v) = section.get("format") {
            let v = v.trim().to_lowercase();
            if let Err(e) = OutputFormat::parse(&v) {
                return Err(invalid("render", "format", &v, &e.to_string()));
            }
            config.render.format = v;
        }
        if let Some(v) = section.get("buffer_size") {
            let v = v.trim();
            config.render.buffer_size = v
                .parse::<i32>()
                .ok()
                .filter(|n| *n >= 0)
                .ok_or_else(|| {
                    invalid("render", "buffer_size", v, "must be a non-negative integer (pixels)")
                })?;
        }
    }

    // [grid] section
    if let Some(section) = ini.section(Some("grid")) {
        if let Some(v) = section.get("key") {
            let v = v.trim();
            if v.is_empty() {
                return Err(invalid("grid", "key", v, "must not be empty"));
            }
            config.grid.key = v.to_string();
        }
        if let Some(v) = section.get("resolution") {
            let v = v.trim();
            config.grid.resolution = v
                .parse::<u32>()
                .ok()
                .filter(|n| *n >= 1)
                .ok_or_else(|| invalid("grid", "resolution", v, "must be a positive integer"))?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if v.is_empty() {
                return Err(invalid("logging", "file", v, "must not be empty"));
            }
            config.logging.file = v.to_string();
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn load(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(&config_path, content).unwrap();
        ConfigFile::load_from(&config_path)
    }

    #[test]
    fn test_parse_all_sections() {
        let config = load(
            r#"
[render]
workers = 3
format = JPEG80
buffer_size = 16

[grid]
key = id
resolution = 2

[logging]
directory = /var/log/maprender
file = render.log
"#,
        )
        .unwrap();

        assert_eq!(config.render.workers, 3);
        assert_eq!(config.render.format, "jpeg80");
        assert_eq!(config.render.buffer_size, 16);
        assert_eq!(config.grid.key, "id");
        assert_eq!(config.grid.resolution, 2);
        assert_eq!(config.logging.directory, PathBuf::from("/var/log/maprender"));
        assert_eq!(config.logging.file, "render.log");
    }

    #[test]
    fn test_auto_workers() {
        let config = load("[render]\nworkers = auto\n").unwrap();
        assert_eq!(config.render.workers, 0);
    }

    #[test]
    fn test_invalid_workers() {
        let err = load("[render]\nworkers = many\n").unwrap_err();
        assert!(err.to_string().contains("render.workers = 'many'"));
    }

    #[test]
    fn test_invalid_format() {
        let err = load("[render]\nformat = gif\n").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("render.format = 'gif'"));
        assert!(message.contains("unknown file type"));
    }

    #[test]
    fn test_negative_buffer_size() {
        let err = load("[render]\nbuffer_size = -4\n").unwrap_err();
        assert!(matches!(err, ConfigFileError::InvalidValue { ref key, .. } if key == "buffer_size"));
    }

    #[test]
    fn test_zero_resolution() {
        let err = load("[grid]\nresolution = 0\n").unwrap_err();
        assert!(err.to_string().contains("must be a positive integer"));
    }

    #[test]
    fn test_empty_grid_key() {
        let err = load("[grid]\nkey =\n").unwrap_err();
        assert!(err.to_string().contains("grid.key"));
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/logs"), home.join("logs"));
        }
    }
}
