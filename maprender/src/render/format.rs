//! Output format names and inference from file extensions.

use std::fmt;
use std::path::Path;

use crate::error::{MapError, MapResult};

/// Quality used for `jpeg` without an explicit suffix.
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// An encodable output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg { quality: u8 },
    Tiff,
    Bmp,
    Svg,
    Pdf,
    Ps,
}

/// Which pipeline produces a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Rasterized into pixels, then encoded.
    Raster,
    /// Written directly from geometry by a document writer backend.
    Document,
}

impl OutputFormat {
    /// Parses a format name such as `png`, `png32`, `jpeg80` or `svg`.
    ///
    /// An empty name is a validation error; an unrecognised one a codec error.
    pub fn parse(name: &str) -> MapResult<Self> {
        let normalized = name.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(MapError::Validation(
                "format must be a non-empty string".to_string(),
            ));
        }
        let unknown = || MapError::Codec(format!("unknown file type: {}", name));

        match normalized.as_str() {
            "png" | "png32" | "png24" | "png8" | "png256" => return Ok(OutputFormat::Png),
            "tif" | "tiff" => return Ok(OutputFormat::Tiff),
            "bmp" => return Ok(OutputFormat::Bmp),
            "svg" => return Ok(OutputFormat::Svg),
            "pdf" => return Ok(OutputFormat::Pdf),
            "ps" => return Ok(OutputFormat::Ps),
            _ => {}
        }

        let suffix = normalized
            .strip_prefix("jpeg")
            .or_else(|| normalized.strip_prefix("jpg"))
            .ok_or_else(unknown)?;
        if suffix.is_empty() {
            return Ok(OutputFormat::Jpeg {
                quality: DEFAULT_JPEG_QUALITY,
            });
        }
        match suffix.parse::<u8>() {
            Ok(quality) if (1..=100).contains(&quality) => Ok(OutputFormat::Jpeg { quality }),
            _ => Err(unknown()),
        }
    }

    pub fn capability(&self) -> Capability {
        match self {
            OutputFormat::Svg | OutputFormat::Pdf | OutputFormat::Ps => Capability::Document,
            _ => Capability::Raster,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg { .. } => "jpg",
            OutputFormat::Tiff => "tif",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Svg => "svg",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Ps => "ps",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Jpeg { quality } => write!(f, "jpeg{}", quality),
            OutputFormat::Tiff => f.write_str("tiff"),
            other => f.write_str(other.extension()),
        }
    }
}

/// Infers the output format from a file extension.
pub fn guess_format(path: &Path) -> MapResult<OutputFormat> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "png" => Ok(OutputFormat::Png),
        "jpg" | "jpeg" => Ok(OutputFormat::Jpeg {
            quality: DEFAULT_JPEG_QUALITY,
        }),
        "tif" | "tiff" => Ok(OutputFormat::Tiff),
        "bmp" => Ok(OutputFormat::Bmp),
        "svg" => Ok(OutputFormat::Svg),
        "pdf" => Ok(OutputFormat::Pdf),
        "ps" => Ok(OutputFormat::Ps),
        _ => Err(MapError::UnknownFormat(path.display().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_png_variants() {
        for name in ["png", "PNG", "png32", "png256"] {
            assert_eq!(OutputFormat::parse(name).unwrap(), OutputFormat::Png);
        }
    }

    #[test]
    fn test_parse_jpeg_quality() {
        assert_eq!(
            OutputFormat::parse("jpeg").unwrap(),
            OutputFormat::Jpeg {
                quality: DEFAULT_JPEG_QUALITY
            }
        );
        assert_eq!(
            OutputFormat::parse("jpeg70").unwrap(),
            OutputFormat::Jpeg { quality: 70 }
        );
        assert_eq!(OutputFormat::parse("jpeg0").unwrap_err().kind(), ErrorKind::Codec);
    }

    #[test]
    fn test_parse_empty_is_validation() {
        assert_eq!(OutputFormat::parse("  ").unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_parse_unknown_is_codec() {
        let err = OutputFormat::parse("gif").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Codec);
        assert_eq!(err.to_string(), "unknown file type: gif");
    }

    #[test]
    fn test_capability() {
        assert_eq!(OutputFormat::Png.capability(), Capability::Raster);
        assert_eq!(OutputFormat::Svg.capability(), Capability::Document);
        assert_eq!(OutputFormat::Pdf.capability(), Capability::Document);
    }

    #[test]
    fn test_guess_format() {
        assert_eq!(guess_format(Path::new("a/b.PNG")).unwrap(), OutputFormat::Png);
        assert_eq!(
            guess_format(Path::new("tile.jpeg")).unwrap().extension(),
            "jpg"
        );
        assert_eq!(guess_format(Path::new("map.svg")).unwrap(), OutputFormat::Svg);
    }

    #[test]
    fn test_guess_format_unknown() {
        let err = guess_format(Path::new("out.xyz")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownFormat);
        assert_eq!(err.to_string(), "unknown output extension for: out.xyz");
        assert!(guess_format(Path::new("noext")).is_err());
    }
}
