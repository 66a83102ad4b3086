//! Output writers.
//!
//! Raster formats go through the `image` crate encoders. Document formats
//! are produced by a [`DocumentWriter`] backend straight from geometry; SVG is
//! the only backend built in.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbaImage};

use super::svg::SvgWriter;
use super::OutputFormat;
use crate::error::{MapError, MapResult};
use crate::map::Map;

/// A backend that writes a map as a vector document.
///
/// Implementations must be thread-safe (`Send + Sync`); they run on render
/// worker threads.
pub trait DocumentWriter: Send + Sync {
    /// Backend name, used in log and error messages.
    fn name(&self) -> &'static str;

    fn supports(&self, format: &OutputFormat) -> bool;

    /// Writes the map at its current extent.
    fn write(&self, map: &Map, format: &OutputFormat) -> MapResult<Vec<u8>>;
}

static SVG_WRITER: SvgWriter = SvgWriter;

/// Looks up the document backend for a format.
pub fn document_writer(format: &OutputFormat) -> MapResult<&'static dyn DocumentWriter> {
    let backends: [&'static dyn DocumentWriter; 1] = [&SVG_WRITER];
    backends
        .into_iter()
        .find(|backend| backend.supports(format))
        .ok_or_else(|| {
            MapError::Codec(format!(
                "no document writer backend available for '{}'",
                format
            ))
        })
}

/// Encodes a rendered image.
pub fn encode_raster(image: &RgbaImage, format: &OutputFormat) -> MapResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let result = match format {
        OutputFormat::Jpeg { quality } => {
            // JPEG carries no alpha channel
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            JpegEncoder::new_with_quality(&mut buffer, *quality).encode_image(&rgb)
        }
        other => {
            let image_format = match other {
                OutputFormat::Png => ImageFormat::Png,
                OutputFormat::Tiff => ImageFormat::Tiff,
                OutputFormat::Bmp => ImageFormat::Bmp,
                _ => {
                    return Err(MapError::Codec(format!(
                        "'{}' is not a raster format",
                        other
                    )))
                }
            };
            image.write_to(&mut Cursor::new(&mut buffer), image_format)
        }
    };
    result.map_err(|e| MapError::Codec(format!("failed to encode {}: {}", format, e)))?;
    Ok(buffer)
}
