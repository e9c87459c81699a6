//! Decode fetched bytes into an owned RGB raster, filtering by size first.
//!
//! Validation is two-phase: the encoding is sniffed and the header
//! dimensions are read without touching pixel data, and only images that
//! pass the minimum-size check are fully decoded. A 6000×4000 JPEG that is
//! then thrown away never costs a full decode.

use crate::error::UnsupportedFormat;
use image::{ImageFormat, ImageReader, RgbImage};
use std::io::Cursor;
use tracing::debug;

/// Source encodings accepted by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl SourceFormat {
    fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Gif => Some(Self::Gif),
            ImageFormat::WebP => Some(Self::WebP),
            _ => None,
        }
    }
}

/// A decoded image, always normalised to 8-bit RGB.
///
/// Owned by the candidate being processed; the transformer consumes it.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pixels: RgbImage,
    format: SourceFormat,
}

impl RasterImage {
    pub fn new(pixels: RgbImage, format: SourceFormat) -> Self {
        Self { pixels, format }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Encoding the bytes were in before decoding.
    pub fn format(&self) -> SourceFormat {
        self.format
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }
}

fn reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, UnsupportedFormat> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| UnsupportedFormat::new(format!("cannot read image header: {e}")))
}

/// Sniff the encoding and read the header dimensions without decoding.
pub fn probe(bytes: &[u8]) -> Result<(SourceFormat, u32, u32), UnsupportedFormat> {
    let reader = reader(bytes)?;
    let format = match reader.format() {
        Some(f) => SourceFormat::from_image_format(f)
            .ok_or_else(|| UnsupportedFormat::new(format!("{f:?} images are not supported")))?,
        None => return Err(UnsupportedFormat::new("unrecognised image encoding")),
    };
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| UnsupportedFormat::new(format!("corrupt {format:?} header: {e}")))?;
    Ok((format, width, height))
}

/// Decode `bytes` if the image is at least `min_width` × `min_height`.
///
/// # Returns
/// * `Ok(Some(raster))` — decoded and large enough
/// * `Ok(None)` — a valid image, but too small; not an error
/// * `Err(UnsupportedFormat)` — not JPEG/PNG/GIF/WebP, or corrupt
pub fn decode_and_validate(
    bytes: &[u8],
    min_width: u32,
    min_height: u32,
) -> Result<Option<RasterImage>, UnsupportedFormat> {
    let (format, width, height) = probe(bytes)?;
    if width < min_width || height < min_height {
        debug!(
            "Rejecting {}x{} {:?} (minimum {}x{})",
            width, height, format, min_width, min_height
        );
        return Ok(None);
    }

    let image = reader(bytes)?
        .decode()
        .map_err(|e| UnsupportedFormat::new(format!("{format:?} decode failed: {e}")))?;
    debug!("Decoded {}x{} {:?}", image.width(), image.height(), format);

    Ok(Some(RasterImage::new(image.to_rgb8(), format)))
}
