//! Image encoding: thumbnail canvas → baseline JPEG bytes.
//!
//! Every thumbnail is stored as JPEG regardless of the source encoding. The
//! canvas is already RGB, so transparency from PNG/GIF/WebP sources has been
//! flattened by the time it gets here.

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use tracing::debug;

/// Encode a thumbnail as JPEG at `quality` (1–100).
pub fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality).encode_image(img)?;

    debug!("Encoded thumbnail → {} bytes JPEG (q={})", buf.len(), quality);

    Ok(buf)
}
