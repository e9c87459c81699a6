//! Square thumbnail generation: scale to a fixed height, center-crop, caption.
//!
//! ```text
//!  original W×H ──resize──▶ floor(W·200/H) × 200 ──crop──▶ 200 × 200 ──▶ caption
//! ```
//!
//! Height is always normalised first, so landscape images are cropped on
//! both sides while portrait images come out narrower than the canvas and
//! leave a black band on the right.

use crate::config::THUMBNAIL_SIZE;
use crate::pipeline::decode::RasterImage;
use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use tracing::debug;

/// Integer scale applied to the 8×8 font.
const GLYPH_SCALE: u32 = 2;
/// Width of one caption character cell, in pixels.
pub const GLYPH_WIDTH: u32 = 8 * GLYPH_SCALE;
/// Height of one caption line, in pixels.
pub const GLYPH_HEIGHT: u32 = 8 * GLYPH_SCALE;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Width of the image after scaling it to [`THUMBNAIL_SIZE`] in height.
///
/// Exact integer floor of `width * 200 / height`.
pub fn scaled_width(width: u32, height: u32) -> u32 {
    if height == 0 {
        return 0;
    }
    (u64::from(width) * u64::from(THUMBNAIL_SIZE) / u64::from(height)) as u32
}

/// Resize, center-crop and optionally caption `raster`.
///
/// The source is consumed; the returned buffer is always
/// [`THUMBNAIL_SIZE`] × [`THUMBNAIL_SIZE`]. Canvas pixels not covered by the
/// resized image are black.
pub fn make_thumbnail(raster: RasterImage, overlay_text: &str) -> RgbImage {
    let (width, height) = (raster.width(), raster.height());
    let new_width = scaled_width(width, height);

    let mut canvas = RgbImage::new(THUMBNAIL_SIZE, THUMBNAIL_SIZE);

    if new_width > 0 {
        let offset_x = new_width.saturating_sub(THUMBNAIL_SIZE) / 2;
        let copy_width = new_width.min(THUMBNAIL_SIZE);

        // Resample only the source columns that land inside the canvas; the
        // intermediate buffer never exceeds 200×200.
        let (src_x, src_width) = source_window(width, height, offset_x, copy_width);
        let window = imageops::crop_imm(raster.pixels(), src_x, 0, src_width, height).to_image();
        let resized = imageops::resize(&window, copy_width, THUMBNAIL_SIZE, FilterType::Triangle);
        imageops::replace(&mut canvas, &resized, 0, 0);

        debug!(
            "Thumbnail: {}x{} {:?} → {}x{} → crop at x={} (w={}), source cols {}..{}",
            width,
            height,
            raster.format(),
            new_width,
            THUMBNAIL_SIZE,
            offset_x,
            copy_width,
            src_x,
            src_x + src_width
        );
    }

    if !overlay_text.is_empty() {
        draw_caption(&mut canvas, overlay_text);
    }

    canvas
}

/// Source columns `(x, width)` that map onto scaled columns
/// `offset_x..offset_x + copy_width`, clamped to the image and at least one
/// column wide.
fn source_window(width: u32, height: u32, offset_x: u32, copy_width: u32) -> (u32, u32) {
    let size = u64::from(THUMBNAIL_SIZE);
    let h = u64::from(height);
    let src_x = (u64::from(offset_x) * h / size).min(u64::from(width.saturating_sub(1)));
    let src_width = (u64::from(copy_width) * h).div_ceil(size);
    let src_width = src_width.clamp(1, u64::from(width) - src_x);
    (src_x as u32, src_width as u32)
}

/// Top-left corner of a centered caption. Either coordinate may be negative
/// when the text is wider or taller than the canvas.
pub fn caption_origin(text: &str) -> (i64, i64) {
    let size = i64::from(THUMBNAIL_SIZE);
    let text_width = text.chars().count() as i64 * i64::from(GLYPH_WIDTH);
    let text_height = i64::from(GLYPH_HEIGHT);
    ((size - text_width) / 2, (size - text_height) / 2)
}

/// Stamp `text` centered on the canvas: black at (+1, +1), then white on top.
pub fn draw_caption(canvas: &mut RgbImage, text: &str) {
    let (x, y) = caption_origin(text);
    draw_text(canvas, text, x + 1, y + 1, BLACK);
    draw_text(canvas, text, x, y, WHITE);
}

fn glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .unwrap_or([0; 8])
}

/// Draw one line of text. Pixels outside the canvas are skipped; layout is
/// never wrapped or shrunk to fit.
fn draw_text(canvas: &mut RgbImage, text: &str, x: i64, y: i64, color: Rgb<u8>) {
    let (canvas_w, canvas_h) = (i64::from(canvas.width()), i64::from(canvas.height()));
    let scale = i64::from(GLYPH_SCALE);

    for (i, c) in text.chars().enumerate() {
        let cell_x = x + i as i64 * i64::from(GLYPH_WIDTH);
        for (row, bits) in glyph(c).into_iter().enumerate() {
            for col in 0..8i64 {
                if (bits >> col) & 1 == 0 {
                    continue;
                }
                let px = cell_x + col * scale;
                let py = y + row as i64 * scale;
                for dy in 0..scale {
                    for dx in 0..scale {
                        let (tx, ty) = (px + dx, py + dy);
                        if (0..canvas_w).contains(&tx) && (0..canvas_h).contains(&ty) {
                            canvas.put_pixel(tx as u32, ty as u32, color);
                        }
                    }
                }
            }
        }
    }
}
