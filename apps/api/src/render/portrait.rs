//! Portrait Renderer: photo bytes to a circular portrait, or an initials badge.
//!
//! The photo is center-cropped to a square on its shorter side and resized to
//! [`PORTRAIT_PIXELS`]. Two encodings come out of one decode:
//!   - a JPEG of the square, which the page surface clips to a circle itself;
//!   - a PNG disc with transparent corners and the ring painted in, for surfaces
//!     that cannot clip.
//!
//! Any failure degrades to [`Portrait::Initials`]. Nothing here returns an error
//! to the composer.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use thiserror::Error;
use tracing::{debug, warn};

use crate::layout::theme::Rgb;

/// Edge length of the resized square, in pixels.
pub const PORTRAIT_PIXELS: u32 = 400;
/// Width of the painted ring in the PNG disc, in pixels.
const RING_PIXELS: f32 = 10.0;
const JPEG_QUALITY: u8 = 90;

#[derive(Debug, Error)]
pub enum PortraitError {
    #[error("photo could not be decoded: {0}")]
    Decode(#[source] image::ImageError),

    #[error("photo has no pixels")]
    Empty,

    #[error("portrait could not be encoded: {0}")]
    Encode(#[source] image::ImageError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortraitImage {
    /// Square RGB JPEG, `pixels` × `pixels`.
    pub jpeg: Bytes,
    /// RGBA PNG with the disc, ring included, and transparent outside.
    pub png_disc: Bytes,
    pub pixels: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Portrait {
    Photo(PortraitImage),
    /// Up to two upper-case letters, possibly empty.
    Initials(String),
}

#[cfg(test)]
impl Portrait {
    pub fn initials(&self) -> Option<&str> {
        match self {
            Portrait::Initials(text) => Some(text),
            Portrait::Photo(_) => None,
        }
    }
}

/// Resolves the portrait once per document. Never fails.
pub fn render(photo: Option<&[u8]>, initials: &str, ring: Rgb) -> Portrait {
    let Some(bytes) = photo.filter(|b| !b.is_empty()) else {
        return Portrait::Initials(initials.to_string());
    };
    match process(bytes, ring) {
        Ok(image) => {
            debug!(bytes = bytes.len(), pixels = image.pixels, "portrait prepared");
            Portrait::Photo(image)
        }
        Err(e) => {
            warn!(error = %e, "portrait degraded to initials badge");
            Portrait::Initials(initials.to_string())
        }
    }
}

fn process(bytes: &[u8], ring: Rgb) -> Result<PortraitImage, PortraitError> {
    let decoded = image::load_from_memory(bytes).map_err(PortraitError::Decode)?;
    let square = center_square(&decoded)?
        .resize_exact(PORTRAIT_PIXELS, PORTRAIT_PIXELS, FilterType::Lanczos3);

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode_image(&square.to_rgb8())
        .map_err(PortraitError::Encode)?;

    let disc = disc_with_ring(square.to_rgba8(), ring);
    let mut png = Vec::new();
    disc.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(PortraitError::Encode)?;

    Ok(PortraitImage {
        jpeg: Bytes::from(jpeg),
        png_disc: Bytes::from(png),
        pixels: PORTRAIT_PIXELS,
    })
}

fn center_square(image: &DynamicImage) -> Result<DynamicImage, PortraitError> {
    let (width, height) = (image.width(), image.height());
    let side = width.min(height);
    if side == 0 {
        return Err(PortraitError::Empty);
    }
    Ok(image.crop_imm((width - side) / 2, (height - side) / 2, side, side))
}

/// Clears everything outside the inscribed circle and paints the outer band in `ring`.
fn disc_with_ring(mut image: RgbaImage, ring: Rgb) -> RgbaImage {
    let size = image.width() as f32;
    let center = size / 2.0;
    let radius = center;
    let ring_color = Rgba([ring.0, ring.1, ring.2, 255]);

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let dx = x as f32 + 0.5 - center;
        let dy = y as f32 + 0.5 - center;
        let distance = (dx * dx + dy * dy).sqrt();
        if distance > radius {
            *pixel = Rgba([0, 0, 0, 0]);
        } else if distance > radius - RING_PIXELS {
            *pixel = ring_color;
        }
    }
    image
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
