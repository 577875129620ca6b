//! Letterbox compositing: fit an upright photo onto a print canvas.
//!
//! ```text
//! canvas (background fill)
//! ┌──────────────────────────┐
//! │        off_y             │
//! │      ┌──────────┐        │
//! │off_x │  photo   │        │
//! │      └──────────┘        │
//! └──────────────────────────┘
//! ```
//!
//! The photo is scaled with [`fit_inside`] (never cropped), resized with
//! Lanczos3, and placed at [`center_offset`]. Images with an alpha channel
//! are blended against the background so the result is always opaque RGB.
//! PNG/WebP transparency markers are expanded to alpha by the decoders, so
//! they take the same path.

use super::calculations::{PixelCanvas, center_offset, fit_inside};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage, Rgba};
use tracing::debug;

/// An opaque RGB image of exactly the canvas size, ready to encode.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositedImage(RgbImage);

impl CompositedImage {
    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.0
    }
}

/// Fit `source` inside `canvas`, centered on a `background` fill.
///
/// `source` must already be orientation-corrected; its stored width and
/// height are taken as the viewing dimensions.
pub fn composite(source: &DynamicImage, canvas: PixelCanvas, background: Rgb<u8>) -> CompositedImage {
    let target = (canvas.width, canvas.height);
    let (new_w, new_h) = fit_inside((source.width(), source.height()), target);
    let (off_x, off_y) = center_offset((new_w, new_h), target);
    let has_alpha = source.color().has_alpha();

    debug!(
        src_w = source.width(),
        src_h = source.height(),
        new_w,
        new_h,
        off_x,
        off_y,
        has_alpha,
        "compositing onto {}x{} canvas",
        canvas.width,
        canvas.height
    );

    let mut out = RgbImage::from_pixel(canvas.width, canvas.height, background);

    if has_alpha {
        let resized = imageops::resize(&source.to_rgba8(), new_w, new_h, FilterType::Lanczos3);
        for (x, y, pixel) in resized.enumerate_pixels() {
            let dst = out.get_pixel_mut(off_x + x, off_y + y);
            *dst = blend_over(*dst, *pixel);
        }
    } else {
        let resized = imageops::resize(&source.to_rgb8(), new_w, new_h, FilterType::Lanczos3);
        imageops::replace(&mut out, &resized, i64::from(off_x), i64::from(off_y));
    }

    CompositedImage(out)
}

/// Source-over blend of `fg` onto an opaque `bg`, rounding to nearest.
fn blend_over(bg: Rgb<u8>, fg: Rgba<u8>) -> Rgb<u8> {
    let a = u32::from(fg[3]);
    let inv = 255 - a;
    let mix = |f: u8, b: u8| ((u32::from(f) * a + u32::from(b) * inv + 127) / 255) as u8;
    Rgb([mix(fg[0], bg[0]), mix(fg[1], bg[1]), mix(fg[2], bg[2])])
}
