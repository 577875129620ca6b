//! Pure calculation functions for print geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! ## Rounding
//!
//! [`physical_to_pixels`] rounds half away from zero (`f64::round`), so a
//! length that lands exactly on `.5` pixels always grows: 1.27 cm (half an
//! inch) at 5 DPI is 2.5 px and becomes 3, not 2. Canvas sizes at the usual
//! print resolutions:
//!
//! ```text
//! DPI    15 cm   10 cm
//! 72      425     283
//! 300    1772    1181
//! 600    3543    2362
//! ```

use thiserror::Error;

/// Centimetres per inch.
const CM_PER_INCH: f64 = 2.54;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("DPI must be a positive integer, got {0}")]
    InvalidDpi(u32),
    #[error("Physical length must be a positive, finite number of centimetres, got {0}")]
    InvalidLength(f64),
}

/// A print size in centimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalCanvas {
    pub width_cm: f64,
    pub height_cm: f64,
}

impl PhysicalCanvas {
    /// 15 cm wide, 10 cm tall.
    pub const LANDSCAPE: Self = Self {
        width_cm: 15.0,
        height_cm: 10.0,
    };

    /// 10 cm wide, 15 cm tall.
    pub const PORTRAIT: Self = Self {
        width_cm: 10.0,
        height_cm: 15.0,
    };

    pub fn is_landscape(&self) -> bool {
        self.width_cm >= self.height_cm
    }
}

/// A canvas size in pixels. Both edges are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelCanvas {
    pub width: u32,
    pub height: u32,
}

impl PixelCanvas {
    /// Convert a physical canvas to pixels at the given resolution.
    pub fn from_physical(canvas: PhysicalCanvas, dpi: u32) -> Result<Self, GeometryError> {
        Ok(Self {
            width: physical_to_pixels(canvas.width_cm, dpi)?,
            height: physical_to_pixels(canvas.height_cm, dpi)?,
        })
    }

    /// Pick the canvas orientation for an (already upright) image and size it.
    ///
    /// # Examples
    /// ```
    /// # use fitprint::imaging::PixelCanvas;
    /// let canvas = PixelCanvas::for_image(1200, 800, 300).unwrap();
    /// assert_eq!((canvas.width, canvas.height), (1772, 1181));
    /// ```
    pub fn for_image(width: u32, height: u32, dpi: u32) -> Result<Self, GeometryError> {
        Self::from_physical(select_canvas(width, height), dpi)
    }
}

/// Convert a physical length to a pixel count at `dpi`.
///
/// `pixels = round((length_cm / 2.54) * dpi)`, rounding half away from zero,
/// never less than 1.
pub fn physical_to_pixels(length_cm: f64, dpi: u32) -> Result<u32, GeometryError> {
    if dpi == 0 {
        return Err(GeometryError::InvalidDpi(dpi));
    }
    if !length_cm.is_finite() || length_cm <= 0.0 {
        return Err(GeometryError::InvalidLength(length_cm));
    }
    let px = ((length_cm / CM_PER_INCH) * f64::from(dpi)).round();
    // `as` saturates for values beyond u32::MAX
    Ok((px as u32).max(1))
}

/// Choose the print orientation for an image of the given size.
///
/// Wider-or-equal images go landscape, so squares print 15×10.
pub fn select_canvas(width: u32, height: u32) -> PhysicalCanvas {
    if width >= height {
        PhysicalCanvas::LANDSCAPE
    } else {
        PhysicalCanvas::PORTRAIT
    }
}

/// Calculate the largest size that fits entirely inside `target` while
/// keeping the source aspect ratio.
///
/// Equivalent to `scale = min(tw / sw, th / sh)` with each edge floored, so
/// the result never exceeds the target in either dimension. Small sources
/// are magnified. Degenerate (zero) edges produce a 1-pixel edge.
///
/// Computed with integer cross-multiplication rather than a float scale:
/// `2000 * (1772 / 2000)` is 1771.999… in `f64` and would floor one pixel
/// short of the canvas.
///
/// # Arguments
/// * `source` - Upright source dimensions (width, height)
/// * `target` - Canvas dimensions (width, height)
///
/// # Returns
/// * `(width, height)` - Scaled dimensions, each in `1..=target`
pub fn fit_inside(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = (u64::from(source.0.max(1)), u64::from(source.1.max(1)));
    let (tgt_w, tgt_h) = (u64::from(target.0.max(1)), u64::from(target.1.max(1)));

    let (w, h) = if src_w * tgt_h >= src_h * tgt_w {
        // Width-bound: the source is relatively wider than the canvas
        (tgt_w, src_h * tgt_w / src_w)
    } else {
        (src_w * tgt_h / src_h, tgt_h)
    };

    // Both values are <= their u32 target, so the casts are lossless
    (w.clamp(1, tgt_w) as u32, h.clamp(1, tgt_h) as u32)
}

/// Offset that centers `inner` inside `outer`.
///
/// Floor division: an odd remainder puts the extra pixel on the right or
/// bottom edge.
pub fn center_offset(inner: (u32, u32), outer: (u32, u32)) -> (u32, u32) {
    (
        outer.0.saturating_sub(inner.0) / 2,
        outer.1.saturating_sub(inner.1) / 2,
    )
}
