//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations that touch encoded
//! bytes: decode a source file into a [`SourceImage`], and encode a
//! [`CompositedImage`] as JPEG. Everything between (orientation, geometry,
//! compositing) is pure and lives outside the backend.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend) on the `image` crate.

use super::compositor::CompositedImage;
use super::params::EncodeParams;
use image::DynamicImage;
use image::metadata::Orientation;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Pixel size of a decoded image, as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// A decoded photo plus the metadata needed to print it.
///
/// `pixels` are as stored in the file. Call [`SourceImage::into_upright`]
/// before measuring: a 90° orientation swaps width and height.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub pixels: DynamicImage,
    /// Orientation still to be applied to `pixels`.
    pub orientation: Orientation,
    /// Raw TIFF-structured EXIF block.
    pub exif: Option<Vec<u8>>,
    pub icc_profile: Option<Vec<u8>>,
}

impl SourceImage {
    /// Wrap pixels that carry no metadata.
    pub fn new(pixels: DynamicImage) -> Self {
        Self {
            pixels,
            orientation: Orientation::NoTransforms,
            exif: None,
            icc_profile: None,
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.pixels.width(),
            height: self.pixels.height(),
        }
    }

    pub fn has_alpha(&self) -> bool {
        self.pixels.color().has_alpha()
    }

    /// Apply the pending orientation so the pixels match the intended view.
    pub fn into_upright(mut self) -> Self {
        self.pixels.apply_orientation(self.orientation);
        self.orientation = Orientation::NoTransforms;
        self
    }
}

/// Trait for image processing backends.
///
/// `Send + Sync` so a backend can be shared with the batch worker thread.
pub trait ImageBackend: Send + Sync {
    /// Decode a source file, collecting orientation and embedded metadata.
    fn decode(&self, path: &Path) -> Result<SourceImage, BackendError>;

    /// Encode a composited image as a complete JPEG file in memory.
    fn encode_jpeg(
        &self,
        image: &CompositedImage,
        params: &EncodeParams,
    ) -> Result<Vec<u8>, BackendError>;
}
