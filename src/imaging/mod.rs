//! Image processing in pure Rust, statically linked.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` + decoder metadata accessors |
//! | **Orient** | `DynamicImage::apply_orientation` |
//! | **Fit + letterbox** | Lanczos3 resize onto a solid canvas |
//! | **Encode** | `JpegEncoder` with JFIF density, ICC, patched EXIF |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for print geometry (unit testable)
//! - **Parameters**: Data structures describing the encode step
//! - **Compositor**: Fit, center, and flatten onto the background
//! - **EXIF**: Orientation/resolution rewrite and APP1 splicing
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod compositor;
pub mod exif;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend, SourceImage};
pub use calculations::{
    GeometryError, PhysicalCanvas, PixelCanvas, center_offset, fit_inside, physical_to_pixels,
    select_canvas,
};
pub use compositor::{CompositedImage, composite};
pub use params::{Background, EncodeParams, Quality};
pub use rust_backend::{CodecSupport, RustBackend, is_heif, supported_input_extensions};
