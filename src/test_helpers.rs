//! Shared test utilities for the fitprint test suite.
//!
//! Writes small synthetic photos with the `image` crate so tests never depend
//! on fixture files.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_jpeg(&tmp.path().join("a.jpg"), 120, 80);
//! write_jpeg_with_orientation(&tmp.path().join("r.jpg"), 120, 80, 6);
//! ```

use crate::imaging::exif;
use image::codecs::jpeg::JpegEncoder;
use image::{GrayImage, ImageEncoder, Luma, Rgb, RgbImage, Rgba, RgbaImage};
use std::path::Path;

/// Gradient so resized output is not trivially uniform.
fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

fn encode_jpeg(img: &RgbImage) -> Vec<u8> {
    let mut buf = Vec::new();
    JpegEncoder::new(&mut buf)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
    buf
}

/// Write a baseline JPEG with no metadata.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    std::fs::write(path, encode_jpeg(&gradient(width, height))).unwrap();
}

/// Write an opaque RGB PNG.
pub fn write_png(path: &Path, width: u32, height: u32) {
    gradient(width, height).save_with_format(path, image::ImageFormat::Png).unwrap();
}

/// Write an RGBA PNG with a uniform alpha value.
pub fn write_rgba_png(path: &Path, width: u32, height: u32, alpha: u8) {
    RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, alpha]))
        .save_with_format(path, image::ImageFormat::Png)
        .unwrap();
}

/// Write a JPEG whose EXIF says it must be displayed with `orientation`.
///
/// The stored pixels are `width × height`; orientations 5-8 display rotated.
pub fn write_jpeg_with_orientation(path: &Path, width: u32, height: u32, orientation: u16) {
    let jpeg = encode_jpeg(&gradient(width, height));
    let tiff = exif::tests::sample_tiff(orientation);
    std::fs::write(path, exif::embed_in_jpeg(&jpeg, &tiff).unwrap()).unwrap();
}

/// Minimal 128-byte ICC header declaring `space` as the data colour space.
///
/// No tag table; enough for colour-space checks and APP2 round trips.
pub fn icc_profile_header(space: &[u8; 4]) -> Vec<u8> {
    let mut icc = vec![0u8; 128];
    icc[0..4].copy_from_slice(&128u32.to_be_bytes());
    icc[12..16].copy_from_slice(b"mntr");
    icc[16..20].copy_from_slice(space);
    icc[20..24].copy_from_slice(b"XYZ ");
    icc[36..40].copy_from_slice(b"acsp");
    icc
}

/// Write a single-channel JPEG with an embedded ICC profile.
pub fn write_gray_jpeg_with_icc(path: &Path, width: u32, height: u32, icc: &[u8]) {
    let img = GrayImage::from_pixel(width, height, Luma([100]));
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new(&mut buf);
    encoder.set_icc_profile(icc.to_vec()).unwrap();
    encoder
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::L8)
        .unwrap();
    std::fs::write(path, buf).unwrap();
}

/// Write bytes that no decoder accepts.
pub fn write_corrupt(path: &Path) {
    std::fs::write(path, b"this is definitely not an image").unwrap();
}

/// Write a file that only looks like HEIC by name.
pub fn write_fake_heic(path: &Path) {
    std::fs::write(path, b"\0\0\0\x18ftypheic").unwrap();
}
