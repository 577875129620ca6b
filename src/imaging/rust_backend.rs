//! Pure Rust image backend on the `image` crate.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` (content-sniffed, pure Rust decoders) |
//! | Orientation, EXIF, ICC | `image::ImageDecoder` accessors, read before pixel decode |
//! | ICC carry-over | RGB profiles only; GRAY/CMYK profiles are dropped |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (baseline, 4:4:4, JFIF density) |
//! | EXIF carry-over | [`exif`](super::exif): patched IFD0 spliced in as APP1 |
//!
//! HEIC/HEIF are allow-listed by extension but have no decoder here;
//! [`CodecSupport::detect`] reports that, and the batch driver skips those
//! files instead of failing them.

use super::backend::{BackendError, ImageBackend, SourceImage};
use super::compositor::CompositedImage;
use super::exif;
use super::params::EncodeParams;
use image::codecs::jpeg::{JpegEncoder, PixelDensity};
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageEncoder, ImageFormat, ImageReader};
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

/// Extensions handled by the `image` crate decoders compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

/// HEIF container extensions. Discovered, but only converted when a HEIF
/// decoder is available.
pub const HEIF_EXTENSIONS: &[&str] = &["heic", "heif"];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    let mut exts: Vec<&'static str> = PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect();
    exts.extend_from_slice(HEIF_EXTENSIONS);
    exts
});

/// Lowercase extensions that discovery picks up, HEIF included.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// True if the path has a HEIC/HEIF extension (case-insensitive).
pub fn is_heif(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| HEIF_EXTENSIONS.iter().any(|h| e.eq_ignore_ascii_case(h)))
}

/// Optional decoders available at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodecSupport {
    pub heif: bool,
}

impl CodecSupport {
    /// Probe the compiled-in decoders.
    pub fn detect() -> Self {
        let heif = HEIF_EXTENSIONS.iter().any(|ext| {
            ImageFormat::from_extension(ext).is_some_and(|fmt| fmt.reading_enabled())
        });
        Self { heif }
    }
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load an image from disk along with its orientation and metadata.
///
/// The format is sniffed from content, so a PNG named `.jpg` still decodes.
/// Metadata read failures are not fatal: the photo converts without it.
fn load_source(path: &Path) -> Result<SourceImage, BackendError> {
    let decode_err =
        |e: image::ImageError| BackendError::Decode(format!("{}: {}", path.display(), e));

    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let mut decoder = reader.into_decoder().map_err(decode_err)?;

    let icc_profile = decoder.icc_profile().unwrap_or_else(|e| {
        debug!(path = %path.display(), "ignoring unreadable ICC profile: {e}");
        None
    });
    let exif = decoder.exif_metadata().unwrap_or_else(|e| {
        debug!(path = %path.display(), "ignoring unreadable EXIF: {e}");
        None
    });
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);

    let pixels = DynamicImage::from_decoder(decoder).map_err(decode_err)?;
    Ok(SourceImage {
        pixels,
        orientation,
        exif,
        icc_profile,
    })
}

/// True if the ICC header declares an RGB data colour space.
///
/// Output is always RGB, so a GRAY or CMYK profile would misdescribe it.
fn is_rgb_profile(icc: &[u8]) -> bool {
    icc.get(16..20) == Some(b"RGB ".as_slice())
}

/// JFIF density is a u16; DPI is validated well below that, but clamp anyway.
fn jfif_density(dpi: u32) -> PixelDensity {
    PixelDensity::dpi(u16::try_from(dpi).unwrap_or(u16::MAX))
}

impl ImageBackend for RustBackend {
    fn decode(&self, path: &Path) -> Result<SourceImage, BackendError> {
        load_source(path)
    }

    fn encode_jpeg(
        &self,
        image: &CompositedImage,
        params: &EncodeParams,
    ) -> Result<Vec<u8>, BackendError> {
        let mut buf = Vec::new();
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut buf, params.quality.value());
            encoder.set_pixel_density(jfif_density(params.dpi));
            if let Some(icc) = &params.icc_profile {
                if !is_rgb_profile(icc) {
                    debug!("ICC profile not carried over: not an RGB profile");
                } else if let Err(e) = encoder.set_icc_profile(icc.clone()) {
                    debug!("ICC profile not written: {e}");
                }
            }
            encoder
                .encode_image(image.as_rgb())
                .map_err(|e| BackendError::Encode(e.to_string()))?;
        }

        if let Some(source_exif) = &params.exif {
            match exif::normalize_for_print(source_exif, params.dpi)
                .and_then(|block| exif::embed_in_jpeg(&buf, &block))
            {
                Some(with_exif) => buf = with_exif,
                None => debug!("source EXIF not carried over: unparseable or too large"),
            }
        }

        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::calculations::PixelCanvas;
    use crate::imaging::compositor::composite;
    use crate::imaging::params::{Background, Quality};
    use crate::test_helpers::*;
    use image::{GenericImageView, Rgb, RgbImage};

    fn gray_canvas(width: u32, height: u32) -> CompositedImage {
        let src = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([90, 90, 90])));
        composite(&src, PixelCanvas { width, height }, Background::WHITE.rgb())
    }

    #[test]
    fn supported_extensions_match_allow_list() {
        let exts = supported_input_extensions();
        for expected in &["jpg", "jpeg", "png", "tif", "tiff", "webp", "heic", "heif"] {
            assert!(
                exts.contains(expected),
                "expected {expected} in supported extensions"
            );
        }
        assert!(!exts.contains(&"gif"));
    }

    #[test]
    fn heif_detection_is_case_insensitive() {
        assert!(is_heif(Path::new("IMG_0001.HEIC")));
        assert!(is_heif(Path::new("a.heif")));
        assert!(!is_heif(Path::new("a.jpg")));
        assert!(!is_heif(Path::new("heic")));
    }

    #[test]
    fn no_heif_decoder_compiled_in() {
        assert!(!CodecSupport::detect().heif);
    }

    #[test]
    fn decode_synthetic_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        write_jpeg(&path, 200, 150);

        let source = RustBackend::new().decode(&path).unwrap();
        assert_eq!(source.pixels.dimensions(), (200, 150));
        assert_eq!(source.orientation, Orientation::NoTransforms);
    }

    #[test]
    fn decode_sniffs_content_not_extension() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("actually_png.jpg");
        write_rgba_png(&path, 40, 30, 128);

        let source = RustBackend::new().decode(&path).unwrap();
        assert!(source.has_alpha());
    }

    #[test]
    fn decode_reads_exif_orientation() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("rotated.jpg");
        write_jpeg_with_orientation(&path, 120, 80, 6);

        let source = RustBackend::new().decode(&path).unwrap();
        assert_eq!(source.orientation, Orientation::Rotate90);
        assert!(source.exif.is_some());
        assert_eq!(source.into_upright().pixels.dimensions(), (80, 120));
    }

    #[test]
    fn decode_corrupt_file_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("broken.jpg");
        write_corrupt(&path);

        let result = RustBackend::new().decode(&path);
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn decode_nonexistent_file_is_io_error() {
        let result = RustBackend::new().decode(Path::new("/nonexistent/image.jpg"));
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn encode_produces_decodable_jpeg_of_canvas_size() {
        let params = EncodeParams {
            quality: Quality::new(90),
            dpi: 72,
            ..Default::default()
        };
        let bytes = RustBackend::new()
            .encode_jpeg(&gray_canvas(425, 283), &params)
            .unwrap();

        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (425, 283));
    }

    #[test]
    fn encode_writes_jfif_density() {
        let params = EncodeParams {
            dpi: 300,
            ..Default::default()
        };
        let bytes = RustBackend::new()
            .encode_jpeg(&gray_canvas(16, 16), &params)
            .unwrap();

        // APP0 JFIF: units at 13, Xdensity at 14..16, Ydensity at 16..18
        assert_eq!(&bytes[2..4], &[0xFF, 0xE0]);
        assert_eq!(&bytes[6..11], b"JFIF\0");
        assert_eq!(bytes[13], 1);
        assert_eq!(u16::from_be_bytes([bytes[14], bytes[15]]), 300);
        assert_eq!(u16::from_be_bytes([bytes[16], bytes[17]]), 300);
    }

    #[test]
    fn encode_carries_normalized_exif() {
        let params = EncodeParams {
            dpi: 300,
            exif: Some(crate::imaging::exif::tests::sample_tiff(6)),
            ..Default::default()
        };
        let bytes = RustBackend::new()
            .encode_jpeg(&gray_canvas(16, 16), &params)
            .unwrap();

        let carried = exif::find_in_jpeg(&bytes).expect("EXIF segment present");
        // Orientation value of the first IFD0 entry
        assert_eq!(u16::from_le_bytes([carried[18], carried[19]]), 1);
    }

    #[test]
    fn rgb_profile_detection_reads_header_colour_space() {
        assert!(is_rgb_profile(&icc_profile_header(b"RGB ")));
        assert!(!is_rgb_profile(&icc_profile_header(b"GRAY")));
        assert!(!is_rgb_profile(&icc_profile_header(b"CMYK")));
        assert!(!is_rgb_profile(b"short"));
    }

    fn embedded_icc(bytes: &[u8]) -> Option<Vec<u8>> {
        image::ImageReader::new(std::io::Cursor::new(bytes))
            .with_guessed_format()
            .unwrap()
            .into_decoder()
            .unwrap()
            .icc_profile()
            .unwrap()
    }

    #[test]
    fn encode_carries_rgb_icc_profile() {
        let icc = icc_profile_header(b"RGB ");
        let params = EncodeParams {
            icc_profile: Some(icc.clone()),
            ..Default::default()
        };
        let bytes = RustBackend::new()
            .encode_jpeg(&gray_canvas(16, 16), &params)
            .unwrap();
        assert_eq!(embedded_icc(&bytes), Some(icc));
    }

    #[test]
    fn encode_drops_non_rgb_icc_profile() {
        for space in [b"GRAY", b"CMYK"] {
            let params = EncodeParams {
                icc_profile: Some(icc_profile_header(space)),
                ..Default::default()
            };
            let bytes = RustBackend::new()
                .encode_jpeg(&gray_canvas(16, 16), &params)
                .unwrap();
            assert_eq!(embedded_icc(&bytes), None);
            assert!(image::load_from_memory(&bytes).is_ok());
        }
    }

    #[test]
    fn grayscale_source_with_gray_profile_converts_untagged() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("mono.jpg");
        write_gray_jpeg_with_icc(&path, 40, 30, &icc_profile_header(b"GRAY"));

        let backend = RustBackend::new();
        let source = backend.decode(&path).unwrap();
        assert!(source.icc_profile.is_some());

        let canvas = PixelCanvas { width: 40, height: 30 };
        let composited = composite(&source.pixels, canvas, Background::WHITE.rgb());
        let params = EncodeParams {
            icc_profile: source.icc_profile,
            ..Default::default()
        };
        let bytes = backend.encode_jpeg(&composited, &params).unwrap();

        assert_eq!(image::load_from_memory(&bytes).unwrap().color(), image::ColorType::Rgb8);
        assert_eq!(embedded_icc(&bytes), None);
    }

    #[test]
    fn encode_drops_unparseable_exif() {
        let params = EncodeParams {
            dpi: 300,
            exif: Some(b"garbage".to_vec()),
            ..Default::default()
        };
        let bytes = RustBackend::new()
            .encode_jpeg(&gray_canvas(16, 16), &params)
            .unwrap();
        assert!(exif::find_in_jpeg(&bytes).is_none());
        assert!(image::load_from_memory(&bytes).is_ok());
    }
}
