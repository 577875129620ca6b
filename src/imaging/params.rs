//! Parameter types for image operations.
//!
//! These structs describe *what* to write, not *how*. They are the interface
//! between the batch driver (which decides what each output looks like) and
//! the [`backend`](super::backend) (which does the actual encoding).
//!
//! ## Types
//!
//! - [`Quality`]: JPEG quality (1–100, default 95). Clamped on construction.
//! - [`Background`]: Letterbox fill color, parsed from `#rrggbb`.
//! - [`EncodeParams`]: Everything the encoder needs besides pixels: quality,
//!   resolution tag, and the metadata to carry through.

use image::Rgb;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quality setting for JPEG encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}

/// Solid fill color for the area around the fitted photo.
///
/// Serializes as the `#rrggbb` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Background(pub Rgb<u8>);

impl Background {
    pub const WHITE: Self = Self(Rgb([255, 255, 255]));

    pub fn rgb(self) -> Rgb<u8> {
        self.0
    }
}

impl Default for Background {
    fn default() -> Self {
        Self::WHITE
    }
}

impl FromStr for Background {
    type Err = String;

    /// Parse `#rrggbb` (the leading `#` is optional).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(format!("expected a #rrggbb color, got {s:?}"));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| format!("expected a #rrggbb color, got {s:?}"))
        };
        Ok(Self(Rgb([channel(0)?, channel(2)?, channel(4)?])))
    }
}

impl fmt::Display for Background {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

impl TryFrom<String> for Background {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Background> for String {
    fn from(bg: Background) -> Self {
        bg.to_string()
    }
}

/// Parameters for writing one composited image as JPEG.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EncodeParams {
    pub quality: Quality,
    /// Written as the JFIF density and, when EXIF is carried, as
    /// X/YResolution.
    pub dpi: u32,
    /// Raw TIFF-structured EXIF block from the source, if any.
    pub exif: Option<Vec<u8>>,
    /// ICC profile from the source, if any.
    pub icc_profile: Option<Vec<u8>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_95() {
        assert_eq!(Quality::default().value(), 95);
    }

    #[test]
    fn background_parses_hex() {
        let bg: Background = "#1a2B3c".parse().unwrap();
        assert_eq!(bg.rgb(), Rgb([0x1a, 0x2b, 0x3c]));
        let bare: Background = "ffffff".parse().unwrap();
        assert_eq!(bare, Background::WHITE);
    }

    #[test]
    fn background_rejects_malformed() {
        assert!("#fff".parse::<Background>().is_err());
        assert!("#gggggg".parse::<Background>().is_err());
        assert!("".parse::<Background>().is_err());
    }

    #[test]
    fn background_display_roundtrips() {
        assert_eq!(Background(Rgb([0, 128, 255])).to_string(), "#0080ff");
    }
}
