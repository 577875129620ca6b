//! Converter configuration.
//!
//! Handles loading, validating, and merging `fitprint.toml`. Values are
//! layered, each layer overriding the one below:
//!
//! ```text
//! command-line flags        --dpi 600
//!        ▲
//! fitprint.toml             <SOURCE>/fitprint.toml, or --config FILE
//!        ▲
//! stock defaults            FormatterConfig::default()
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! dpi = 300                  # Print resolution, 72-1200
//!
//! [output]
//! quality = 95               # JPEG quality, 1-100
//! background = "#ffffff"     # Letterbox fill color
//! preserve_metadata = true   # Carry EXIF and ICC profile into the output
//!
//! [scan]
//! follow_links = false       # Descend into symlinked folders
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::Background;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Config file picked up from the source directory when present.
pub const CONFIG_FILE_NAME: &str = "fitprint.toml";

/// Accepted print resolutions.
pub const DPI_RANGE: std::ops::RangeInclusive<u32> = 72..=1200;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Converter configuration loaded from `fitprint.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatterConfig {
    /// Print resolution in dots per inch.
    pub dpi: u32,
    /// JPEG encoding and letterbox settings.
    pub output: OutputConfig,
    /// Source discovery settings.
    pub scan: ScanConfig,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            dpi: 300,
            output: OutputConfig::default(),
            scan: ScanConfig::default(),
        }
    }
}

impl FormatterConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !DPI_RANGE.contains(&self.dpi) {
            return Err(ConfigError::Validation(format!(
                "dpi must be {}-{}, got {}",
                DPI_RANGE.start(),
                DPI_RANGE.end(),
                self.dpi
            )));
        }
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(format!(
                "output.quality must be 1-100, got {}",
                self.output.quality
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub quality: u32,
    /// `#rrggbb`; rejected at parse time if malformed.
    pub background: Background,
    pub preserve_metadata: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            quality: 95,
            background: Background::WHITE,
            preserve_metadata: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    pub follow_links: bool,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(FormatterConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<FormatterConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: FormatterConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Values given on the command line, applied on top of the config file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub dpi: Option<u32>,
    pub quality: Option<u32>,
    pub background: Option<String>,
}

impl Overrides {
    /// Sparse TOML overlay holding only the values that were given.
    pub fn to_toml(&self) -> toml::Value {
        let mut root = toml::Table::new();
        if let Some(dpi) = self.dpi {
            root.insert("dpi".into(), toml::Value::Integer(i64::from(dpi)));
        }
        let mut output = toml::Table::new();
        if let Some(quality) = self.quality {
            output.insert("quality".into(), toml::Value::Integer(i64::from(quality)));
        }
        if let Some(background) = &self.background {
            output.insert("background".into(), toml::Value::String(background.clone()));
        }
        if !output.is_empty() {
            root.insert("output".into(), toml::Value::Table(output));
        }
        toml::Value::Table(root)
    }
}

/// Resolve stock defaults, then the file at `path`, then `overrides`.
///
/// A missing file falls back to defaults unless `required` is set (an
/// explicit `--config`), in which case it is an IO error.
pub fn load_layered(
    path: &Path,
    required: bool,
    overrides: &Overrides,
) -> Result<FormatterConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let base = match load_raw_config(path)? {
        Some(file) => merge_toml(base, file),
        None if required => {
            return Err(ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("config file not found: {}", path.display()),
            )));
        }
        None => base,
    };
    resolve_config(base, Some(overrides.to_toml()))
}

/// Returns a fully-commented stock `fitprint.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# fitprint Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file as fitprint.toml in the source folder, or pass it with
# --config. Command-line flags override values from the file.
# Unknown keys will cause an error.

# Print resolution in dots per inch (72-1200).
# The canvas is 15x10 cm (landscape) or 10x15 cm (portrait) at this DPI:
#   300 dpi -> 1772x1181 px, 600 dpi -> 3543x2362 px
dpi = 300

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# JPEG encoding quality (1 = worst, 100 = best).
quality = 95

# Color of the bars around photos that do not match the 3:2 print shape.
background = "#ffffff"

# Copy EXIF (capture date, camera, ...) and the ICC color profile from each
# source photo into its print file. Orientation is reset and the resolution
# tags are set to the print DPI.
preserve_metadata = true

# ---------------------------------------------------------------------------
# Source discovery
# ---------------------------------------------------------------------------
[scan]
# Descend into symbolic links to folders. Links to files are always read.
follow_links = false
"##
}
