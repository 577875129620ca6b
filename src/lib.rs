//! # fitprint
//!
//! Batch-convert a folder of photos into print-ready 10×15 cm (4×6 in) JPEGs.
//! Each photo is turned upright, scaled to fit entirely inside a canvas of the
//! matching orientation, centered, and padded with a solid background, so
//! nothing is cropped at the print shop.
//!
//! # Architecture
//!
//! ```text
//! scan            source/  →  sorted list of eligible files
//! process         per file:  decode → orient → canvas → composite → encode → write
//! output          progress events  →  CLI lines
//! ```
//!
//! The per-file work is sequential and isolated: one bad file becomes an
//! `Error` outcome and the batch carries on.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Recursive discovery with the extension allow-list, sorted by path |
//! | [`process`] | Batch driver: run state, cancellation, per-file pipeline, progress events |
//! | [`imaging`] | Print geometry, letterbox compositor, EXIF rewrite, decode/encode backend |
//! | [`naming`] | `{stem}_10x15.jpg` output names with collision counters |
//! | [`types`] | Outcome and result types shared by the driver, CLI, and JSON output |
//! | [`config`] | `fitprint.toml` loading, merging, and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Fit, Never Crop
//!
//! The photo is scaled by `min(canvas_w / w, canvas_h / h)`, so the whole
//! frame always survives and the leftover area becomes bars in the background
//! color. Small photos are magnified to fill the binding edge.
//!
//! ## Orientation Before Geometry
//!
//! EXIF orientation is applied before anything is measured. A phone portrait
//! stored as 4032×3024 with orientation 6 gets the 10×15 portrait canvas, not
//! the landscape one. The written EXIF has its orientation reset to 1 so
//! viewers do not rotate the print file a second time.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding and JPEG encoding use the `image` crate only. The binary has no
//! system dependencies. HEIC/HEIF files are recognized but skipped, since no
//! pure-Rust HEIF decoder is compiled in; [`imaging::CodecSupport`] carries
//! that capability as configuration rather than a global switch.
//!
//! ## Never Overwrite
//!
//! Outputs are named with the first free `_10x15[_N].jpg` slot and written
//! through a temp file plus no-clobber rename. Running the same batch twice
//! adds a second set of files instead of replacing the first.

pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod process;
pub mod scan;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
