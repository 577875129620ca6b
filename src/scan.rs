//! Source discovery.
//!
//! Walks the source tree and returns every photo the converter should look
//! at, in a stable order.
//!
//! ## Rules
//!
//! - Recursive; subdirectories are walked at any depth.
//! - Regular files, including symlinks that resolve to one. `follow_links`
//!   only decides whether symlinked *directories* are descended into.
//! - Extension allow-list, case-insensitive:
//!   `jpg jpeg png tif tiff webp heic heif`. HEIC/HEIF files are discovered
//!   even without a decoder so they can be reported as skipped.
//! - Hidden directories (`.name`) are not descended into. Hidden files are
//!   kept: a `.beach.jpg` is still a photo, and one that fails to decode
//!   (such as a macOS `._IMG.jpg` resource fork) gets an error outcome
//!   instead of vanishing from the report.
//! - The destination directory is pruned when it lives inside the source, so
//!   a second run never re-ingests its own output.
//! - Sorted by full path, so runs over the same tree process files in the
//!   same order.

use crate::imaging::supported_input_extensions;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot read source directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Find all eligible photos under `source`, sorted by path.
///
/// `exclude` is pruned from the walk if it is (after canonicalization) one of
/// the directories visited. Entries that cannot be read below the root are
/// logged and skipped; an unreadable root is an error.
pub fn discover_images(
    source: &Path,
    exclude: Option<&Path>,
    follow_links: bool,
) -> Result<Vec<PathBuf>, ScanError> {
    let exclude = exclude.and_then(|p| p.canonicalize().ok());

    let walker = WalkDir::new(source)
        .follow_links(follow_links)
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0 || !(is_hidden_dir(e) || is_excluded(e, exclude.as_deref()))
        });

    let mut found = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(e.into()),
            Err(e) => {
                warn!("skipping unreadable entry: {e}");
                continue;
            }
        };
        // `Path::is_file` follows symlinks; the walker's file type does not
        if entry.path().is_file() && is_supported(entry.path()) {
            found.push(entry.into_path());
        }
    }

    found.sort();
    debug!(count = found.len(), source = %source.display(), "discovery finished");
    Ok(found)
}

/// True if the extension is on the allow-list.
pub fn is_supported(path: &Path) -> bool {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    supported_input_extensions().contains(&ext.as_str())
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name().to_string_lossy().starts_with('.')
}

fn is_excluded(entry: &DirEntry, exclude: Option<&Path>) -> bool {
    match exclude {
        Some(excluded) if entry.file_type().is_dir() => entry
            .path()
            .canonicalize()
            .is_ok_and(|p| p == excluded),
        _ => false,
    }
}
