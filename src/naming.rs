//! Collision-safe output file names.
//!
//! Every converted photo is written as `{stem}_10x15.jpg`. When that name is
//! taken in the destination, a counter is appended:
//!
//! ```text
//! beach.jpg   → beach_10x15.jpg
//! beach.png   → beach_10x15_1.jpg     (first name already used)
//! beach.webp  → beach_10x15_2.jpg
//! ```
//!
//! The probe is a plain existence check, so it is only collision-free with a
//! single writer per destination. The batch driver additionally persists with
//! a no-clobber rename, so a racing writer produces an error, never an
//! overwrite.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Suffix that marks a file as a print conversion.
pub const PRINT_SUFFIX: &str = "_10x15";

/// Output extension. Conversions are always JPEG.
pub const OUTPUT_EXTENSION: &str = "jpg";

/// Upper bound on counter probes for one stem.
pub const MAX_PROBES: u32 = 100_000;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NamingError {
    #[error("No free output name for '{stem}' after {attempts} attempts")]
    Exhausted { stem: String, attempts: u32 },
}

/// File name for the `n`th candidate: `n == 0` is the bare name.
pub fn output_file_name(stem: &str, n: u32) -> String {
    if n == 0 {
        format!("{stem}{PRINT_SUFFIX}.{OUTPUT_EXTENSION}")
    } else {
        format!("{stem}{PRINT_SUFFIX}_{n}.{OUTPUT_EXTENSION}")
    }
}

/// First candidate path in `dest_dir` that does not exist yet.
pub fn next_available_name(stem: &str, dest_dir: &Path) -> Result<PathBuf, NamingError> {
    probe_within(stem, dest_dir, MAX_PROBES)
}

/// Like [`next_available_name`], trying counters `0..=max` only.
///
/// `max + 1` candidates are checked before giving up.
pub fn probe_within(stem: &str, dest_dir: &Path, max: u32) -> Result<PathBuf, NamingError> {
    (0..=max)
        .map(|n| dest_dir.join(output_file_name(stem, n)))
        .find(|candidate| !candidate.exists())
        .ok_or_else(|| NamingError::Exhausted {
            stem: stem.to_string(),
            attempts: max.saturating_add(1),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn bare_name_has_print_suffix() {
        assert_eq!(output_file_name("IMG_0001", 0), "IMG_0001_10x15.jpg");
    }

    #[test]
    fn numbered_names_append_counter() {
        assert_eq!(output_file_name("IMG_0001", 1), "IMG_0001_10x15_1.jpg");
        assert_eq!(output_file_name("IMG_0001", 42), "IMG_0001_10x15_42.jpg");
    }

    #[test]
    fn stem_with_dots_and_spaces_is_kept() {
        assert_eq!(
            output_file_name("trip 2024.v2", 0),
            "trip 2024.v2_10x15.jpg"
        );
    }

    #[test]
    fn empty_destination_gets_bare_name() {
        let tmp = TempDir::new().unwrap();
        let path = next_available_name("photo", tmp.path()).unwrap();
        assert_eq!(path, tmp.path().join("photo_10x15.jpg"));
    }

    #[test]
    fn sequential_names_when_each_is_taken() {
        let tmp = TempDir::new().unwrap();
        let mut names = Vec::new();
        for _ in 0..3 {
            let path = next_available_name("photo", tmp.path()).unwrap();
            fs::write(&path, b"x").unwrap();
            names.push(path.file_name().unwrap().to_string_lossy().into_owned());
        }
        assert_eq!(
            names,
            vec!["photo_10x15.jpg", "photo_10x15_1.jpg", "photo_10x15_2.jpg"]
        );
    }

    #[test]
    fn gaps_are_filled_first() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("photo_10x15.jpg"), b"x").unwrap();
        fs::write(tmp.path().join("photo_10x15_2.jpg"), b"x").unwrap();

        let path = next_available_name("photo", tmp.path()).unwrap();
        assert_eq!(path, tmp.path().join("photo_10x15_1.jpg"));
    }

    #[test]
    fn never_returns_existing_path() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a_10x15.jpg"), b"x").unwrap();
        let path = next_available_name("a", tmp.path()).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn exhausted_when_every_candidate_is_taken() {
        let tmp = TempDir::new().unwrap();
        for name in ["photo_10x15.jpg", "photo_10x15_1.jpg", "photo_10x15_2.jpg"] {
            fs::write(tmp.path().join(name), b"x").unwrap();
        }

        let err = probe_within("photo", tmp.path(), 2).unwrap_err();
        assert_eq!(
            err,
            NamingError::Exhausted {
                stem: "photo".into(),
                attempts: 3
            }
        );
        assert_eq!(
            err.to_string(),
            "No free output name for 'photo' after 3 attempts"
        );
    }

    #[test]
    fn bound_is_inclusive() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("photo_10x15.jpg"), b"x").unwrap();
        fs::write(tmp.path().join("photo_10x15_1.jpg"), b"x").unwrap();

        let path = probe_within("photo", tmp.path(), 2).unwrap();
        assert_eq!(path, tmp.path().join("photo_10x15_2.jpg"));
    }

    #[test]
    fn other_stems_do_not_interfere() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a_10x15.jpg"), b"x").unwrap();
        let path = next_available_name("b", tmp.path()).unwrap();
        assert_eq!(path, tmp.path().join("b_10x15.jpg"));
    }
}
