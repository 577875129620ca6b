//! CLI output formatting.
//!
//! Every function here returns display lines instead of printing, so the
//! exact text is unit tested. Thin `print_*` wrappers write to stdout.
//!
//! # Output Format
//!
//! ## Convert
//!
//! One outcome line per file, each followed by a running status line, then a
//! summary:
//!
//! ```text
//! Found 3 images
//! OK: beach.jpg
//! Processing: 1/3 (Errors: 0)
//! SKIP (format support unavailable): IMG_0042.heic
//! Processing: 2/3 (Errors: 0)
//! ERR: broken.png - Decode failed: broken.png: ...
//! Processing: 3/3 (Errors: 1)
//! Done. Processed: 1, Skipped: 1, Errors: 1
//! ```
//!
//! A cancelled run ends with `Stopped.` instead of `Done.`. An empty source
//! prints `No supported images found.`.
//!
//! ## Formats
//!
//! ```text
//! Supported input formats:
//!     jpg jpeg png tif tiff webp heic heif
//! HEIC/HEIF decoding: unavailable (files are skipped)
//! ```

use crate::imaging::CodecSupport;
use crate::process::ProcessEvent;
use crate::types::{BatchCounts, BatchResult, FileOutcome, OutcomeStatus, RunStatus};

// ============================================================================
// Convert output
// ============================================================================

/// Format a single progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::Started { total: 0 } => vec!["No supported images found.".to_string()],
        ProcessEvent::Started { total } => vec![format!(
            "Found {} image{}",
            total,
            if *total == 1 { "" } else { "s" }
        )],
        ProcessEvent::FileFinished {
            index,
            total,
            outcome,
            counts,
        } => vec![
            outcome_line(outcome),
            format!("Processing: {}/{} (Errors: {})", index, total, counts.errored),
        ],
        ProcessEvent::Finished { result } => vec![summary_line(result)],
    }
}

fn outcome_line(outcome: &FileOutcome) -> String {
    let detail = outcome.detail.as_deref().unwrap_or("unknown");
    match outcome.status {
        OutcomeStatus::Ok => format!("OK: {}", outcome.filename),
        OutcomeStatus::Skipped => format!("SKIP ({}): {}", detail, outcome.filename),
        OutcomeStatus::Error => format!("ERR: {} - {}", outcome.filename, detail),
    }
}

/// Final line of a run: `Done.` or `Stopped.` with the counts.
pub fn summary_line(result: &BatchResult) -> String {
    let BatchCounts {
        processed,
        skipped,
        errored,
        ..
    } = result.counts;
    let head = match result.status {
        RunStatus::Completed => "Done.",
        RunStatus::Stopped => "Stopped.",
    };
    format!("{head} Processed: {processed}, Skipped: {skipped}, Errors: {errored}")
}

/// Pretty JSON for `convert --json`.
pub fn format_result_json(result: &BatchResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}

// ============================================================================
// Formats output
// ============================================================================

/// Format the supported-extension list and optional codec status.
pub fn format_formats(extensions: &[&str], codecs: CodecSupport) -> Vec<String> {
    let heif = if codecs.heif {
        "available"
    } else {
        "unavailable (files are skipped)"
    };
    vec![
        "Supported input formats:".to_string(),
        format!("    {}", extensions.join(" ")),
        format!("HEIC/HEIF decoding: {heif}"),
    ]
}

pub fn print_formats(extensions: &[&str], codecs: CodecSupport) {
    for line in format_formats(extensions, codecs) {
        println!("{}", line);
    }
}
