//! Report types shared by the batch driver, the CLI, and JSON output.
//!
//! A run accumulates [`FileOutcome`]s in a [`BatchLog`] and freezes it into a
//! [`BatchResult`] when it ends. All types serialize with serde so the CLI
//! can emit the final report as JSON.

use serde::Serialize;
use std::path::PathBuf;

/// Running totals for a batch.
///
/// `processed + skipped + errored` is the number of files handled so far and
/// never exceeds `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchCounts {
    pub processed: usize,
    pub skipped: usize,
    pub errored: usize,
    pub total: usize,
}

impl BatchCounts {
    pub fn handled(&self) -> usize {
        self.processed + self.skipped + self.errored
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Ok,
    Skipped,
    Error,
}

/// What happened to one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    /// Source file name, for display.
    pub filename: String,
    pub source: PathBuf,
    pub status: OutcomeStatus,
    /// Skip reason or error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Written file, for `Ok` outcomes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl FileOutcome {
    pub fn ok(source: PathBuf, output: PathBuf) -> Self {
        Self::new(source, OutcomeStatus::Ok, None, Some(output))
    }

    pub fn skipped(source: PathBuf, reason: impl Into<String>) -> Self {
        Self::new(source, OutcomeStatus::Skipped, Some(reason.into()), None)
    }

    pub fn error(source: PathBuf, message: impl Into<String>) -> Self {
        Self::new(source, OutcomeStatus::Error, Some(message.into()), None)
    }

    fn new(
        source: PathBuf,
        status: OutcomeStatus,
        detail: Option<String>,
        output: Option<PathBuf>,
    ) -> Self {
        let filename = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.display().to_string());
        Self {
            filename,
            source,
            status,
            detail,
            output,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Every discovered file was handled.
    Completed,
    /// Cancelled between files.
    Stopped,
}

/// Terminal report of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub status: RunStatus,
    pub counts: BatchCounts,
    /// In processing order.
    pub outcomes: Vec<FileOutcome>,
}

/// Append-only outcome record for a run in progress.
#[derive(Debug, Default)]
pub struct BatchLog {
    counts: BatchCounts,
    outcomes: Vec<FileOutcome>,
}

impl BatchLog {
    pub fn new(total: usize) -> Self {
        Self {
            counts: BatchCounts {
                total,
                ..Default::default()
            },
            outcomes: Vec::with_capacity(total),
        }
    }

    /// Record one outcome and update the counters.
    pub fn push(&mut self, outcome: FileOutcome) {
        match outcome.status {
            OutcomeStatus::Ok => self.counts.processed += 1,
            OutcomeStatus::Skipped => self.counts.skipped += 1,
            OutcomeStatus::Error => self.counts.errored += 1,
        }
        self.outcomes.push(outcome);
    }

    pub fn counts(&self) -> BatchCounts {
        self.counts
    }

    pub fn finish(self, status: RunStatus) -> BatchResult {
        BatchResult {
            status,
            counts: self.counts,
            outcomes: self.outcomes,
        }
    }
}
