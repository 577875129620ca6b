//! Batch conversion driver.
//!
//! Takes a source directory and turns every discovered photo into a print
//! JPEG in the destination directory, one file at a time.
//!
//! ## Per-file pipeline
//!
//! ```text
//! decode ─► orient ─► select canvas ─► composite ─► encode ─► name ─► persist
//! (backend)  (EXIF)    (15×10/10×15)    (letterbox)  (JPEG)   (_10x15) (no-clobber)
//! ```
//!
//! Any failure in that chain becomes an `Error` outcome for that file and the
//! batch moves on. Output is encoded in memory and written through a temp
//! file in the destination, then renamed into place without overwriting, so
//! a failed file never leaves a partial JPEG behind.
//!
//! HEIC/HEIF files are `Skipped` with `"format support unavailable"` when
//! [`CodecSupport::heif`] is off.
//!
//! ## Run lifecycle
//!
//! ```text
//! Idle ─► Scanning ─► Running ─► Completed
//!                        │
//!                        ├─────► Stopped   (cancel requested between files)
//!            └───────────┴─────► Failed    (destination or traversal error)
//! ```
//!
//! [`BatchDriver::run`] executes on the caller's thread.
//! [`BatchDriver::start`] runs the same thing on a worker thread and streams
//! [`ProcessEvent`]s over a channel; the controller polls
//! [`is_running`](BatchDriver::is_running), calls
//! [`request_stop`](BatchDriver::request_stop), and collects the result with
//! [`wait`](BatchDriver::wait). One run at a time per driver.

use crate::config::FormatterConfig;
use crate::imaging::{
    Background, BackendError, CodecSupport, EncodeParams, GeometryError, ImageBackend,
    PixelCanvas, Quality, RustBackend, SourceImage, composite, is_heif,
};
use crate::naming::{MAX_PROBES, NamingError, probe_within};
use crate::scan::{self, ScanError};
use crate::types::{BatchCounts, BatchLog, BatchResult, FileOutcome, RunStatus};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Destination folder name used when none is given, created inside the source.
pub const DEFAULT_DEST_DIR: &str = "output_10x15_jpg";

/// Skip reason for HEIC/HEIF files without a decoder.
pub const FORMAT_UNAVAILABLE: &str = "format support unavailable";

/// Errors that prevent a run from starting or finishing.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("A batch is already running")]
    AlreadyRunning,
    #[error("The previous batch result has not been collected with wait()")]
    ResultPending,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Scan failed: {0}")]
    Scan(#[from] ScanError),
    #[error("Batch worker panicked")]
    WorkerPanicked,
}

/// Errors for a single file. Recorded in the outcome; the run continues.
#[derive(Error, Debug)]
pub enum FileError {
    #[error("{0}")]
    Decode(BackendError),
    #[error("{0}")]
    Encode(BackendError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Naming(#[from] NamingError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// What to convert and where.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchJob {
    pub source_dir: PathBuf,
    pub dest_dir: PathBuf,
    pub dpi: u32,
}

/// How to convert: everything that is the same for every file of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvertSettings {
    pub quality: Quality,
    pub background: Background,
    /// Carry EXIF and ICC from source to output.
    pub preserve_metadata: bool,
    pub codecs: CodecSupport,
    pub follow_links: bool,
}

impl ConvertSettings {
    /// Build settings from a validated config and the detected codecs.
    pub fn from_config(config: &FormatterConfig, codecs: CodecSupport) -> Self {
        Self {
            quality: Quality::new(config.output.quality),
            background: config.output.background,
            preserve_metadata: config.output.preserve_metadata,
            codecs,
            follow_links: config.scan.follow_links,
        }
    }
}

impl Default for ConvertSettings {
    fn default() -> Self {
        Self::from_config(&FormatterConfig::default(), CodecSupport::detect())
    }
}

/// Cooperative cancellation flag, shared between driver and controller.
///
/// Checked only between files; the file in flight always finishes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Scanning,
    Running,
    Completed,
    Stopped,
    Failed,
}

/// Progress events emitted during a run.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    /// Discovery finished.
    Started { total: usize },
    /// One file handled. `index` is 1-based.
    FileFinished {
        index: usize,
        total: usize,
        outcome: FileOutcome,
        counts: BatchCounts,
    },
    /// Run ended, normally or by cancellation.
    Finished { result: BatchResult },
}

struct Shared<B> {
    backend: B,
    settings: ConvertSettings,
    cancel: CancelToken,
    state: Mutex<RunState>,
    active: AtomicBool,
    /// Highest `_N` counter tried when naming an output.
    name_limit: u32,
}

/// Releases the single-run slot when a run ends, however it ends.
struct ActiveGuard<'a>(&'a AtomicBool);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Runs batch conversions with a given backend and settings.
pub struct BatchDriver<B> {
    shared: Arc<Shared<B>>,
    worker: Mutex<Option<JoinHandle<Result<BatchResult, RunError>>>>,
}

impl BatchDriver<RustBackend> {
    /// Driver on the production backend.
    pub fn with_settings(settings: ConvertSettings) -> Self {
        Self::new(RustBackend::new(), settings)
    }
}

impl<B: ImageBackend + 'static> BatchDriver<B> {
    pub fn new(backend: B, settings: ConvertSettings) -> Self {
        Self {
            shared: Arc::new(Shared {
                backend,
                settings,
                cancel: CancelToken::new(),
                state: Mutex::new(RunState::Idle),
                active: AtomicBool::new(false),
                name_limit: MAX_PROBES,
            }),
            worker: Mutex::new(None),
        }
    }

    /// Run a batch on the current thread.
    ///
    /// `progress` is called synchronously for every event.
    pub fn run(
        &self,
        job: &BatchJob,
        mut progress: impl FnMut(ProcessEvent),
    ) -> Result<BatchResult, RunError> {
        validate_job(job)?;
        self.shared.claim()?;
        let _guard = ActiveGuard(&self.shared.active);
        self.shared.execute(job, &mut progress)
    }

    /// Run a batch on a background worker thread.
    ///
    /// Validation and the single-run check happen before this returns. The
    /// result of a started run must be collected with [`wait`](Self::wait)
    /// before the next `start`; until then `start` fails with
    /// [`RunError::ResultPending`] rather than discard it.
    pub fn start(
        &self,
        job: BatchJob,
        events: Option<Sender<ProcessEvent>>,
    ) -> Result<(), RunError> {
        validate_job(&job)?;
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if worker.is_some() {
            return Err(if self.is_running() {
                RunError::AlreadyRunning
            } else {
                RunError::ResultPending
            });
        }
        self.shared.claim()?;

        let shared = Arc::clone(&self.shared);
        let handle = std::thread::spawn(move || {
            let _guard = ActiveGuard(&shared.active);
            shared.execute(&job, &mut |event| {
                if let Some(ref tx) = events {
                    tx.send(event).ok();
                }
            })
        });
        *worker = Some(handle);
        Ok(())
    }

    /// Lower the highest `_N` counter tried per output name.
    #[cfg(test)]
    fn with_name_limit(mut self, max: u32) -> Self {
        if let Some(shared) = Arc::get_mut(&mut self.shared) {
            shared.name_limit = max;
        }
        self
    }

    /// Ask the current run to stop before its next file.
    pub fn request_stop(&self) {
        self.shared.cancel.cancel();
    }

    pub fn is_running(&self) -> bool {
        self.shared.active.load(Ordering::SeqCst)
    }

    /// Block until the worker started by [`start`](Self::start) finishes.
    ///
    /// `None` if no worker was started since the last `wait`.
    pub fn wait(&self) -> Option<Result<BatchResult, RunError>> {
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()?;
        Some(handle.join().unwrap_or(Err(RunError::WorkerPanicked)))
    }

    pub fn state(&self) -> RunState {
        self.shared.state()
    }

    /// The token [`request_stop`](Self::request_stop) sets.
    pub fn cancel_token(&self) -> CancelToken {
        self.shared.cancel.clone()
    }
}

fn validate_job(job: &BatchJob) -> Result<(), RunError> {
    if job.dpi == 0 {
        return Err(RunError::InvalidInput("DPI must be a positive integer".into()));
    }
    if !job.source_dir.is_dir() {
        return Err(RunError::InvalidInput(format!(
            "source is not a directory: {}",
            job.source_dir.display()
        )));
    }
    Ok(())
}

impl<B: ImageBackend> Shared<B> {
    /// Take the single-run slot and reset the cancel flag for the new run.
    fn claim(&self) -> Result<(), RunError> {
        self.active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| RunError::AlreadyRunning)?;
        self.cancel.reset();
        Ok(())
    }

    fn state(&self) -> RunState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: RunState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn execute(
        &self,
        job: &BatchJob,
        progress: &mut dyn FnMut(ProcessEvent),
    ) -> Result<BatchResult, RunError> {
        self.set_state(RunState::Scanning);
        let result = self.scan_and_convert(job, progress);
        self.set_state(match &result {
            Ok(r) if r.status == RunStatus::Stopped => RunState::Stopped,
            Ok(_) => RunState::Completed,
            Err(e) => {
                warn!("batch failed: {e}");
                RunState::Failed
            }
        });
        result
    }

    fn scan_and_convert(
        &self,
        job: &BatchJob,
        progress: &mut dyn FnMut(ProcessEvent),
    ) -> Result<BatchResult, RunError> {
        fs::create_dir_all(&job.dest_dir)?;
        let files = scan::discover_images(
            &job.source_dir,
            Some(&job.dest_dir),
            self.settings.follow_links,
        )?;
        let total = files.len();

        info!(
            total,
            dpi = job.dpi,
            source = %job.source_dir.display(),
            dest = %job.dest_dir.display(),
            "starting batch"
        );
        progress(ProcessEvent::Started { total });

        let mut log = BatchLog::new(total);
        let mut status = RunStatus::Completed;

        if total == 0 {
            info!("no images found in {}", job.source_dir.display());
        } else {
            self.set_state(RunState::Running);
        }

        for (i, path) in files.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!(handled = i, total, "stop requested");
                status = RunStatus::Stopped;
                break;
            }

            let outcome = self.convert_one(path, job);
            log.push(outcome.clone());
            progress(ProcessEvent::FileFinished {
                index: i + 1,
                total,
                outcome,
                counts: log.counts(),
            });
        }

        let result = log.finish(status);
        info!(
            processed = result.counts.processed,
            skipped = result.counts.skipped,
            errored = result.counts.errored,
            status = ?result.status,
            "batch finished"
        );
        progress(ProcessEvent::Finished {
            result: result.clone(),
        });
        Ok(result)
    }

    fn convert_one(&self, path: &Path, job: &BatchJob) -> FileOutcome {
        if is_heif(path) && !self.settings.codecs.heif {
            info!(file = %path.display(), "skipped: {FORMAT_UNAVAILABLE}");
            return FileOutcome::skipped(path.to_path_buf(), FORMAT_UNAVAILABLE);
        }

        match self.convert_file(path, job) {
            Ok(output) => {
                info!(file = %path.display(), output = %output.display(), "converted");
                FileOutcome::ok(path.to_path_buf(), output)
            }
            Err(e) => {
                warn!(file = %path.display(), "conversion failed: {e}");
                FileOutcome::error(path.to_path_buf(), e.to_string())
            }
        }
    }

    fn convert_file(&self, path: &Path, job: &BatchJob) -> Result<PathBuf, FileError> {
        let SourceImage {
            pixels,
            exif,
            icc_profile,
            ..
        } = self
            .backend
            .decode(path)
            .map_err(FileError::Decode)?
            .into_upright();

        let canvas = PixelCanvas::for_image(pixels.width(), pixels.height(), job.dpi)?;
        debug!(
            file = %path.display(),
            w = pixels.width(),
            h = pixels.height(),
            canvas_w = canvas.width,
            canvas_h = canvas.height,
            "canvas selected"
        );

        let composited = composite(&pixels, canvas, self.settings.background.rgb());
        drop(pixels);

        let preserve = self.settings.preserve_metadata;
        let params = EncodeParams {
            quality: self.settings.quality,
            dpi: job.dpi,
            exif: exif.filter(|_| preserve),
            icc_profile: icc_profile.filter(|_| preserve),
        };
        let bytes = self
            .backend
            .encode_jpeg(&composited, &params)
            .map_err(FileError::Encode)?;

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let target = probe_within(&stem, &job.dest_dir, self.name_limit)?;
        write_no_clobber(&job.dest_dir, &target, &bytes)?;
        Ok(target)
    }
}

/// Write `bytes` to `target` via a temp file in `dir`.
///
/// The rename fails instead of replacing a file that appeared at `target`
/// since it was named. The temp file is removed on every error path.
fn write_no_clobber(dir: &Path, target: &Path, bytes: &[u8]) -> Result<(), FileError> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist_noclobber(target).map_err(|e| e.error)?;
    Ok(())
}
