//! Batch dispatch: validate the output directory, then process every input
//! path on a dedicated worker pool.
//!
//! One task per input path. Sections of a stack stay on the task's thread.
//! A pool is built for each run and dropped when the run returns; the global
//! rayon pool is never touched.
//!
//! Nothing after setup aborts the batch. Skips, unsupported shapes, render
//! failures, and even panics inside a task are captured per path in the
//! returned [`BatchReport`].

use crate::config::{ConfigError, RunConfig, effective_threads};
use crate::imaging::{JpegBackend, LabelFont, PreviewBackend};
use crate::process::{ProcessEvent, process_file};
use crate::types::JobResult;
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("{} was not found. Exiting.", .0.display())]
    OutputDirNotFound(PathBuf),
    #[error("{} is not a directory. Exiting.", .0.display())]
    OutputDirNotADirectory(PathBuf),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Outcome of every input path, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub results: Vec<(PathBuf, JobResult)>,
}

impl BatchReport {
    pub fn files(&self) -> usize {
        self.results.len()
    }

    /// Every preview written, in input order.
    pub fn outputs(&self) -> Vec<&Path> {
        self.results
            .iter()
            .flat_map(|(_, r)| r.outputs().iter().map(PathBuf::as_path))
            .collect()
    }

    pub fn skipped(&self) -> usize {
        self.count(|r| matches!(r, JobResult::Skipped(_)))
    }

    pub fn unsupported(&self) -> usize {
        self.count(|r| matches!(r, JobResult::Unsupported(_)))
    }

    pub fn aborted(&self) -> usize {
        self.count(|r| matches!(r, JobResult::Aborted(_)))
    }

    /// Planes whose render failed, across all files.
    pub fn failed_planes(&self) -> usize {
        self.results
            .iter()
            .map(|(_, r)| match r {
                JobResult::Completed { failures, .. } => failures.len(),
                _ => 0,
            })
            .sum()
    }

    fn count(&self, pred: impl Fn(&JobResult) -> bool) -> usize {
        self.results.iter().filter(|(_, r)| pred(r)).count()
    }
}

/// The output directory must already exist; it is never created.
pub fn validate_output_dir(dir: &Path) -> Result<(), BatchError> {
    if !dir.exists() {
        return Err(BatchError::OutputDirNotFound(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(BatchError::OutputDirNotADirectory(dir.to_path_buf()));
    }
    Ok(())
}

/// Process `paths` with the JPEG backend.
///
/// Progress events go to `events` when given; the sender is dropped before
/// this returns, so a receiver loop on the other end terminates.
pub fn run(
    paths: &[PathBuf],
    config: &RunConfig,
    events: Option<Sender<ProcessEvent>>,
) -> Result<BatchReport, BatchError> {
    config.validate()?;
    validate_output_dir(&config.output_dir)?;

    let backend = JpegBackend::new(load_label_font(config.font.as_deref()));
    run_with_backend(&backend, paths, config, events)
}

/// Process `paths` using a specific backend (allows testing with mock).
pub fn run_with_backend(
    backend: &impl PreviewBackend,
    paths: &[PathBuf],
    config: &RunConfig,
    events: Option<Sender<ProcessEvent>>,
) -> Result<BatchReport, BatchError> {
    validate_output_dir(&config.output_dir)?;

    let threads = effective_threads(config.num_procs);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()?;
    info!(threads, files = paths.len(), "Processing");

    let results: Vec<JobResult> = pool.install(|| {
        paths
            .par_iter()
            .map_with(events, |tx, path| {
                isolate(path, || process_file(backend, path, config, tx.as_ref()))
            })
            .collect()
    });

    Ok(BatchReport {
        results: paths.iter().cloned().zip(results).collect(),
    })
}

/// Run one task, turning a panic into [`JobResult::Aborted`].
fn isolate(path: &Path, task: impl FnOnce() -> JobResult) -> JobResult {
    match panic::catch_unwind(AssertUnwindSafe(task)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!("Processing {} aborted: {message}", path.display());
            JobResult::Aborted(message)
        }
    }
}

/// Resolve the label font: an explicit file first, then the system fonts.
///
/// Returns `None` (with a single warning) when nothing loads; bars are then
/// drawn without captions.
pub fn load_label_font(explicit: Option<&Path>) -> Option<LabelFont> {
    if let Some(path) = explicit {
        match LabelFont::from_file(path) {
            Ok(font) => return Some(font),
            Err(e) => warn!(
                "Could not load font {}: {e}. Falling back to system fonts.",
                path.display()
            ),
        }
    }
    let font = LabelFont::system_sans_serif();
    if font.is_none() {
        warn!("No usable font found. Scale bars are drawn without labels.");
    }
    font
}
