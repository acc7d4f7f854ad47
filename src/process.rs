//! Per-file processing: one input path to one or more JPEG previews.
//!
//! ## Flow
//!
//! ```text
//! read ──skip──→ Skipped
//!   │
//!   ▼
//! resolve shape ──other rank──→ Unsupported
//!   │
//!   ├─ 2D    → <name>.jpg
//!   └─ stack → <name>_section0.jpg, <name>_section1.jpg, ...
//! ```
//!
//! The shrink factor is computed once per file from the plane dimensions, so
//! every section of a stack is reduced identically. Sections are rendered in
//! order on the calling thread; a failing section is logged and recorded, and
//! the remaining sections still run.

use crate::config::RunConfig;
use crate::imaging::{PreviewBackend, create_preview, plan_shrink};
use crate::metadata::{self, ReadOutcome};
use crate::naming::output_path;
use crate::types::{JobResult, Plane, PlaneFailure, PlaneSource};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use tracing::{debug, error};

/// Progress event emitted while processing.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    /// A preview is about to be rendered to `output`.
    Creating { output: PathBuf },
}

/// Turn one input path into previews under `config.output_dir`.
///
/// Never fails: every outcome, including skips and per-section render
/// failures, is reported in the returned [`JobResult`].
pub fn process_file(
    backend: &impl PreviewBackend,
    path: &Path,
    config: &RunConfig,
    events: Option<&Sender<ProcessEvent>>,
) -> JobResult {
    let raw = match metadata::read(path) {
        ReadOutcome::Loaded(raw) => raw,
        ReadOutcome::Skip(reason) => return JobResult::Skipped(reason),
    };

    let source = match PlaneSource::resolve(raw) {
        Ok(source) => source,
        Err(unsupported) => {
            error!(
                shape = ?unsupported.shape,
                "Cannot process {}: {unsupported}",
                path.display()
            );
            return JobResult::Unsupported(unsupported);
        }
    };

    let (width, height) = source.dimensions();
    let factor = plan_shrink(width, height, config.max_size);

    let mut renderer = SectionRenderer {
        backend,
        input: path,
        config,
        events,
        factor,
        outputs: Vec::new(),
        failures: Vec::new(),
    };

    match source {
        PlaneSource::Single(plane) => renderer.render(plane, None),
        PlaneSource::Stack(stack) => {
            debug!(depth = stack.depth(), "Processing stack {}", path.display());
            for index in 0..stack.depth() {
                if let Some(plane) = stack.section(index) {
                    renderer.render(plane, Some(index));
                }
            }
        }
    }

    JobResult::Completed {
        outputs: renderer.outputs,
        failures: renderer.failures,
    }
}

/// Collects outcomes while the planes of one file are rendered.
struct SectionRenderer<'a, B> {
    backend: &'a B,
    input: &'a Path,
    config: &'a RunConfig,
    events: Option<&'a Sender<ProcessEvent>>,
    factor: f64,
    outputs: Vec<PathBuf>,
    failures: Vec<PlaneFailure>,
}

impl<B: PreviewBackend> SectionRenderer<'_, B> {
    fn render(&mut self, plane: Plane, section: Option<usize>) {
        let output = output_path(&self.config.output_dir, self.input, section);
        if let Some(tx) = self.events {
            tx.send(ProcessEvent::Creating {
                output: output.clone(),
            })
            .ok();
        }

        match create_preview(self.backend, plane, &output, self.factor, self.config.quality) {
            Ok(()) => self.outputs.push(output),
            Err(e) => {
                error!(
                    error = ?e,
                    section,
                    "Failed to create {}: {e}",
                    output.display()
                );
                self.failures.push(PlaneFailure {
                    section,
                    output,
                    message: e.to_string(),
                });
            }
        }
    }
}
