//! CLI output formatting.
//!
//! All formatters are pure functions returning lines; the binary prints
//! them. Diagnostics (skips, warnings, failures) go through `tracing` to
//! stderr, while this module covers what lands on stdout.
//!
//! # Output Format
//!
//! ## Progress
//!
//! ```text
//! creating jpg image out/grid.mrc.jpg
//! creating jpg image out/tilt.mrcs_section0.jpg
//! ```
//!
//! ## Summary
//!
//! ```text
//! missing.mrc: skipped (not found)
//! vol.mrc: unsupported (unsupported array rank 4 ...)
//! tilt.mrcs: section 1 failed (Processing failed: ...)
//! 3 files, 2 images written, 1 skipped, 1 unsupported, 1 failed
//! ```

use crate::batch::BatchReport;
use crate::process::ProcessEvent;
use crate::types::JobResult;
use std::path::Path;

/// Format a single progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::Creating { output } => {
            vec![format!("creating jpg image {}", output.display())]
        }
    }
}

/// One line per input that did not fully succeed, then a totals line.
pub fn format_summary(report: &BatchReport) -> Vec<String> {
    let mut lines = Vec::new();

    for (path, result) in &report.results {
        let name = display_name(path);
        match result {
            JobResult::Completed { failures, .. } => {
                for failure in failures {
                    let what = match failure.section {
                        Some(i) => format!("section {i}"),
                        None => "image".to_string(),
                    };
                    lines.push(format!("{name}: {what} failed ({})", failure.message));
                }
            }
            JobResult::Skipped(reason) => lines.push(format!("{name}: skipped ({reason})")),
            JobResult::Unsupported(shape) => {
                lines.push(format!("{name}: unsupported ({shape})"))
            }
            JobResult::Aborted(message) => lines.push(format!("{name}: aborted ({message})")),
        }
    }

    let mut totals = vec![
        plural(report.files(), "file", "files"),
        format!(
            "{} written",
            plural(report.outputs().len(), "image", "images")
        ),
    ];
    for (count, label) in [
        (report.skipped(), "skipped"),
        (report.unsupported(), "unsupported"),
        (report.failed_planes(), "failed"),
        (report.aborted(), "aborted"),
    ] {
        if count > 0 {
            totals.push(format!("{count} {label}"));
        }
    }
    lines.push(totals.join(", "));
    lines
}

/// Print the summary to stdout.
pub fn print_summary(report: &BatchReport) {
    for line in format_summary(report) {
        println!("{}", line);
    }
}

fn display_name(path: &Path) -> String {
    path.display().to_string()
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}
