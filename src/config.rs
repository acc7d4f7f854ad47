//! Run configuration.
//!
//! A [`RunConfig`] is built once from the command line and passed by
//! reference to the batch dispatcher and the file processor. There is no
//! configuration file; every option has a default:
//!
//! | Option | Default |
//! |---|---|
//! | `output_dir` | current working directory |
//! | `max_size` | 1250 px ([`DEFAULT_MAX_SIZE`]) |
//! | `num_procs` | all cores (values above the core count are clamped down) |
//! | `quality` | 75 ([`DEFAULT_QUALITY`]) |
//! | `font` | first sans-serif system font |

use crate::imaging::Quality;
use std::path::PathBuf;
use thiserror::Error;

/// Longest output edge, in pixels, before downsampling kicks in.
pub const DEFAULT_MAX_SIZE: u32 = 1250;

/// JPEG quality used when none is given.
pub const DEFAULT_QUALITY: u8 = 75;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Everything one batch run needs to know.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Existing directory previews are written into.
    pub output_dir: PathBuf,
    /// Planes whose longer edge exceeds this are shrunk to fit.
    pub max_size: u32,
    /// Maximum parallel workers. `None` uses every core.
    pub num_procs: Option<usize>,
    pub quality: Quality,
    /// Label font file. `None` searches the system fonts.
    pub font: Option<PathBuf>,
}

impl RunConfig {
    /// Defaults for everything but the output directory.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            max_size: DEFAULT_MAX_SIZE,
            num_procs: None,
            quality: Quality::new(DEFAULT_QUALITY),
            font: None,
        }
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_size == 0 {
            return Err(ConfigError::Validation(
                "max_size must be at least 1".into(),
            ));
        }
        if self.num_procs == Some(0) {
            return Err(ConfigError::Validation(
                "num_procs must be at least 1".into(),
            ));
        }
        if !(1..=100).contains(&self.quality.value()) {
            return Err(ConfigError::Validation("quality must be 1-100".into()));
        }
        Ok(())
    }
}

/// Resolve the effective thread count.
///
/// - `None` → use all available cores
/// - `Some(n)` → exactly `n` workers, even above the core count
pub fn effective_threads(num_procs: Option<usize>) -> usize {
    match num_procs {
        Some(n) => n.max(1),
        None => std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1),
    }
}
