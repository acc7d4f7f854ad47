//! Preview backend trait and shared error type.
//!
//! The [`PreviewBackend`] trait is the single seam between the file
//! processor and pixel work: given a (possibly downsampled) plane and an
//! output path, produce the annotated JPEG.
//!
//! The production implementation is
//! [`JpegBackend`](super::jpeg_backend::JpegBackend). Tests use the
//! recording `MockBackend` below.

use super::params::RenderParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Font error: {0}")]
    Font(String),
}

/// Trait for preview backends.
///
/// Must be `Sync`: one backend is shared by every worker in the batch pool.
pub trait PreviewBackend: Sync {
    /// Enhance, annotate, and encode one plane to `params.output`.
    fn render(&self, params: &RenderParams) -> Result<(), BackendError>;
}
