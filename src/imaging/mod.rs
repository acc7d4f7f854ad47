//! Image processing: MRC decoding, downsampling, contrast, scale bars, JPEG.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Read MRC** | custom parser (MRC2014 header + data block) |
//! | **Downsample** | `image::imageops::resize` with Lanczos3 |
//! | **Contrast** | CLAHE |
//! | **Scale bar** | `imageproc` + `ab_glyph`, fonts via `fontdb` |
//! | **Encode** | `image` JPEG encoder |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for shrink and bar-length math (unit testable)
//! - **Parameters**: Data structures describing a render
//! - **Backend**: [`PreviewBackend`] trait + [`JpegBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod contrast;
pub mod jpeg_backend;
pub mod mrc_parser;
pub mod operations;
mod params;
pub mod scalebar;

pub use backend::{BackendError, PreviewBackend};
pub use calculations::{
    BarLength, fit_bar_length, reduced_dimensions, scale_bar_length, shrink_factor,
};
pub use jpeg_backend::JpegBackend;
pub use operations::{create_preview, plan_shrink, reduce};
pub use params::{DEFAULT_LENGTH_FRACTION, Quality, RenderParams, ScaleBarSpec};
pub use scalebar::LabelFont;
