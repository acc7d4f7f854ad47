//! # emscalebar
//!
//! Turns MRC electron-microscopy images into JPEG previews: contrast
//! enhanced, shrunk to a manageable size, and stamped with a scale bar that
//! shows a real physical length.
//!
//! # Pipeline
//!
//! Every input path runs independently on a worker pool:
//!
//! ```text
//! 1. Read      file.mrc      →  samples + pixel size (meters)
//! 2. Shrink    plane         →  plane ≤ max_size px, pixel size scaled
//! 3. Render    plane         →  CLAHE + outline/inner scale bar
//! 4. Encode    RGB image     →  <name>.jpg   or   <name>_section<i>.jpg
//! ```
//!
//! A 2D image produces one preview. A 3D stack produces one preview per
//! z-section. Volume stacks (rank 4) are reported as unsupported.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`batch`] | Validates the output directory, runs every path on a rayon pool, collects a report |
//! | [`process`] | One path → previews: read, dispatch on shape, shrink, render each plane |
//! | [`metadata`] | Loads an MRC file and resolves its pixel size from the header |
//! | [`imaging`] | MRC parsing, resampling, CLAHE, scale bar drawing, JPEG encoding |
//! | [`naming`] | Output filename convention |
//! | [`config`] | Run configuration and worker count resolution |
//! | [`types`] | Planes, stacks, and per-path outcomes shared between stages |
//! | [`output`] | CLI output formatting: progress lines and the final summary |
//!
//! # Design Decisions
//!
//! ## One render per plane pixel
//!
//! Previews are rendered at exactly the (possibly shrunk) plane resolution,
//! so a 4096 px micrograph with the default `max_size` gives a 1250 px JPEG.
//! The 300 dpi figure resolution is carried as JPEG density metadata only.
//!
//! ## Failures stay local
//!
//! Only an unusable output directory stops a run, and it does so before any
//! input is read. Everything else, from a missing input to a panic in the
//! encoder, is captured per path in the [`batch::BatchReport`].
//!
//! ## Output name collisions
//!
//! The output name is derived from the input's file name alone. Two inputs
//! with the same file name in different directories write the same preview;
//! the last one to finish wins.

pub mod batch;
pub mod config;
pub mod imaging;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod process;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
