//! Parameter types for rendering.
//!
//! These structs describe *what* to draw, not *how*. They are the interface
//! between the file processor (which decides which planes to render and
//! where) and the [`backend`](super::backend) (which does the pixel work).
//!
//! ## Types
//!
//! - [`Quality`]: JPEG quality (1–100, default 75). Clamped on construction.
//! - [`ScaleBarSpec`]: One scale bar pass: color, thickness, margin.
//! - [`RenderParams`]: Plane, output path and quality for one preview.

use crate::types::Plane;
use image::Rgb;
use std::path::PathBuf;

/// Quality setting for JPEG encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    /// The JPEG encoder's own default.
    fn default() -> Self {
        Self(75)
    }
}

/// Bar length as a fraction of the image width, before rounding to a
/// preferred value.
pub const DEFAULT_LENGTH_FRACTION: f64 = 0.2;

/// One scale bar drawing pass.
///
/// Bars are anchored to the lower-right corner with a transparent interior.
/// Heights are fractions of the image height; the margin is a fraction of
/// the label font size, applied twice (outer border and inner padding).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleBarSpec {
    pub meters_per_pixel: f64,
    pub color: Rgb<u8>,
    pub height_fraction: f64,
    pub margin_fraction: f64,
    pub length_fraction: f64,
}

impl ScaleBarSpec {
    /// Thick black pass, drawn first.
    pub fn outline(meters_per_pixel: f64) -> Self {
        Self {
            meters_per_pixel,
            color: Rgb([0, 0, 0]),
            height_fraction: 0.009,
            margin_fraction: 0.3,
            length_fraction: DEFAULT_LENGTH_FRACTION,
        }
    }

    /// Thin white pass, nested inside the outline.
    pub fn inner(meters_per_pixel: f64) -> Self {
        Self {
            color: Rgb([255, 255, 255]),
            height_fraction: 0.005,
            ..Self::outline(meters_per_pixel)
        }
    }
}

/// Parameters for rendering one plane to a JPEG file.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams<'a> {
    /// Pixel spacing already reflects any downsampling.
    pub plane: &'a Plane,
    pub output: PathBuf,
    pub quality: Quality,
}
