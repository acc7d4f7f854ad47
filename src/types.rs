//! Shared types passed between the reader, the file processor and the
//! batch dispatcher.
//!
//! Sample data flows through three shapes:
//!
//! ```text
//! Samples (native rank)  →  PlaneSource (Single | Stack)  →  Plane (one 2D grid)
//! ```
//!
//! The rank check happens exactly once, in [`PlaneSource::resolve`]. Everything
//! downstream works on [`Plane`]s.

use crate::imaging::mrc_parser::MrcError;
use std::fmt;
use std::path::PathBuf;

/// Sample grid as read from the container, in its native shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Samples {
    /// Dimensions, slowest-varying axis first (`[ny, nx]`, `[nz, ny, nx]`, ...).
    pub shape: Vec<usize>,
    /// Row-major samples, x fastest.
    pub data: Vec<f32>,
}

impl Samples {
    pub fn rank(&self) -> usize {
        self.shape.len()
    }
}

/// Image data plus the physical edge length of one pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct RawImage {
    pub samples: Samples,
    /// Always positive and finite.
    pub pixel_size_meters: f64,
}

/// A single 2D grid of samples with its own pixel spacing.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub width: u32,
    pub height: u32,
    /// `height` rows of `width` samples.
    pub data: Vec<f32>,
    pub pixel_size_meters: f64,
}

impl Plane {
    pub fn new(width: u32, height: u32, data: Vec<f32>, pixel_size_meters: f64) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize);
        Self {
            width,
            height,
            data,
            pixel_size_meters,
        }
    }

    /// Sample at column `x`, row `y`.
    pub fn sample(&self, x: u32, y: u32) -> f32 {
        self.data[y as usize * self.width as usize + x as usize]
    }
}

/// A rank-3 volume kept as one contiguous buffer; sections are copied out
/// one at a time so only a single extra plane is alive during processing.
#[derive(Debug, Clone, PartialEq)]
pub struct Stack {
    width: u32,
    height: u32,
    depth: usize,
    data: Vec<f32>,
    pixel_size_meters: f64,
}

impl Stack {
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Copy out z-section `index` as a standalone plane.
    pub fn section(&self, index: usize) -> Option<Plane> {
        if index >= self.depth {
            return None;
        }
        let len = self.width as usize * self.height as usize;
        let start = index * len;
        Some(Plane::new(
            self.width,
            self.height,
            self.data[start..start + len].to_vec(),
            self.pixel_size_meters,
        ))
    }
}

/// The planes an input file expands into, resolved once after reading.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaneSource {
    Single(Plane),
    Stack(Stack),
}

/// Array rank the processor has no output convention for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedShape {
    pub shape: Vec<usize>,
}

impl fmt::Display for UnsupportedShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unsupported array rank {} (shape {:?}); only 2D images and 3D stacks are handled",
            self.shape.len(),
            self.shape
        )
    }
}

impl PlaneSource {
    /// Branch on the native rank: 2 → one plane, 3 → a stack of sections.
    pub fn resolve(raw: RawImage) -> Result<Self, UnsupportedShape> {
        let RawImage {
            samples,
            pixel_size_meters,
        } = raw;
        let unsupported = || UnsupportedShape {
            shape: samples.shape.clone(),
        };

        match *samples.shape.as_slice() {
            [height, width] => {
                let (width, height) = plane_dims(width, height).ok_or_else(unsupported)?;
                Ok(PlaneSource::Single(Plane::new(
                    width,
                    height,
                    samples.data,
                    pixel_size_meters,
                )))
            }
            [depth, height, width] => {
                let (width, height) = plane_dims(width, height).ok_or_else(unsupported)?;
                Ok(PlaneSource::Stack(Stack {
                    width,
                    height,
                    depth,
                    data: samples.data,
                    pixel_size_meters,
                }))
            }
            _ => Err(unsupported()),
        }
    }

    /// `(width, height)` shared by every plane of this source.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            PlaneSource::Single(plane) => (plane.width, plane.height),
            PlaneSource::Stack(stack) => (stack.width, stack.height),
        }
    }
}

fn plane_dims(width: usize, height: usize) -> Option<(u32, u32)> {
    Some((u32::try_from(width).ok()?, u32::try_from(height).ok()?))
}

/// Why an input produced no work at all.
#[derive(Debug)]
pub enum SkipReason {
    NotFound,
    NotRegularFile,
    Unreadable(MrcError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotFound => write!(f, "not found"),
            SkipReason::NotRegularFile => write!(f, "not a regular file"),
            SkipReason::Unreadable(e) => write!(f, "unreadable: {e}"),
        }
    }
}

/// A plane whose resample/render/encode step failed.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneFailure {
    /// `None` for a 2D input.
    pub section: Option<usize>,
    pub output: PathBuf,
    pub message: String,
}

/// Outcome of processing one input path. Never crosses the batch boundary
/// as an error.
#[derive(Debug)]
pub enum JobResult {
    Completed {
        outputs: Vec<PathBuf>,
        failures: Vec<PlaneFailure>,
    },
    Skipped(SkipReason),
    Unsupported(UnsupportedShape),
    /// Processing panicked; the message is the panic payload.
    Aborted(String),
}

impl JobResult {
    pub fn outputs(&self) -> &[PathBuf] {
        match self {
            JobResult::Completed { outputs, .. } => outputs,
            _ => &[],
        }
    }
}
