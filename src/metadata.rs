//! Input metadata: loading an MRC file and resolving its physical pixel size.
//!
//! ## Pixel size
//!
//! MRC headers describe the physical extent of the unit cell (`cella`, in
//! ångström) and how many samples span it (`mx`, `my`). One pixel edge is
//!
//! ```text
//! pixel_size = cella.x / mx * 1e-10   (meters)
//! ```
//!
//! Pixels are assumed square. When the y spacing disagrees with x, a warning
//! is logged and the x spacing is used; the file is still processed.
//!
//! ## Failure policy
//!
//! [`read`] never fails: a missing path, a directory, or an unparsable
//! container all turn into a [`ReadOutcome::Skip`] with the reason logged.

use crate::imaging::mrc_parser::{self, MrcError, MrcHeader};
use crate::types::{RawImage, SkipReason};
use std::path::Path;
use tracing::{error, warn};

/// Header cell units (ångström) to meters.
pub const ANGSTROM_TO_METERS: f64 = 1e-10;

/// Relative tolerance when comparing x and y spacing.
const SPACING_RTOL: f64 = 1e-8;
/// Absolute tolerance, in ångström per pixel.
const SPACING_ATOL: f64 = 1e-8;

/// Result of reading one input path.
#[derive(Debug)]
pub enum ReadOutcome {
    Loaded(RawImage),
    Skip(SkipReason),
}

/// Per-axis pixel spacing in ångström, straight from the header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSpacing {
    pub x_angstrom: f64,
    pub y_angstrom: f64,
}

impl PixelSpacing {
    /// Derive spacing from `cella` and `mx`/`my`.
    ///
    /// The x spacing must be a positive finite number; it is the one the
    /// scale bar is built from. The y spacing is only compared against it.
    pub fn from_header(header: &MrcHeader) -> Result<Self, MrcError> {
        if header.mx <= 0 {
            return Err(MrcError::InvalidHeaderField {
                field: "mx",
                value: header.mx.to_string(),
            });
        }
        let x_angstrom = header.cella.x as f64 / header.mx as f64;
        if !x_angstrom.is_finite() || x_angstrom <= 0.0 {
            return Err(MrcError::InvalidHeaderField {
                field: "cella.x",
                value: header.cella.x.to_string(),
            });
        }
        let y_angstrom = header.cella.y as f64 / header.my as f64;
        Ok(Self {
            x_angstrom,
            y_angstrom,
        })
    }

    /// `isclose` semantics: `|x - y| <= atol + rtol * |y|`.
    pub fn is_isotropic(&self) -> bool {
        let (a, b) = (self.x_angstrom, self.y_angstrom);
        b.is_finite() && (a - b).abs() <= SPACING_ATOL + SPACING_RTOL * b.abs()
    }

    /// Edge length of one pixel in meters (x axis).
    pub fn meters(&self) -> f64 {
        self.x_angstrom * ANGSTROM_TO_METERS
    }
}

/// Load `path` and compute its pixel size, or explain why it is skipped.
pub fn read(path: &Path) -> ReadOutcome {
    if !path.exists() {
        warn!("{} was not found. Skipping.", path.display());
        return ReadOutcome::Skip(SkipReason::NotFound);
    }
    if !path.is_file() {
        warn!("{} is not a regular file. Skipping.", path.display());
        return ReadOutcome::Skip(SkipReason::NotRegularFile);
    }

    match load(path) {
        Ok(raw) => ReadOutcome::Loaded(raw),
        Err(e) => {
            error!(error = ?e, "Error occurred in reading {}: {e}. Skipping.", path.display());
            ReadOutcome::Skip(SkipReason::Unreadable(e))
        }
    }
}

fn load(path: &Path) -> Result<RawImage, MrcError> {
    let mrc = mrc_parser::read_mrc(path)?;
    let spacing = PixelSpacing::from_header(&mrc.header)?;
    if !spacing.is_isotropic() {
        warn!(
            x_angstrom = spacing.x_angstrom,
            y_angstrom = spacing.y_angstrom,
            "Pixel sizes in x and y are not equal in {}. Using pixel size in x.",
            path.display()
        );
    }
    Ok(RawImage {
        samples: mrc.samples,
        pixel_size_meters: spacing.meters(),
    })
}
