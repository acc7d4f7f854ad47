//! Pure calculation functions for downsampling and scale bar sizing.
//!
//! All functions here are pure and testable without any I/O or images.

/// Ratio by which to shrink a plane so its longer edge fits `max_size`.
///
/// Returns exactly `1.0` when the plane already fits.
///
/// # Examples
/// ```
/// # use emscalebar::imaging::shrink_factor;
/// assert_eq!(shrink_factor(2500, 2500, 1250), 2.0);
/// assert_eq!(shrink_factor(800, 600, 1250), 1.0);
/// ```
pub fn shrink_factor(width: u32, height: u32, max_size: u32) -> f64 {
    let longest = width.max(height);
    if longest > max_size {
        longest as f64 / max_size as f64
    } else {
        1.0
    }
}

/// Dimensions after shrinking by `factor`: `floor(w / f) x floor(h / f)`,
/// never below one pixel.
///
/// # Returns
/// * `(width, height)`: width first, matching the resize target convention
pub fn reduced_dimensions(width: u32, height: u32, factor: f64) -> (u32, u32) {
    let shrink = |n: u32| ((n as f64 / factor).floor() as u32).max(1);
    (shrink(width), shrink(height))
}

/// SI length units a scale bar label may use, largest first.
const LENGTH_UNITS: &[(&str, f64)] = &[
    ("km", 1e3),
    ("m", 1.0),
    ("cm", 1e-2),
    ("mm", 1e-3),
    ("µm", 1e-6),
    ("nm", 1e-9),
    ("pm", 1e-12),
];

/// Bar lengths considered "round" in any unit.
const PREFERRED_VALUES: &[f64] = &[
    1.0, 2.0, 5.0, 10.0, 15.0, 20.0, 25.0, 50.0, 75.0, 100.0, 125.0, 150.0, 200.0, 500.0, 750.0,
];

/// Slack for float noise when comparing against unit and value boundaries.
const EPSILON: f64 = 1e-9;

/// A scale bar's physical length, expressed in a display unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarLength {
    /// Numeric value in `unit`, one of the preferred round values.
    pub value: f64,
    pub unit: &'static str,
    /// The same length in meters.
    pub meters: f64,
}

impl BarLength {
    /// Caption text, e.g. `"50 nm"`.
    pub fn label(&self) -> String {
        format!("{} {}", self.value, self.unit)
    }

    /// Length in pixels at `meters_per_pixel`.
    pub fn pixels(&self, meters_per_pixel: f64) -> u32 {
        ((self.meters / meters_per_pixel).round() as u32).max(1)
    }
}

/// Pick a round bar length close to `length_fraction` of the image width.
///
/// The unit is the largest one in which the target length is at least 1; the
/// value is the largest preferred value not exceeding the target.
///
/// # Examples
/// ```
/// # use emscalebar::imaging::scale_bar_length;
/// // 1250 px at 0.2 nm/px: 20% of the width is 50 nm
/// let bar = scale_bar_length(2e-10, 1250, 0.2);
/// assert_eq!(bar.label(), "50 nm");
/// assert_eq!(bar.pixels(2e-10), 250);
/// ```
pub fn scale_bar_length(meters_per_pixel: f64, image_width: u32, length_fraction: f64) -> BarLength {
    let target = image_width as f64 * length_fraction * meters_per_pixel;

    let (unit, factor) = LENGTH_UNITS
        .iter()
        .copied()
        .find(|&(_, factor)| target / factor >= 1.0 - EPSILON)
        .unwrap_or(LENGTH_UNITS[LENGTH_UNITS.len() - 1]);

    let in_unit = target / factor;
    let value = PREFERRED_VALUES
        .iter()
        .rev()
        .copied()
        .find(|&v| v <= in_unit * (1.0 + EPSILON))
        .unwrap_or(PREFERRED_VALUES[0]);

    BarLength {
        value,
        unit,
        meters: value * factor,
    }
}

/// Longest round length spanning at most `max_pixels`, labelled the same
/// way as [`scale_bar_length`].
///
/// `None` when even one unit of the smallest prefix is wider than
/// `max_pixels`.
pub fn fit_bar_length(meters_per_pixel: f64, max_pixels: u32) -> Option<BarLength> {
    let bar = scale_bar_length(meters_per_pixel, max_pixels, 1.0);
    (bar.pixels(meters_per_pixel) <= max_pixels).then_some(bar)
}
