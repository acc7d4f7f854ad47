//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take a plane and configuration, compute parameters, and call the
//! backend.

use super::backend::{BackendError, PreviewBackend};
use super::calculations::{reduced_dimensions, shrink_factor};
use super::contrast::min_max;
use super::params::{Quality, RenderParams};
use crate::types::Plane;
use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma};
use std::path::Path;
use tracing::debug;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Downsample `plane` by `factor` with a Lanczos3 filter.
///
/// A factor of exactly `1.0` returns the plane untouched. Otherwise the
/// result is `floor(w / f) x floor(h / f)` and its pixel size is multiplied
/// by `factor`, so the physical field of view is preserved.
pub fn reduce(plane: Plane, factor: f64) -> Result<Plane> {
    if factor == 1.0 {
        return Ok(plane);
    }
    if !factor.is_finite() || factor <= 0.0 {
        return Err(BackendError::ProcessingFailed(format!(
            "invalid shrink factor {factor}"
        )));
    }

    let (width, height) = reduced_dimensions(plane.width, plane.height, factor);
    let pixel_size_meters = plane.pixel_size_meters * factor;

    // The float resampler clamps to [0, 1]; work in normalized units
    let (lo, hi) = min_max(&plane.data);
    let span = hi - lo;
    if span <= 0.0 {
        let fill = vec![lo; width as usize * height as usize];
        return Ok(Plane::new(width, height, fill, pixel_size_meters));
    }

    let normalized: Vec<f32> = plane
        .data
        .iter()
        .map(|&v| {
            let t = (v - lo) / span;
            if t.is_nan() { 0.0 } else { t }
        })
        .collect();
    let buffer: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_raw(plane.width, plane.height, normalized).ok_or_else(|| {
            BackendError::ProcessingFailed(format!(
                "sample count does not match {}x{}",
                plane.width, plane.height
            ))
        })?;

    let resized = imageops::resize(&buffer, width, height, FilterType::Lanczos3);
    let data = resized.into_raw().into_iter().map(|t| t * span + lo).collect();

    Ok(Plane::new(width, height, data, pixel_size_meters))
}

/// Shrink factor shared by every plane of a `width x height` source.
pub fn plan_shrink(width: u32, height: u32, max_size: u32) -> f64 {
    let factor = shrink_factor(width, height, max_size);
    if factor != 1.0 {
        let (to_width, to_height) = reduced_dimensions(width, height, factor);
        debug!(factor, width, height, to_width, to_height, "Downsampling");
    }
    factor
}

/// Reduce `plane` by `factor` and render it to `output`.
pub fn create_preview(
    backend: &impl PreviewBackend,
    plane: Plane,
    output: &Path,
    factor: f64,
    quality: Quality,
) -> Result<()> {
    let plane = reduce(plane, factor)?;

    backend.render(&RenderParams {
        plane: &plane,
        output: output.to_path_buf(),
        quality,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};

    fn ramp(width: u32, height: u32) -> Plane {
        let data = (0..width * height).map(|i| (i % width) as f32).collect();
        Plane::new(width, height, data, 1e-10)
    }

    #[test]
    fn factor_one_is_identity() {
        let plane = ramp(30, 20);
        let reduced = reduce(plane.clone(), 1.0).unwrap();
        assert_eq!(reduced, plane);
    }

    #[test]
    fn halves_dimensions_and_doubles_pixel_size() {
        let reduced = reduce(ramp(2500, 2500), 2.0).unwrap();
        assert_eq!((reduced.width, reduced.height), (1250, 1250));
        assert_eq!(reduced.data.len(), 1250 * 1250);
        assert_eq!(reduced.pixel_size_meters, 2e-10);
    }

    #[test]
    fn preserves_original_value_range() {
        let reduced = reduce(ramp(200, 10), 4.0).unwrap();
        let (lo, hi) = min_max(&reduced.data);
        assert!(lo >= -1e-3 && hi <= 199.0 + 1e-3);
        // Gradient direction survives
        assert!(reduced.sample(0, 0) < reduced.sample(reduced.width - 1, 0));
    }

    #[test]
    fn constant_plane_stays_constant() {
        let plane = Plane::new(100, 100, vec![42.0; 10_000], 1e-10);
        let reduced = reduce(plane, 3.0).unwrap();
        assert_eq!((reduced.width, reduced.height), (33, 33));
        assert!(reduced.data.iter().all(|&v| v == 42.0));
    }

    #[test]
    fn rejects_non_positive_factor() {
        assert!(reduce(ramp(4, 4), 0.0).is_err());
    }

    #[test]
    fn create_preview_shrinks_before_rendering() {
        let backend = MockBackend::new();
        create_preview(
            &backend,
            ramp(2500, 2500),
            Path::new("/out/big.mrc.jpg"),
            plan_shrink(2500, 2500, 1250),
            Quality::default(),
        )
        .unwrap();

        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Render {
                output: "/out/big.mrc.jpg".to_string(),
                width: 1250,
                height: 1250,
                pixel_size_meters: 2e-10,
                quality: 75,
            }]
        );
    }

    #[test]
    fn create_preview_keeps_small_planes() {
        let backend = MockBackend::new();
        create_preview(
            &backend,
            ramp(64, 32),
            Path::new("/out/small.mrc.jpg"),
            plan_shrink(64, 32, 1250),
            Quality::new(90),
        )
        .unwrap();

        let ops = backend.get_operations();
        assert!(matches!(
            &ops[0],
            RecordedOp::Render {
                width: 64,
                height: 32,
                quality: 90,
                ..
            }
        ));
    }
}
