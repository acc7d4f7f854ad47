//! JPEG preview backend built on the `image` crate ecosystem.
//!
//! ## Crate mapping
//!
//! | Step | Crate / function |
//! |---|---|
//! | Orientation (MRC origin is bottom-left) | row flip |
//! | Contrast | CLAHE in [`contrast`](super::contrast) |
//! | Scale bars | `imageproc` rectangles + `ab_glyph` text |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder`, 300 dpi density |

use super::backend::{BackendError, PreviewBackend};
use super::contrast::{ClaheParams, equalize_adapthist, to_u8};
use super::params::{Quality, RenderParams, ScaleBarSpec};
use super::scalebar::{LabelFont, draw_scale_bars};
use crate::types::Plane;
use ab_glyph::FontVec;
use image::codecs::jpeg::{JpegEncoder, PixelDensity};
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};
use std::path::Path;

/// Dots per inch written to the JPEG header.
pub const OUTPUT_DPI: u16 = 300;

/// Production backend: CLAHE, dual scale bar, JPEG.
///
/// Holds the label font for the lifetime of the batch. Without one, bars are
/// drawn with no caption.
pub struct JpegBackend {
    font: Option<FontVec>,
    clahe: ClaheParams,
}

impl JpegBackend {
    pub fn new(font: Option<LabelFont>) -> Self {
        Self {
            font: font.map(LabelFont::into_font),
            clahe: ClaheParams::default(),
        }
    }

    /// Build the annotated RGB image for `plane` without encoding it.
    pub fn compose(&self, plane: &Plane) -> RgbImage {
        let flipped = flip_rows(plane);
        let enhanced = equalize_adapthist(plane.width, plane.height, &flipped, &self.clahe);
        let grey = to_u8(&enhanced);

        let mut img = RgbImage::from_fn(plane.width, plane.height, |x, y| {
            let v = grey[y as usize * plane.width as usize + x as usize];
            Rgb([v, v, v])
        });

        let mpp = plane.pixel_size_meters;
        draw_scale_bars(
            &mut img,
            &ScaleBarSpec::outline(mpp),
            &ScaleBarSpec::inner(mpp),
            self.font.as_ref(),
        );
        img
    }
}

/// Copy plane rows bottom-up so the file's first row lands at the bottom.
fn flip_rows(plane: &Plane) -> Vec<f32> {
    let w = plane.width as usize;
    if w == 0 {
        return Vec::new();
    }
    plane
        .data
        .chunks_exact(w)
        .rev()
        .flatten()
        .copied()
        .collect()
}

/// Encode and save as a baseline JPEG.
fn save_jpeg(img: &RgbImage, path: &Path, quality: Quality) -> Result<(), BackendError> {
    let file = std::fs::File::create(path).map_err(BackendError::Io)?;
    let writer = std::io::BufWriter::new(file);
    let mut encoder = JpegEncoder::new_with_quality(writer, quality.value());
    encoder.set_pixel_density(PixelDensity::dpi(OUTPUT_DPI));
    encoder
        .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgb8)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))
}

impl PreviewBackend for JpegBackend {
    fn render(&self, params: &RenderParams) -> Result<(), BackendError> {
        let plane = params.plane;
        if plane.width == 0 || plane.height == 0 {
            return Err(BackendError::ProcessingFailed(format!(
                "empty plane ({}x{})",
                plane.width, plane.height
            )));
        }
        let img = self.compose(plane);
        save_jpeg(&img, &params.output, params.quality)
    }
}
