//! Scale bar layout and drawing.
//!
//! Two passes are drawn with the same geometry: a thick black *outline* bar
//! with a black halo around the label, then a thinner white *inner* bar
//! nested inside it with white label text on top. The result reads on both
//! dark and bright micrographs.
//!
//! ```text
//!                                 ┌──────────────┐  ← outline (black)
//!                                 │██████████████│  ← inner (white), centred
//!                                 └──────────────┘
//!                                      50 nm        ← label, centred below
//!                                                 ↕ margin
//! ───────────────────────────────────────────────── image edge
//! ```
//!
//! Layout is a pure function ([`compute_layout`]) so it can be tested without
//! fonts. Drawing uses `imageproc` primitives, which clip to the canvas.

use super::backend::BackendError;
use super::calculations::{BarLength, fit_bar_length, scale_bar_length};
use super::params::ScaleBarSpec;
use ab_glyph::{FontVec, PxScale};
use image::RgbImage;
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::path::Path;
use tracing::{debug, warn};

/// Families tried in order when looking for a label font.
const LABEL_FAMILIES: &[&str] = &["DejaVu Sans", "Liberation Sans", "Arial", "Helvetica"];

/// A font for scale bar captions.
pub struct LabelFont {
    font: FontVec,
}

impl LabelFont {
    /// Load a TrueType/OpenType font from disk.
    pub fn from_file(path: &Path) -> Result<Self, BackendError> {
        let data = std::fs::read(path)?;
        let font = FontVec::try_from_vec(data).map_err(|e| {
            BackendError::Font(format!("{} is not a usable font: {e}", path.display()))
        })?;
        Ok(Self { font })
    }

    /// Find a sans-serif face among the installed system fonts.
    ///
    /// Falls back to the first loadable face when no sans-serif family
    /// matches. `None` when the system has no fonts at all.
    pub fn system_sans_serif() -> Option<Self> {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        debug!(font_count = db.len(), "Loaded system fonts");

        let mut families: Vec<fontdb::Family> =
            LABEL_FAMILIES.iter().map(|name| fontdb::Family::Name(name)).collect();
        families.push(fontdb::Family::SansSerif);

        let query = fontdb::Query {
            families: &families,
            ..fontdb::Query::default()
        };

        let preferred = db.query(&query);
        preferred
            .into_iter()
            .chain(db.faces().map(|face| face.id))
            .find_map(|id| {
                db.with_face_data(id, |data, index| {
                    FontVec::try_from_vec_and_index(data.to_vec(), index).ok()
                })
                .flatten()
            })
            .map(|font| Self { font })
    }

    pub fn font(&self) -> &FontVec {
        &self.font
    }

    pub fn into_font(self) -> FontVec {
        self.font
    }
}

/// Axis-aligned pixel rectangle. May extend past the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    fn to_rect(self) -> Rect {
        Rect::at(self.x, self.y).of_size(self.width.max(1), self.height.max(1))
    }
}

/// Resolved geometry shared by both drawing passes.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleBarLayout {
    pub length: BarLength,
    pub outline: PixelRect,
    pub inner: PixelRect,
    /// Top-left corner of the label text.
    pub label_origin: (i32, i32),
    pub label_size: Option<(u32, u32)>,
    /// Bar and label together, padded by the margin.
    pub frame: PixelRect,
    pub font_px: f32,
}

/// Label font size: 3% of the image height, at least 10 px.
pub fn font_px(image_height: u32) -> f32 {
    (0.03 * image_height as f64).round().max(10.0) as f32
}

fn bar_height(fraction: f64, image_height: u32) -> u32 {
    ((fraction * image_height as f64).round() as u32).max(1)
}

/// Inset from the right and bottom edges (border pad plus pad).
fn margin_px(image_height: u32, outline: &ScaleBarSpec) -> u32 {
    (2.0 * outline.margin_fraction * font_px(image_height) as f64).round() as u32
}

/// Longest bar that fits between the margins of a `width` × `height` image.
pub fn max_bar_pixels(width: u32, height: u32, outline: &ScaleBarSpec) -> u32 {
    width.saturating_sub(2 * margin_px(height, outline)).max(1)
}

/// Round bar length for a `width` × `height` image.
///
/// Steps down to a shorter round length when the preferred one would not
/// fit between the margins. `None` when no round length is short enough.
pub fn choose_length(width: u32, height: u32, outline: &ScaleBarSpec) -> Option<BarLength> {
    let mpp = outline.meters_per_pixel;
    let preferred = scale_bar_length(mpp, width, outline.length_fraction);
    let max_len = max_bar_pixels(width, height, outline);
    if preferred.pixels(mpp) <= max_len {
        Some(preferred)
    } else {
        fit_bar_length(mpp, max_len)
    }
}

/// Place both bars and the label in the lower-right corner.
///
/// The bar is exactly `length.pixels(..)` long; take `length` from
/// [`choose_length`] so it fits. `label_size` is the rendered caption
/// extent, or `None` when no caption will be drawn.
pub fn compute_layout(
    width: u32,
    height: u32,
    outline: &ScaleBarSpec,
    inner: &ScaleBarSpec,
    length: BarLength,
    label_size: Option<(u32, u32)>,
) -> ScaleBarLayout {
    let font = font_px(height);
    let margin = margin_px(height, outline);

    let inner_h = bar_height(inner.height_fraction, height);
    let outline_h = bar_height(outline.height_fraction, height).max(inner_h + 2);
    let border = (outline_h - inner_h) / 2;

    let bar_len = length.pixels(outline.meters_per_pixel);

    let (label_w, label_h) = label_size.unwrap_or((0, 0));
    let gap = if label_size.is_some() {
        (font / 2.0).round() as u32
    } else {
        0
    };
    let block_w = bar_len.max(label_w);
    let block_h = outline_h + gap + label_h;

    let left = width as i32 - margin as i32 - block_w as i32;
    let top = height as i32 - margin as i32 - block_h as i32;

    let centre = left + block_w as i32 / 2;
    let outline_rect = PixelRect {
        x: centre - bar_len as i32 / 2,
        y: top,
        width: bar_len,
        height: outline_h,
    };
    let inner_rect = PixelRect {
        x: outline_rect.x + border as i32,
        y: outline_rect.y + border as i32,
        width: bar_len.saturating_sub(2 * border).max(1),
        height: inner_h,
    };
    let label_origin = (
        centre - label_w as i32 / 2,
        top + outline_h as i32 + gap as i32,
    );

    let pad = margin / 2;
    let frame = PixelRect {
        x: left - pad as i32,
        y: top - pad as i32,
        width: block_w + 2 * pad,
        height: block_h + 2 * pad,
    };

    ScaleBarLayout {
        length,
        outline: outline_rect,
        inner: inner_rect,
        label_origin,
        label_size,
        frame,
        font_px: font,
    }
}

/// Draw the outline pass then the inner pass onto `img`.
///
/// Without a font the bars are drawn and the caption is left out. Returns
/// `None`, leaving `img` untouched, when no round length fits the image.
pub fn draw_scale_bars(
    img: &mut RgbImage,
    outline: &ScaleBarSpec,
    inner: &ScaleBarSpec,
    font: Option<&FontVec>,
) -> Option<ScaleBarLayout> {
    let (width, height) = img.dimensions();
    let Some(length) = choose_length(width, height, outline) else {
        warn!(
            meters_per_pixel = outline.meters_per_pixel,
            "No scale bar length fits a {width}x{height} image; bar omitted"
        );
        return None;
    };
    let scale = PxScale::from(font_px(height));
    let label = length.label();
    let label_size = font.map(|f| text_size(scale, f, &label));

    let layout = compute_layout(width, height, outline, inner, length, label_size);

    // Outline pass
    draw_filled_rect_mut(img, layout.outline.to_rect(), outline.color);
    if let Some(font) = font {
        let (x, y) = layout.label_origin;
        let halo = ((layout.font_px / 16.0).round() as i32).max(1);
        for dy in -halo..=halo {
            for dx in -halo..=halo {
                if dx != 0 || dy != 0 {
                    draw_text_mut(img, outline.color, x + dx, y + dy, scale, font, &label);
                }
            }
        }
    }

    // Inner pass
    draw_filled_rect_mut(img, layout.inner.to_rect(), inner.color);
    if let Some(font) = font {
        let (x, y) = layout.label_origin;
        draw_text_mut(img, inner.color, x, y, scale, font, &label);
    }

    Some(layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const MPP: f64 = 2e-10;

    fn grey(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([128, 128, 128]))
    }

    fn layout_for(width: u32, height: u32, label: Option<(u32, u32)>) -> ScaleBarLayout {
        let outline = ScaleBarSpec::outline(MPP);
        let inner = ScaleBarSpec::inner(MPP);
        let length = choose_length(width, height, &outline).unwrap();
        compute_layout(width, height, &outline, &inner, length, label)
    }

    #[test]
    fn font_size_scales_with_height() {
        assert_eq!(font_px(1250), 38.0);
        assert_eq!(font_px(100), 10.0);
    }

    #[test]
    fn layout_sits_in_lower_right() {
        let layout = layout_for(1250, 1250, Some((80, 30)));
        // 2 * 0.3 * 38 = 23 px margin
        assert_eq!(layout.length.label(), "50 nm");
        assert_eq!(layout.outline.width, 250);
        assert_eq!(layout.outline.right(), 1250 - 23);
        assert_eq!(layout.label_origin.1 + 30, 1250 - 23);
        assert!(layout.outline.x > 625);
    }

    #[test]
    fn inner_bar_is_nested_and_centred() {
        let layout = layout_for(1250, 1250, None);
        let (o, i) = (layout.outline, layout.inner);
        assert_eq!(o.height, 11);
        assert_eq!(i.height, 6);
        assert!(i.x > o.x && i.right() < o.right());
        assert!(i.y > o.y && i.bottom() <= o.bottom());
        assert_eq!(i.y - o.y, (o.height - i.height) as i32 / 2);
    }

    #[test]
    fn outline_is_always_taller_than_inner() {
        let layout = layout_for(64, 64, None);
        assert!(layout.outline.height >= layout.inner.height + 2);
    }

    #[test]
    fn label_is_centred_under_bar() {
        let layout = layout_for(1000, 800, Some((60, 20)));
        let bar_centre = layout.outline.x + layout.outline.width as i32 / 2;
        let label_centre = layout.label_origin.0 + 30;
        assert!((bar_centre - label_centre).abs() <= 1);
        assert!(layout.label_origin.1 > layout.outline.bottom());
    }

    #[test]
    fn narrow_image_steps_down_to_a_length_that_fits() {
        // 2000 px tall: 60 px font, 36 px margin, room for 8 px of bar
        let outline = ScaleBarSpec::outline(1e-9);
        let inner = ScaleBarSpec::inner(1e-9);
        assert_eq!(max_bar_pixels(80, 2000, &outline), 8);
        assert_eq!(scale_bar_length(1e-9, 80, 0.2).label(), "15 nm");

        let length = choose_length(80, 2000, &outline).unwrap();
        assert_eq!(length.label(), "5 nm");

        let layout = compute_layout(80, 2000, &outline, &inner, length, None);
        assert_eq!(layout.outline.width, layout.length.pixels(1e-9));
        assert!(layout.outline.x >= 0);
        assert!(layout.outline.right() <= 80);
    }

    #[test]
    fn bar_matches_caption_when_drawn_on_narrow_image() {
        let mut img = grey(80, 2000);
        let outline = ScaleBarSpec::outline(1e-9);
        let layout = draw_scale_bars(&mut img, &outline, &ScaleBarSpec::inner(1e-9), None).unwrap();
        assert_eq!(layout.outline.width, layout.length.pixels(1e-9));
    }

    #[test]
    fn bar_is_omitted_when_no_length_fits() {
        // 1 pm would span 100000 px
        let mut img = grey(100, 100);
        let outline = ScaleBarSpec::outline(1e-17);
        assert!(choose_length(100, 100, &outline).is_none());

        let layout = draw_scale_bars(&mut img, &outline, &ScaleBarSpec::inner(1e-17), None);
        assert!(layout.is_none());
        assert!(img.pixels().all(|p| p == &Rgb([128, 128, 128])));
    }

    #[test]
    fn draws_black_outline_and_white_core() {
        let mut img = grey(400, 400);
        let outline = ScaleBarSpec::outline(1e-9);
        let inner = ScaleBarSpec::inner(1e-9);
        let layout = draw_scale_bars(&mut img, &outline, &inner, None).unwrap();

        let o = layout.outline;
        // Top-left corner of the outline stays black, centre is white
        assert_eq!(img.get_pixel(o.x as u32, o.y as u32), &Rgb([0, 0, 0]));
        let (cx, cy) = (
            (o.x + o.width as i32 / 2) as u32,
            (o.y + o.height as i32 / 2) as u32,
        );
        assert_eq!(img.get_pixel(cx, cy), &Rgb([255, 255, 255]));
        // Far corner untouched
        assert_eq!(img.get_pixel(0, 0), &Rgb([128, 128, 128]));
    }

    #[test]
    fn tiny_images_do_not_panic() {
        for (w, h) in [(1, 1), (3, 2), (16, 1), (1, 40)] {
            let mut img = grey(w, h);
            let spec = ScaleBarSpec::outline(1e-10);
            draw_scale_bars(&mut img, &spec, &ScaleBarSpec::inner(1e-10), None);
        }
    }

    #[test]
    fn label_drawn_with_system_font() {
        let Some(font) = LabelFont::system_sans_serif() else {
            return;
        };
        let mut img = grey(600, 600);
        let outline = ScaleBarSpec::outline(1e-9);
        let layout = draw_scale_bars(
            &mut img,
            &outline,
            &ScaleBarSpec::inner(1e-9),
            Some(font.font()),
        )
        .unwrap();

        let (lw, lh) = layout.label_size.unwrap();
        let (x0, y0) = layout.label_origin;
        let white = (0..lh as i32)
            .flat_map(|dy| (0..lw as i32).map(move |dx| (x0 + dx, y0 + dy)))
            .filter(|&(x, y)| x >= 0 && y >= 0 && x < 600 && y < 600)
            .filter(|&(x, y)| img.get_pixel(x as u32, y as u32) == &Rgb([255, 255, 255]))
            .count();
        assert!(white > 0, "label should leave white glyph pixels");
    }

    #[test]
    fn missing_font_file_is_an_error() {
        let result = LabelFont::from_file(Path::new("/nonexistent/font.ttf"));
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn invalid_font_data_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("bogus.ttf");
        std::fs::write(&path, b"definitely not a font").unwrap();
        assert!(matches!(
            LabelFont::from_file(&path),
            Err(BackendError::Font(_))
        ));
    }
}
