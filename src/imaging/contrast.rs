//! Contrast-limited adaptive histogram equalization (CLAHE).
//!
//! Detector output rarely uses its dynamic range evenly, so a plain linear
//! stretch leaves most micrographs flat and grey. CLAHE equalizes the
//! histogram of each tile of the image independently, caps how far any one
//! intensity can be stretched (the clip limit), and blends neighbouring tile
//! mappings bilinearly so tile seams do not show.
//!
//! Defaults follow the common reference implementation: tiles of 1/8 of the
//! image along each axis, a clip limit of 1% of the tile's pixels, 256
//! histogram bins.

/// Tunables for [`equalize_adapthist`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClaheParams {
    /// Tile size `(width, height)` in pixels; `None` is 1/8 of the image.
    pub kernel_size: Option<(u32, u32)>,
    /// Fraction of a tile's pixels any histogram bin may hold.
    pub clip_limit: f64,
    pub nbins: usize,
}

impl Default for ClaheParams {
    fn default() -> Self {
        Self {
            kernel_size: None,
            clip_limit: 0.01,
            nbins: 256,
        }
    }
}

/// Linearly map `data` onto `[0, 1]` using its own min and max.
///
/// A constant (or all-NaN) input maps to zeros. NaN samples map to zero.
pub fn rescale_intensity(data: &[f32]) -> Vec<f32> {
    let (lo, hi) = min_max(data);
    let span = hi - lo;
    if !span.is_finite() || span <= 0.0 {
        return vec![0.0; data.len()];
    }
    data.iter()
        .map(|&v| {
            let t = (v - lo) / span;
            if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) }
        })
        .collect()
}

/// Smallest and largest non-NaN sample; `(0, 0)` when there are none.
pub fn min_max(data: &[f32]) -> (f32, f32) {
    let (lo, hi) = data
        .iter()
        .filter(|v| !v.is_nan())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi { (0.0, 0.0) } else { (lo, hi) }
}

/// Equalize a row-major `width x height` plane. Output values lie in `[0, 1]`.
pub fn equalize_adapthist(width: u32, height: u32, data: &[f32], params: &ClaheParams) -> Vec<f32> {
    let (w, h) = (width as usize, height as usize);
    if w == 0 || h == 0 {
        return Vec::new();
    }
    let nbins = params.nbins.max(2);

    let (kw, kh) = params
        .kernel_size
        .map(|(kw, kh)| (kw as usize, kh as usize))
        .unwrap_or((w / 8, h / 8));
    let (kw, kh) = (kw.clamp(1, w), kh.clamp(1, h));
    let tiles_x = w.div_ceil(kw);
    let tiles_y = h.div_ceil(kh);

    let bins: Vec<u16> = rescale_intensity(data)
        .iter()
        .map(|&v| ((v * nbins as f32) as usize).min(nbins - 1) as u16)
        .collect();

    let clip = ((params.clip_limit * (kw * kh) as f64) as u32).max(1);

    // One mapping per tile: bin → equalized value in [0, 1]
    let mut maps: Vec<Vec<f32>> = Vec::with_capacity(tiles_x * tiles_y);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let (x0, x1) = (tx * kw, ((tx + 1) * kw).min(w));
            let (y0, y1) = (ty * kh, ((ty + 1) * kh).min(h));

            let mut hist = vec![0u32; nbins];
            for y in y0..y1 {
                for &b in &bins[y * w + x0..y * w + x1] {
                    hist[b as usize] += 1;
                }
            }
            clip_histogram(&mut hist, clip);
            maps.push(map_histogram(&hist, ((x1 - x0) * (y1 - y0)) as u32));
        }
    }

    // Bilinear blend between the four nearest tile centres
    let axis = |pos: usize, k: usize, tiles: usize| -> (usize, usize, f32) {
        let f = (pos as f32 + 0.5) / k as f32 - 0.5;
        if f <= 0.0 {
            return (0, 0, 0.0);
        }
        let i0 = (f.floor() as usize).min(tiles - 1);
        let i1 = (i0 + 1).min(tiles - 1);
        (i0, i1, (f - i0 as f32).clamp(0.0, 1.0))
    };

    let mut out = vec![0.0f32; w * h];
    for y in 0..h {
        let (ty0, ty1, wy) = axis(y, kh, tiles_y);
        for x in 0..w {
            let (tx0, tx1, wx) = axis(x, kw, tiles_x);
            let b = bins[y * w + x] as usize;

            let top = maps[ty0 * tiles_x + tx0][b] * (1.0 - wx) + maps[ty0 * tiles_x + tx1][b] * wx;
            let bottom =
                maps[ty1 * tiles_x + tx0][b] * (1.0 - wx) + maps[ty1 * tiles_x + tx1][b] * wx;
            out[y * w + x] = top * (1.0 - wy) + bottom * wy;
        }
    }
    out
}

/// Clip every bin at `limit` and spread the excess evenly over all bins.
fn clip_histogram(hist: &mut [u32], limit: u32) {
    let mut excess: u32 = 0;
    for count in hist.iter_mut() {
        if *count > limit {
            excess += *count - limit;
            *count = limit;
        }
    }
    if excess == 0 {
        return;
    }

    let nbins = hist.len() as u32;
    let batch = excess / nbins;
    let mut residual = excess - batch * nbins;
    for count in hist.iter_mut() {
        *count += batch;
    }

    if residual > 0 {
        let step = (nbins / residual).max(1) as usize;
        let mut i = 0;
        while i < hist.len() && residual > 0 {
            hist[i] += 1;
            residual -= 1;
            i += step;
        }
    }
}

/// Cumulative distribution scaled to `[0, 1]`.
fn map_histogram(hist: &[u32], n_pixels: u32) -> Vec<f32> {
    let n = n_pixels.max(1) as f32;
    let mut cumulative = 0u32;
    hist.iter()
        .map(|&count| {
            cumulative += count;
            (cumulative as f32 / n).min(1.0)
        })
        .collect()
}

/// Quantize `[0, 1]` floats to the full `u8` range.
pub fn to_u8(data: &[f32]) -> Vec<u8> {
    data.iter()
        .map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect()
}
