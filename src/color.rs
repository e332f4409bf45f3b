//! Component G: color features. The original pipeline's `features/color.py`
//! is an unused stub (`np.zeros(256)`), so this module is built directly from
//! spec.md §4.G rather than imitating it.

use image::RgbaImage;

const H_BINS: usize = 12;
const S_BINS: usize = 6;
const V_BINS: usize = 6;
/// Length of the flattened HSV histogram: `H_BINS * S_BINS * V_BINS`.
pub const HISTOGRAM_LEN: usize = H_BINS * S_BINS * V_BINS;

const HUE_BINS: usize = 36;
const HUE_BIN_WIDTH: f64 = 180.0 / HUE_BINS as f64;
const DEFAULT_TOP_K: usize = 3;

/// H in `[0,180)`, S/V in `[0,256)`, the OpenCV convention.
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let (r, g, b) = (f64::from(r), f64::from(g), f64::from(b));
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue_deg = if delta <= 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let h = (hue_deg / 2.0).rem_euclid(180.0);

    let s = if max <= 0.0 { 0.0 } else { (delta / max) * 255.0 };
    let v = max;
    (h, s, v)
}

fn bin_index(value: f64, range_max: f64, nbins: usize) -> usize {
    let idx = (value / range_max * nbins as f64).floor() as isize;
    idx.clamp(0, nbins as isize - 1) as usize
}

/// 3D HSV histogram over `(H_BINS, S_BINS, V_BINS)`, L1-normalized, flattened
/// H-major then S then V. All-zero for an empty image.
#[must_use]
pub fn hsv_histogram(img: &RgbaImage) -> Vec<f64> {
    let mut histogram = vec![0.0f64; HISTOGRAM_LEN];
    if img.width() == 0 || img.height() == 0 {
        return histogram;
    }

    for pixel in img.pixels() {
        let (h, s, v) = rgb_to_hsv(pixel[0], pixel[1], pixel[2]);
        let hi = bin_index(h, 180.0, H_BINS);
        let si = bin_index(s, 256.0, S_BINS);
        let vi = bin_index(v, 256.0, V_BINS);
        histogram[hi * S_BINS * V_BINS + si * V_BINS + vi] += 1.0;
    }

    let total: f64 = histogram.iter().sum();
    if total > 0.0 {
        for bin in &mut histogram {
            *bin /= total;
        }
    }
    histogram
}

/// Centres (degrees, rounded) of the top-k 36-bin hue histogram buckets by
/// count, descending. Empty when every bucket is zero.
#[must_use]
pub fn dominant_hues(img: &RgbaImage) -> Vec<u32> {
    dominant_hues_top_k(img, DEFAULT_TOP_K)
}

fn dominant_hues_top_k(img: &RgbaImage, k: usize) -> Vec<u32> {
    let mut counts = vec![0u64; HUE_BINS];
    for pixel in img.pixels() {
        let (h, _, _) = rgb_to_hsv(pixel[0], pixel[1], pixel[2]);
        let bin = bin_index(h, 180.0, HUE_BINS);
        counts[bin] += 1;
    }

    if counts.iter().all(|&c| c == 0) {
        return Vec::new();
    }

    let mut indexed: Vec<(usize, u64)> = counts.into_iter().enumerate().collect();
    indexed.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    indexed
        .into_iter()
        .take(k)
        .filter(|&(_, count)| count > 0)
        .map(|(bin, _)| ((bin as f64 * HUE_BIN_WIDTH) + HUE_BIN_WIDTH / 2.0).round() as u32)
        .collect()
}

/// Histogram intersection `sum(min(a_i, b_i))`, clamped to `[0,1]`.
#[must_use]
pub fn histogram_intersection(a: &[f64], b: &[f64]) -> f64 {
    let sum: f64 = a.iter().zip(b.iter()).map(|(x, y)| x.min(*y)).sum();
    sum.clamp(0.0, 1.0)
}
