//! Component H: ORB-style shape matcher. No example repo in the pack depends
//! on a full ORB implementation (the original pipeline's `features/shape.py`
//! is an unused placeholder), so this module combines `imageproc`'s FAST
//! corner detector with a hand-built oriented BRIEF-style binary descriptor,
//! Hamming brute-force matching and Lowe's ratio test, per spec.md §4.H and
//! the crate-choice rationale in §10.6.

use image::{GenericImageView, GrayImage, RgbaImage};
use imageproc::corners::{Corner, corners_fast9};
use once_cell::sync::Lazy;

const MAX_KEYPOINTS: usize = 500;
const FAST_THRESHOLD: u8 = 20;
const PATCH_RADIUS: i32 = 15;
const DESCRIPTOR_BYTES: usize = 32;
const DESCRIPTOR_BITS: usize = DESCRIPTOR_BYTES * 8;
const LOWE_RATIO: f64 = 0.75;

type Descriptor = [u8; DESCRIPTOR_BYTES];

/// Fixed BRIEF-style sampling pattern: `DESCRIPTOR_BITS` pairs of offsets in
/// `[-PATCH_RADIUS, PATCH_RADIUS]`, generated once with a deterministic LCG
/// so the descriptor (and therefore every downstream hash/score) is stable
/// across runs and platforms.
static SAMPLING_PATTERN: Lazy<Vec<(i32, i32, i32, i32)>> = Lazy::new(generate_sampling_pattern);

fn generate_sampling_pattern() -> Vec<(i32, i32, i32, i32)> {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };
    let mut coord = || {
        let raw = (next() % (2 * PATCH_RADIUS as u64 + 1)) as i32;
        raw - PATCH_RADIUS
    };
    (0..DESCRIPTOR_BITS).map(|_| (coord(), coord(), coord(), coord())).collect()
}

/// Keypoint with an orientation computed from its patch's intensity centroid.
struct Keypoint {
    x: i32,
    y: i32,
    angle: f64,
}

/// Component H entry point: 0.0 if either image is empty or has no usable
/// keypoints, else `|good matches| / max(1, min(kp1, kp2))`, clamped to `[0,1]`.
#[must_use]
pub fn orb_similarity(a: &RgbaImage, b: &RgbaImage) -> f64 {
    if a.width() == 0 || a.height() == 0 || b.width() == 0 || b.height() == 0 {
        return 0.0;
    }

    let grey_a = to_grey(a);
    let grey_b = to_grey(b);

    let descriptors_a = detect_and_describe(&grey_a);
    let descriptors_b = detect_and_describe(&grey_b);
    if descriptors_a.is_empty() || descriptors_b.is_empty() {
        return 0.0;
    }

    let good_matches = count_good_matches(&descriptors_a, &descriptors_b);
    let denom = descriptors_a.len().min(descriptors_b.len()).max(1);
    (good_matches as f64 / denom as f64).clamp(0.0, 1.0)
}

fn to_grey(img: &RgbaImage) -> GrayImage {
    image::DynamicImage::ImageRgba8(img.clone()).to_luma8()
}

/// FAST9 corner detection (scored, capped at [`MAX_KEYPOINTS`]) followed by
/// an oriented-BRIEF descriptor per keypoint.
fn detect_and_describe(grey: &GrayImage) -> Vec<Descriptor> {
    let mut corners: Vec<Corner> = corners_fast9(grey, FAST_THRESHOLD);
    corners.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    corners.truncate(MAX_KEYPOINTS);

    corners
        .into_iter()
        .filter_map(|corner| {
            let kp = oriented_keypoint(grey, corner.x as i32, corner.y as i32)?;
            Some(describe(grey, &kp))
        })
        .collect()
}

/// Orientation via the intensity centroid moments `m10`/`m01` over a patch
/// centred on `(x, y)`. Returns `None` if the patch falls entirely outside
/// the image.
fn oriented_keypoint(grey: &GrayImage, x: i32, y: i32) -> Option<Keypoint> {
    let (w, h) = (grey.width() as i32, grey.height() as i32);
    if x < 0 || y < 0 || x >= w || y >= h {
        return None;
    }

    let mut m10 = 0.0;
    let mut m01 = 0.0;
    let mut mass = 0.0;
    let mut sampled = false;

    for dy in -PATCH_RADIUS..=PATCH_RADIUS {
        let py = y + dy;
        if py < 0 || py >= h {
            continue;
        }
        for dx in -PATCH_RADIUS..=PATCH_RADIUS {
            let px = x + dx;
            if px < 0 || px >= w {
                continue;
            }
            sampled = true;
            let intensity = f64::from(grey.get_pixel(px as u32, py as u32)[0]);
            m10 += f64::from(dx) * intensity;
            m01 += f64::from(dy) * intensity;
            mass += intensity;
        }
    }

    if !sampled || mass == 0.0 {
        return Some(Keypoint { x, y, angle: 0.0 });
    }
    Some(Keypoint { x, y, angle: m01.atan2(m10) })
}

/// Sample the fixed pattern, rotated by the keypoint's orientation, around
/// `(kp.x, kp.y)`; bit = `I(p1) < I(p2)` (standard BRIEF convention).
fn describe(grey: &GrayImage, kp: &Keypoint) -> Descriptor {
    let (cos_t, sin_t) = (kp.angle.cos(), kp.angle.sin());
    let mut descriptor = [0u8; DESCRIPTOR_BYTES];

    for (bit_index, &(x1, y1, x2, y2)) in SAMPLING_PATTERN.iter().enumerate() {
        let i1 = sample_rotated(grey, kp.x, kp.y, x1, y1, cos_t, sin_t);
        let i2 = sample_rotated(grey, kp.x, kp.y, x2, y2, cos_t, sin_t);
        if i1 < i2 {
            descriptor[bit_index / 8] |= 1 << (7 - (bit_index % 8));
        }
    }
    descriptor
}

fn sample_rotated(grey: &GrayImage, cx: i32, cy: i32, dx: i32, dy: i32, cos_t: f64, sin_t: f64) -> u8 {
    let rx = f64::from(dx).mul_add(cos_t, -(f64::from(dy) * sin_t));
    let ry = f64::from(dx).mul_add(sin_t, f64::from(dy) * cos_t);
    let px = (f64::from(cx) + rx).round() as i32;
    let py = (f64::from(cy) + ry).round() as i32;

    let clamped_x = px.clamp(0, grey.width() as i32 - 1) as u32;
    let clamped_y = py.clamp(0, grey.height() as i32 - 1) as u32;
    grey.get_pixel(clamped_x, clamped_y)[0]
}

fn hamming(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x ^ y).count_ones()).sum()
}

/// Hamming BF matcher, k=2, no cross-check, with Lowe's ratio test
/// (ratio 0.75; pairs whose second-best distance is 0 are skipped).
fn count_good_matches(a: &[Descriptor], b: &[Descriptor]) -> usize {
    let mut good = 0usize;
    for da in a {
        let mut best = u32::MAX;
        let mut second = u32::MAX;
        for db in b {
            let d = hamming(da, db);
            if d < best {
                second = best;
                best = d;
            } else if d < second {
                second = d;
            }
        }
        if second == 0 || second == u32::MAX {
            continue;
        }
        if (f64::from(best)) < LOWE_RATIO * f64::from(second) {
            good += 1;
        }
    }
    good
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn checkerboard(size: u32, cell: u32) -> RgbaImage {
        RgbaImage::from_fn(size, size, |x, y| {
            let on = ((x / cell) + (y / cell)) % 2 == 0;
            if on { Rgba([255, 255, 255, 255]) } else { Rgba([0, 0, 0, 255]) }
        })
    }

    #[test]
    fn empty_image_yields_zero_similarity() {
        let empty = RgbaImage::new(0, 0);
        let other = checkerboard(64, 8);
        assert_eq!(orb_similarity(&empty, &other), 0.0);
    }

    #[test]
    fn identical_images_score_highly() {
        let img = checkerboard(128, 8);
        let score = orb_similarity(&img, &img.clone());
        assert!(score > 0.2, "expected a high match score for identical images, got {score}");
    }

    #[test]
    fn flat_image_has_no_keypoints() {
        let flat = RgbaImage::from_pixel(64, 64, Rgba([128, 128, 128, 255]));
        assert_eq!(orb_similarity(&flat, &flat.clone()), 0.0);
    }

    #[test]
    fn score_is_always_in_unit_range() {
        let a = checkerboard(96, 6);
        let b = checkerboard(96, 11);
        let score = orb_similarity(&a, &b);
        assert!((0.0..=1.0).contains(&score));
    }
}
