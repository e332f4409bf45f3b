//! Component F: perceptual hashes (aHash, pHash, dHash), each a 16-character
//! lowercase hex string over 64 bits. Grounded on the original pipeline's use
//! of `imagehash` with `hash_size=8` (`features/perceptual.py`); bit ordering
//! (row-major, MSB-first per byte) is pinned directly by spec.md §4.F/§8
//! since the python library's internal bit layout is not itself the contract.

use image::{GenericImageView, RgbaImage, imageops::FilterType};

use crate::model::PerceptualHashes;

/// Compute all three perceptual hashes over a normalized RGBA image.
#[must_use]
pub fn compute_hashes(img: &RgbaImage) -> PerceptualHashes {
    PerceptualHashes {
        ahash: ahash(img),
        phash: phash(img),
        dhash: dhash(img),
    }
}

fn to_grey(img: &RgbaImage, w: u32, h: u32) -> Vec<f64> {
    let small = image::imageops::resize(img, w, h, FilterType::Triangle);
    let mut out = Vec::with_capacity((w * h) as usize);
    for y in 0..h {
        for x in 0..w {
            let p = small.get_pixel(x, y);
            let grey = 0.299 * f64::from(p[0]) + 0.587 * f64::from(p[1]) + 0.114 * f64::from(p[2]);
            out.push(grey);
        }
    }
    out
}

/// 8x8 average hash: bit = (pixel > mean), row-major, MSB-first per byte.
fn ahash(img: &RgbaImage) -> String {
    let grey = to_grey(img, 8, 8);
    let mean = grey.iter().sum::<f64>() / grey.len() as f64;
    bits_to_hex(grey.iter().map(|&v| v > mean))
}

/// 9x8 difference hash: bit = (pixel[x] > pixel[x+1]) row-wise over an 8x8
/// result (9 columns sampled, 8 horizontal comparisons per row).
fn dhash(img: &RgbaImage) -> String {
    let grey = to_grey(img, 9, 8);
    let mut bits = Vec::with_capacity(64);
    for row in 0..8usize {
        for col in 0..8usize {
            let left = grey[row * 9 + col];
            let right = grey[row * 9 + col + 1];
            bits.push(left > right);
        }
    }
    bits_to_hex(bits.into_iter())
}

/// 32x32 downscale, 2D DCT-II, top-left 8x8 block excluding the DC term for
/// the median, bit = (coefficient > median).
fn phash(img: &RgbaImage) -> String {
    let grey = to_grey(img, 32, 32);
    let dct = dct2d(&grey, 32, 32);

    let mut block = Vec::with_capacity(64);
    for v in 0..8usize {
        for u in 0..8usize {
            block.push(dct[v * 32 + u]);
        }
    }
    // Median excluding the DC term (index 0, i.e. u=0,v=0).
    let mut without_dc: Vec<f64> = block.iter().copied().enumerate().filter(|&(i, _)| i != 0).map(|(_, v)| v).collect();
    without_dc.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median = median_of_sorted(&without_dc);

    bits_to_hex(block.into_iter().map(|v| v > median))
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Separable 2D DCT-II over a `w`x`h` row-major array.
fn dct2d(data: &[f64], w: usize, h: usize) -> Vec<f64> {
    let rows_transformed: Vec<f64> = (0..h).flat_map(|y| dct1d(&data[y * w..(y + 1) * w])).collect();

    let mut out = vec![0.0; w * h];
    for x in 0..w {
        let column: Vec<f64> = (0..h).map(|y| rows_transformed[y * w + x]).collect();
        let transformed = dct1d(&column);
        for (y, value) in transformed.into_iter().enumerate() {
            out[y * w + x] = value;
        }
    }
    out
}

/// 1D DCT-II with the standard orthonormal-ish scaling used by perceptual
/// hashing implementations (scale doesn't affect the `> median` bit test).
fn dct1d(input: &[f64]) -> Vec<f64> {
    let n = input.len();
    let mut out = vec![0.0; n];
    for (k, slot) in out.iter_mut().enumerate() {
        let mut sum = 0.0;
        for (i, &value) in input.iter().enumerate() {
            sum += value * (std::f64::consts::PI / n as f64 * (i as f64 + 0.5) * k as f64).cos();
        }
        *slot = sum;
    }
    out
}

fn bits_to_hex(bits: impl Iterator<Item = bool>) -> String {
    let bits: Vec<bool> = bits.collect();
    let mut hex = String::with_capacity(bits.len() / 4);
    for chunk in bits.chunks(4) {
        let mut nibble = 0u8;
        for (i, &bit) in chunk.iter().enumerate() {
            if bit {
                nibble |= 1 << (3 - i);
            }
        }
        hex.push(std::char::from_digit(u32::from(nibble), 16).unwrap_or('0'));
    }
    hex
}

/// Hamming distance between two equal-length hex hash strings, in bits.
#[must_use]
pub fn hamming_distance(a: &str, b: &str) -> Option<u32> {
    if a.len() != b.len() {
        return None;
    }
    let mut distance = 0u32;
    for (ca, cb) in a.chars().zip(b.chars()) {
        let na = ca.to_digit(16)?;
        let nb = cb.to_digit(16)?;
        distance += (na ^ nb).count_ones();
    }
    Some(distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(color: Rgba<u8>) -> RgbaImage {
        RgbaImage::from_pixel(256, 256, color)
    }

    #[test]
    fn identical_images_hash_identically() {
        let a = solid(Rgba([10, 120, 200, 255]));
        let b = solid(Rgba([10, 120, 200, 255]));
        let ha = compute_hashes(&a);
        let hb = compute_hashes(&b);
        assert_eq!(ha.ahash, hb.ahash);
        assert_eq!(ha.phash, hb.phash);
        assert_eq!(ha.dhash, hb.dhash);
    }

    #[test]
    fn hashes_are_16_hex_chars() {
        let img = solid(Rgba([200, 30, 30, 255]));
        let h = compute_hashes(&img);
        assert_eq!(h.ahash.len(), 16);
        assert_eq!(h.phash.len(), 16);
        assert_eq!(h.dhash.len(), 16);
    }

    #[test]
    fn hamming_distance_is_zero_for_equal_hashes() {
        assert_eq!(hamming_distance("abcd1234abcd1234", "abcd1234abcd1234"), Some(0));
    }

    #[test]
    fn hamming_distance_counts_differing_bits() {
        assert_eq!(hamming_distance("0000000000000000", "0000000000000001"), Some(1));
        assert_eq!(hamming_distance("0", "f"), Some(4));
    }

    #[test]
    fn hamming_distance_none_for_mismatched_lengths() {
        assert_eq!(hamming_distance("ab", "abc"), None);
    }

    #[test]
    fn distinct_images_differ_in_hash() {
        let a = solid(Rgba([0, 0, 0, 255]));
        let mut b_img = RgbaImage::from_pixel(256, 256, Rgba([0, 0, 0, 255]));
        for x in 0..128 {
            for y in 0..256 {
                b_img.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }
        let ha = compute_hashes(&a);
        let hb = compute_hashes(&b_img);
        assert_ne!(ha.ahash, hb.ahash);
    }
}
