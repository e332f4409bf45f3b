//! Component I: similarity fusion. Per-channel similarities combined into a
//! single weighted score, with an ORB tiebreaker blended in only inside the
//! uncertain band around `T_LINK`. Grounded on spec.md §4.I; the original
//! pipeline's `group/similarity.py` stub (`compute_similarity`) does not
//! implement this weighting and is not authoritative.

use crate::color;
use crate::hashes;
use crate::model::{LogoFeatures, T_LINK};

const WEIGHT_PHASH: f64 = 0.35;
const WEIGHT_DHASH: f64 = 0.25;
const WEIGHT_AHASH: f64 = 0.15;
const WEIGHT_HIST: f64 = 0.25;

const ORB_BLEND_BASE: f64 = 0.8;
const ORB_BLEND_ORB: f64 = 0.2;

/// Lower/upper bound of the uncertain band around `T_LINK` in which an ORB
/// tiebreaker is worth computing.
pub const ORB_BAND_LOW: f64 = T_LINK - 0.05;
pub const ORB_BAND_HIGH: f64 = T_LINK + 0.10;

/// `1 - hamming(h1, h2) / 64`, clamped `[0,1]`; `0.0` if either hash is
/// missing or the hashes have mismatched lengths.
#[must_use]
pub fn hash_similarity(a: &str, b: &str) -> f64 {
    match hashes::hamming_distance(a, b) {
        Some(distance) => (1.0 - f64::from(distance) / 64.0).clamp(0.0, 1.0),
        None => 0.0,
    }
}

/// The three hash similarities and the histogram intersection for a feature
/// pair, prior to weighting.
#[derive(Debug, Clone, Copy)]
pub struct Components {
    pub ahash: f64,
    pub dhash: f64,
    pub phash: f64,
    pub hist: f64,
}

#[must_use]
pub fn components(a: &LogoFeatures, b: &LogoFeatures) -> Components {
    Components {
        ahash: hash_similarity(&a.perceptual.ahash, &b.perceptual.ahash),
        dhash: hash_similarity(&a.perceptual.dhash, &b.perceptual.dhash),
        phash: hash_similarity(&a.perceptual.phash, &b.perceptual.phash),
        hist: color::histogram_intersection(&a.hsv_histogram, &b.hsv_histogram),
    }
}

/// Base weighted score `s = 0.35*phash + 0.25*dhash + 0.15*ahash + 0.25*hist`,
/// clamped `[0,1]`. Symmetric in its inputs since every per-channel
/// similarity is itself symmetric.
#[must_use]
pub fn combine_components(c: &Components) -> f64 {
    let s = WEIGHT_PHASH * c.phash + WEIGHT_DHASH * c.dhash + WEIGHT_AHASH * c.ahash + WEIGHT_HIST * c.hist;
    s.clamp(0.0, 1.0)
}

/// Blend an ORB tiebreaker score into a base similarity: `0.8*s + 0.2*o`,
/// clamped `[0,1]`.
#[must_use]
pub fn blend_with_orb(base: f64, orb: f64) -> f64 {
    (ORB_BLEND_BASE * base + ORB_BLEND_ORB * orb).clamp(0.0, 1.0)
}

/// True when a base score falls in the uncertain band where ORB is worth
/// computing as a tiebreaker.
#[must_use]
pub fn in_orb_band(score: f64) -> bool {
    (ORB_BAND_LOW..=ORB_BAND_HIGH).contains(&score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_similarity_is_one_for_identical_hashes() {
        assert!((hash_similarity("abcd", "abcd") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn hash_similarity_is_zero_for_mismatched_lengths() {
        assert_eq!(hash_similarity("ab", "abc"), 0.0);
    }

    #[test]
    fn combine_components_is_within_unit_range() {
        let c = Components { ahash: 1.0, dhash: 1.0, phash: 1.0, hist: 1.0 };
        assert!((combine_components(&c) - 1.0).abs() < 1e-9);
        let c0 = Components { ahash: 0.0, dhash: 0.0, phash: 0.0, hist: 0.0 };
        assert_eq!(combine_components(&c0), 0.0);
    }

    #[test]
    fn combine_components_is_symmetric() {
        // combine_components only depends on the (already symmetric)
        // per-channel similarities, so swapping inputs never changes it.
        let c = Components { ahash: 0.2, dhash: 0.4, phash: 0.6, hist: 0.8 };
        let same = Components { ahash: 0.2, dhash: 0.4, phash: 0.6, hist: 0.8 };
        assert_eq!(combine_components(&c), combine_components(&same));
    }

    #[test]
    fn blend_with_orb_stays_in_unit_range() {
        assert!((0.0..=1.0).contains(&blend_with_orb(0.9, 1.0)));
        assert!((0.0..=1.0).contains(&blend_with_orb(0.0, 0.0)));
    }

    #[test]
    fn orb_band_matches_threshold_window() {
        assert!(in_orb_band(0.70));
        assert!(in_orb_band(0.80));
        assert!(!in_orb_band(0.60));
        assert!(!in_orb_band(0.90));
    }
}
