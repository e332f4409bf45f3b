//! Component J: shortlist + pairwise. Avoids O(N^2) ORB cost by restricting
//! full scoring to a per-anchor pHash-proximity shortlist. Grounded on the
//! original pipeline's `group/group_and_metrics.py::build_similarity_edges`;
//! the per-anchor/per-pair fan-out is parallelized with `rayon` (§10.7),
//! grounded on the sibling `dysthesis-sift` crate's embarrassingly-parallel
//! `par_iter` use, since the teacher crate has no analogous CPU-bound batch
//! stage of its own.

use std::collections::BTreeMap;

use image::RgbaImage;
use rayon::prelude::*;

use crate::hashes;
use crate::model::{Edge, LogoFeatures, T_LINK};
use crate::shape;
use crate::similarity;

const SHORTLIST_MAX_DISTANCE: u32 = 16;
const SHORTLIST_SIZE: usize = 50;

/// Build all similarity edges `(left, right, score)` with `score >= T_LINK`
/// across every pair of sites in `features`. `images` supplies normalized
/// images for the ORB tiebreaker, keyed by website; a site missing from
/// `images` simply never gets an ORB blend (the base score is used as-is).
#[must_use]
pub fn build_edges(features: &BTreeMap<String, LogoFeatures>, images: &BTreeMap<String, RgbaImage>) -> Vec<Edge> {
    let keys: Vec<&String> = features.keys().collect();

    keys.par_iter()
        .flat_map(|&anchor| score_anchor(anchor, &keys, features, images))
        .collect()
}

fn score_anchor(
    anchor: &str,
    keys: &[&String],
    features: &BTreeMap<String, LogoFeatures>,
    images: &BTreeMap<String, RgbaImage>,
) -> Vec<Edge> {
    let anchor_features = &features[anchor];
    let shortlist = build_shortlist(anchor, anchor_features, keys, features);

    shortlist
        .into_iter()
        .filter(|other| other.as_str() > anchor)
        .filter_map(|other| score_pair(anchor, &other, features, images))
        .collect()
}

/// Other sites within `SHORTLIST_MAX_DISTANCE` pHash hamming distance of
/// `anchor`, closest first (ties broken by key ascending), capped at
/// `SHORTLIST_SIZE`.
fn build_shortlist(
    anchor: &str,
    anchor_features: &LogoFeatures,
    keys: &[&String],
    features: &BTreeMap<String, LogoFeatures>,
) -> Vec<String> {
    let mut candidates: Vec<(u32, &str)> = keys
        .iter()
        .filter(|&&k| k != anchor)
        .filter_map(|&k| {
            let distance = hashes::hamming_distance(&anchor_features.perceptual.phash, &features[k].perceptual.phash)?;
            (distance <= SHORTLIST_MAX_DISTANCE).then_some((distance, k.as_str()))
        })
        .collect();

    candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
    candidates.truncate(SHORTLIST_SIZE);
    candidates.into_iter().map(|(_, k)| k.to_string()).collect()
}

fn score_pair(
    left: &str,
    right: &str,
    features: &BTreeMap<String, LogoFeatures>,
    images: &BTreeMap<String, RgbaImage>,
) -> Option<Edge> {
    let a = &features[left];
    let b = &features[right];

    let components = similarity::components(a, b);
    let base = similarity::combine_components(&components);

    let score = if similarity::in_orb_band(base)
        && let (Some(img_a), Some(img_b)) = (images.get(left), images.get(right))
    {
        let orb = shape::orb_similarity(img_a, img_b);
        similarity::blend_with_orb(base, orb)
    } else {
        base
    };

    (score >= T_LINK).then(|| Edge { left: left.to_string(), right: right.to_string(), score })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PerceptualHashes;

    fn features(website: &str, phash: &str, hist: Vec<f64>) -> LogoFeatures {
        LogoFeatures {
            website: website.to_string(),
            original_path: None,
            normalized_path: None,
            preview_path: None,
            perceptual: PerceptualHashes { ahash: phash.to_string(), phash: phash.to_string(), dhash: phash.to_string() },
            hsv_histogram: hist,
            dominant_hues: vec![],
        }
    }

    #[test]
    fn identical_features_produce_an_edge_above_threshold() {
        let mut map = BTreeMap::new();
        map.insert("a.com".to_string(), features("a.com", "0000000000000000", vec![1.0; 432]));
        map.insert("b.com".to_string(), features("b.com", "0000000000000000", vec![1.0; 432]));
        let images = BTreeMap::new();

        let edges = build_edges(&map, &images);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].left, "a.com");
        assert_eq!(edges[0].right, "b.com");
        assert!(edges[0].score >= T_LINK);
    }

    #[test]
    fn dissimilar_features_produce_no_edge() {
        let mut map = BTreeMap::new();
        map.insert("a.com".to_string(), features("a.com", "0000000000000000", vec![1.0, 0.0].into_iter().cycle().take(432).collect()));
        map.insert("b.com".to_string(), features("b.com", "ffffffffffffffff", vec![0.0, 1.0].into_iter().cycle().take(432).collect()));
        let images = BTreeMap::new();

        let edges = build_edges(&map, &images);
        assert!(edges.is_empty());
    }

    #[test]
    fn emitted_edges_respect_lexicographic_ordering() {
        let mut map = BTreeMap::new();
        for key in ["z.com", "a.com", "m.com"] {
            map.insert(key.to_string(), features(key, "0000000000000000", vec![1.0; 432]));
        }
        let images = BTreeMap::new();
        let edges = build_edges(&map, &images);
        for edge in &edges {
            assert!(edge.left < edge.right);
        }
    }
}
