//! Component D: candidate selector. Scores candidates, optionally fetches
//! bytes for the first few, and returns the best one.

use crate::fetch::image_fetcher::{decode_data_uri, fetch_image_bytes, sniff_image_info};
use crate::model::Candidate;
use crate::urlutil;

const MAX_FETCH: usize = 6;

/// Selection mode: `Lazy` never fetches bytes; `Eager` fetches up to
/// `MAX_FETCH` candidates' bytes before scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Lazy,
    Eager,
}

/// Heuristic score for `candidate`, optionally informed by sniffed image
/// metadata. Not clamped — used only for ranking.
#[must_use]
pub fn score_candidate(candidate: &Candidate) -> f64 {
    let mut score = candidate.confidence;
    let Some(info) = &candidate.image_info else {
        return score;
    };

    if info.has_alpha {
        score += 0.05;
    }
    if let Some(ratio) = info.aspect_ratio
        && (0.8..=5.0).contains(&ratio)
    {
        score += 0.05;
    }
    if let Some(min_dim) = info.min_dim()
        && min_dim < 48.0
    {
        score -= 0.10;
    }
    let oversized_opaque = matches!((info.width, info.height), (Some(w), Some(h)) if w > 1024.0 && h > 1024.0 && !info.has_alpha);
    if info.aspect_ratio.is_some_and(|r| r > 6.0) || oversized_opaque {
        score -= 0.15;
    }

    score
}

/// Run Component D over `candidates`. Returns `None` for an empty list.
/// In `Lazy` mode, the top (by confidence) candidate is returned with
/// `resolved_src` filled in but no bytes fetched. In `Eager` mode, the first
/// `MAX_FETCH` candidates (by confidence) attempt a byte fetch; the
/// highest-scoring candidate that also has bytes wins, falling back to the
/// highest-scoring candidate overall if none fetched successfully.
pub async fn select_best(
    client: &reqwest::Client,
    candidates: &[Candidate],
    base_url: &str,
    mode: Mode,
) -> Option<Candidate> {
    if candidates.is_empty() {
        return None;
    }

    let mut ordered: Vec<Candidate> = candidates.to_vec();
    ordered.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal));

    if mode == Mode::Lazy {
        let mut top = ordered.into_iter().next()?;
        if let Some(resolved) = resolve_candidate_src(&top.src, base_url) {
            top.resolved_src.get_or_insert(resolved);
        }
        return Some(top);
    }

    let mut best_with_bytes: Option<(Candidate, f64)> = None;
    let mut fallback: Option<(Candidate, f64)> = None;

    for (index, mut candidate) in ordered.into_iter().enumerate() {
        if let Some(resolved) = resolve_candidate_src(&candidate.src, base_url) {
            candidate.resolved_src.get_or_insert(resolved);
        }

        let mut image_bytes = None;
        if index < MAX_FETCH {
            image_bytes = load_candidate_bytes(client, candidate.resolved_src.as_deref(), base_url).await;
            if let Some(bytes) = &image_bytes {
                if let Some(info) = sniff_image_info(bytes) {
                    candidate.image_info = Some(info);
                }
                candidate.image_bytes = Some(bytes.clone());
            }
        }

        let score = score_candidate(&candidate);

        if fallback.as_ref().is_none_or(|(_, s)| score > *s) {
            fallback = Some((candidate.clone(), score));
        }

        if image_bytes.is_some() && best_with_bytes.as_ref().is_none_or(|(_, s)| score > *s) {
            best_with_bytes = Some((candidate, score));
        }
    }

    best_with_bytes.or(fallback).map(|(candidate, _)| candidate)
}

async fn load_candidate_bytes(client: &reqwest::Client, src: Option<&str>, referer: &str) -> Option<Vec<u8>> {
    let src = src?;
    if src.starts_with("data:") {
        decode_data_uri(src)
    } else {
        fetch_image_bytes(client, src, Some(referer)).await
    }
}

fn resolve_candidate_src(src: &str, base_url: &str) -> Option<String> {
    if src.starts_with("data:") {
        return Some(src.to_string());
    }
    urlutil::resolve(src, base_url).or_else(|| Some(src.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CandidateContext, CandidateSource, ImageInfo};

    fn candidate(confidence: f64) -> Candidate {
        Candidate::new(
            "https://example.com/logo.png".into(),
            CandidateSource::OrgLogo,
            confidence,
            CandidateContext::new(),
        )
    }

    #[test]
    fn empty_candidate_list_scores_nothing() {
        assert!(score_candidate(&candidate(0.5)) == 0.5);
    }

    #[test]
    fn scoring_rewards_alpha_and_good_aspect() {
        let mut c = candidate(0.5);
        c.image_info = Some(ImageInfo {
            width: Some(200.0),
            height: Some(100.0),
            has_alpha: true,
            mime: None,
            aspect_ratio: Some(2.0),
        });
        assert!((score_candidate(&c) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn scoring_penalizes_tiny_images() {
        let mut c = candidate(0.5);
        c.image_info = Some(ImageInfo {
            width: Some(20.0),
            height: Some(20.0),
            has_alpha: false,
            mime: None,
            aspect_ratio: Some(1.0),
        });
        assert!((score_candidate(&c) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn scoring_penalizes_oversized_opaque_images() {
        let mut c = candidate(0.5);
        c.image_info = Some(ImageInfo {
            width: Some(2000.0),
            height: Some(2000.0),
            has_alpha: false,
            mime: None,
            aspect_ratio: Some(1.0),
        });
        assert!((score_candidate(&c) - 0.35).abs() < 1e-9);
    }

    #[tokio::test]
    async fn lazy_mode_never_fetches_bytes() {
        let client = reqwest::Client::new();
        let candidates = vec![candidate(0.9), candidate(0.5)];
        let best = select_best(&client, &candidates, "https://example.com", Mode::Lazy)
            .await
            .unwrap();
        assert!(best.image_bytes.is_none());
        assert!(best.resolved_src.is_some());
    }

    #[tokio::test]
    async fn data_uri_candidate_yields_bytes_without_http() {
        let client = reqwest::Client::new();
        let mut c = candidate(0.9);
        c.src = "data:image/png;base64,aGVsbG8=".into();
        let best = select_best(&client, &[c], "https://example.com", Mode::Eager)
            .await
            .unwrap();
        assert_eq!(best.image_bytes.as_deref(), Some(b"hello".as_slice()));
    }

    #[tokio::test]
    async fn empty_candidates_returns_none() {
        let client = reqwest::Client::new();
        assert!(select_best(&client, &[], "https://example.com", Mode::Eager).await.is_none());
    }
}
