//! Data model shared across the pipeline: candidates, image metadata, and the
//! per-site feature record produced once a logo has been selected and
//! normalized.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Similarity threshold above which two sites are linked into the same group.
pub const T_LINK: f64 = 0.72;
/// Similarity threshold above which two sites are considered strongly confirmed matches.
pub const T_CONFIRM: f64 = 0.86;

/// Provenance of a discovered logo candidate, in extractor run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    OrgLogo,
    AppleTouch,
    Icon,
    OgImage,
    TwitterImage,
    HeaderImg,
    CommonPath,
    CssBg,
}

impl CandidateSource {
    /// Default confidence assigned by the extractor that produces this source.
    #[must_use]
    pub const fn default_confidence(self) -> f64 {
        match self {
            Self::OrgLogo => 0.95,
            Self::AppleTouch => 0.70,
            Self::Icon => 0.55,
            Self::OgImage | Self::TwitterImage => 0.60,
            Self::HeaderImg => 0.80,
            Self::CommonPath => 0.65,
            Self::CssBg => 0.60,
        }
    }
}

/// Free-form diagnostic context attached to a candidate, kept as an ordered
/// string map rather than a dynamic JSON value so unknown fields are simply
/// never inserted instead of round-tripping arbitrary shapes.
pub type CandidateContext = BTreeMap<String, String>;

/// Basic metadata sniffed from a raw (possibly undecodable) image payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub has_alpha: bool,
    pub mime: Option<String>,
    pub aspect_ratio: Option<f64>,
}

impl ImageInfo {
    #[must_use]
    pub fn min_dim(&self) -> Option<f64> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some(w.min(h)),
            _ => None,
        }
    }
}

/// A proposed logo location, discovered by one of Component B's extractors.
/// Transient: it exists only while a single site is going through selection.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub src: String,
    pub source: CandidateSource,
    pub confidence: f64,
    pub context: CandidateContext,
    pub resolved_src: Option<String>,
    pub image_bytes: Option<Vec<u8>>,
    pub image_info: Option<ImageInfo>,
}

impl Candidate {
    #[must_use]
    pub fn new(src: String, source: CandidateSource, confidence: f64, context: CandidateContext) -> Self {
        Self {
            src,
            source,
            confidence,
            context,
            resolved_src: None,
            image_bytes: None,
            image_info: None,
        }
    }
}

/// The three 8x8 perceptual hashes computed over a normalized logo, each a
/// 16-character lowercase hex string (64 bits).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerceptualHashes {
    pub ahash: String,
    pub phash: String,
    pub dhash: String,
}

/// One record per site that made it all the way through selection,
/// normalization and featurization. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoFeatures {
    pub website: String,
    pub original_path: Option<String>,
    pub normalized_path: Option<String>,
    pub preview_path: Option<String>,
    pub perceptual: PerceptualHashes,
    pub hsv_histogram: Vec<f64>,
    pub dominant_hues: Vec<u32>,
}

/// A similarity edge between two sites: `left < right` lexicographically,
/// `score` in `[T_LINK, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub left: String,
    pub right: String,
    pub score: f64,
}

/// One output group: a cluster id and its sorted members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub group_id: String,
    pub members: Vec<String>,
}

/// Final pipeline metrics, written to `metrics.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metrics {
    pub total: usize,
    pub extracted: usize,
    pub coverage: f64,
    pub pairs: usize,
    pub groups: usize,
    pub largest_group: usize,
    pub threshold: f64,
}
