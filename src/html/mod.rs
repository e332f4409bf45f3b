//! Component B: candidate discovery. Six extractors run in a fixed order
//! over a parsed HTML document and emit [`Candidate`]s, deduplicated by
//! absolute `src` across all of them. Per-extractor failures are isolated:
//! the orchestrator logs and moves on to the next extractor.

mod common_path;
mod img;
mod jsonld;
mod link_icons;
mod meta;

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

use crate::error::ExtractorError;
use crate::model::Candidate;

static UNLIKELY_FILENAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)hero|banner|placeholder|header|cover|background|slider").expect("valid regex")
});
static LOGO_KEYWORDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)logo|brand|mark").expect("valid regex"));

const LOGO_FILENAME_EXTS: &[&str] = &["svg", "png", "jpg", "jpeg", "webp", "ico", "gif"];

type ExtractorFn = fn(&Html, &str) -> Result<Vec<Candidate>, ExtractorError>;
type Extractor = (&'static str, ExtractorFn);

const EXTRACTORS: &[Extractor] = &[
    ("jsonld_logo", jsonld::extract),
    ("link_icons", link_icons::extract),
    ("meta_social", meta::extract),
    ("logo_images", img::extract),
    ("common_path", common_path::extract),
    ("css_backgrounds", css_backgrounds_stub),
];

/// A reserved hook for a future rendered-DOM pass; intentionally a no-op.
fn css_backgrounds_stub(_doc: &Html, _base_url: &str) -> Result<Vec<Candidate>, ExtractorError> {
    Ok(Vec::new())
}

/// Run all six extractors over `html` in fixed order, deduplicating by
/// absolute `src`. Each extractor is isolated: a panic-free logical failure
/// (we model Rust extractors as infallible `Vec` producers, but keep the
/// `Result` seam here so a future extractor that can fail plugs in cleanly)
/// never aborts discovery for the remaining extractors.
#[must_use]
pub fn discover_candidates(html: &str, base_url: &str) -> Vec<Candidate> {
    let doc = Html::parse_document(html);
    let mut results = Vec::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();

    for (name, extractor) in EXTRACTORS {
        match extractor(&doc, base_url) {
            Ok(candidates) => {
                for candidate in candidates {
                    if seen.insert(candidate.src.clone()) {
                        results.push(candidate);
                    }
                }
            }
            Err(err) => {
                tracing::debug!(extractor = name, error = %err, "candidate extractor failed");
            }
        }
    }

    results
}

/// Plausible-filename filter applied to every candidate's resolved path:
/// reject `hero|banner|placeholder|header|cover|background|slider`-looking
/// names, reject unknown extensions, otherwise accept when the filename
/// carries a logo-ish keyword or a recognised image extension.
#[must_use]
pub fn is_plausible_logo_filename(path: &str) -> bool {
    if path.is_empty() {
        return true;
    }
    let sanitized = path.split(['?', '#']).next().unwrap_or("");
    if sanitized.is_empty() {
        return true;
    }
    let filename = sanitized.rsplit('/').next().unwrap_or(sanitized);
    if filename.is_empty() {
        return true;
    }
    let lower = filename.to_ascii_lowercase();
    if UNLIKELY_FILENAME.is_match(&lower) {
        return false;
    }
    if let Some(ext) = lower.rsplit_once('.').map(|(_, e)| e) {
        if !LOGO_FILENAME_EXTS.contains(&ext) {
            return false;
        }
    }
    let keywords = ["logo", "brand", "icon", "mark", "favicon"];
    if keywords.iter().any(|k| lower.contains(k)) {
        return true;
    }
    LOGO_FILENAME_EXTS.iter().any(|ext| lower.ends_with(&format!(".{ext}")))
}

/// True when `src` is a valid candidate: `data:` URIs always pass; otherwise
/// the scheme must be absent or http(s), and the path must look plausible.
#[must_use]
pub(crate) fn is_valid_candidate_src(src: &str) -> bool {
    if src.starts_with("data:") {
        return true;
    }
    let Ok(parsed) = url::Url::parse(src) else {
        return false;
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }
    is_plausible_logo_filename(parsed.path())
}

pub(crate) fn logo_keywords_match(haystack: &str) -> bool {
    LOGO_KEYWORDS.is_match(haystack)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_filter_rejects_hero_banner() {
        assert!(!is_plausible_logo_filename("/img/hero-banner.jpg"));
    }

    #[test]
    fn filename_filter_accepts_logo_keyword() {
        assert!(is_plausible_logo_filename("/assets/site-logo.svg"));
    }

    #[test]
    fn filename_filter_rejects_unknown_extension() {
        assert!(!is_plausible_logo_filename("/assets/thing.exe"));
    }

    #[test]
    fn discover_candidates_dedupes_by_src() {
        let html = r#"
            <html><head>
            <link rel="icon" href="/favicon.ico">
            </head><body>
            <img id="logo" src="/favicon.ico">
            </body></html>
        "#;
        let candidates = discover_candidates(html, "https://example.com");
        let count = candidates
            .iter()
            .filter(|c| c.src == "https://example.com/favicon.ico")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn discover_candidates_favors_jsonld_then_icon_order() {
        let html = r#"
            <html><head>
            <script type="application/ld+json">{"@type":"Organization","logo":"https://cdn.example.com/logo.png"}</script>
            <link rel="icon" href="/favicon.ico">
            </head></html>
        "#;
        let candidates = discover_candidates(html, "https://example.com");
        assert_eq!(candidates[0].src, "https://cdn.example.com/logo.png");
        assert_eq!(candidates[1].src, "https://example.com/favicon.ico");
    }
}
