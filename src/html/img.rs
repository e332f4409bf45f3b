//! Extractor 4: logo-ish `<img>` tags, identified by id/alt/aria-label/
//! data-testid/class tokens matching `/logo|brand|mark/i`.

use scraper::{ElementRef, Html, Selector};

use crate::error::ExtractorError;
use crate::model::{Candidate, CandidateContext, CandidateSource};
use crate::urlutil;

use super::{is_valid_candidate_src, logo_keywords_match};

const SRC_ATTRS: &[&str] = &["src", "data-src", "data-lazy-src", "data-original", "data-hires"];

pub fn extract(doc: &Html, base_url: &str) -> Result<Vec<Candidate>, ExtractorError> {
    let selector = Selector::parse("img").map_err(|e| ExtractorError {
        extractor: "logo_images",
        reason: e.to_string(),
    })?;

    let mut out = Vec::new();
    for img in doc.select(&selector) {
        let descriptors = gather_descriptors(&img);
        if descriptors.trim().is_empty() || !logo_keywords_match(&descriptors) {
            continue;
        }
        let Some(raw_src) = resolve_img_src(&img) else { continue };
        let Some(absolute) = urlutil::resolve(&raw_src, base_url) else { continue };
        if !is_valid_candidate_src(&absolute) {
            continue;
        }

        let in_header = has_header_or_nav_ancestor(&img);
        let confidence = if in_header {
            CandidateSource::HeaderImg.default_confidence()
        } else {
            (CandidateSource::HeaderImg.default_confidence() - 0.05).max(0.0)
        };

        let mut context = CandidateContext::new();
        context.insert("tag".to_string(), "img".to_string());
        context.insert("in_header".to_string(), in_header.to_string());
        if let Some(id) = img.value().attr("id") {
            context.insert("id".to_string(), id.to_string());
        }
        if let Some(class) = img.value().attr("class") {
            context.insert("class".to_string(), class.to_string());
        }
        if let Some(alt) = img.value().attr("alt") {
            context.insert("alt".to_string(), alt.to_string());
        }

        out.push(Candidate::new(
            absolute,
            CandidateSource::HeaderImg,
            confidence,
            context,
        ));
    }

    Ok(out)
}

fn gather_descriptors(img: &ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    for attr in ["id", "alt", "aria-label", "data-testid", "class"] {
        if let Some(value) = img.value().attr(attr) {
            parts.push(value);
        }
    }
    parts.join(" ")
}

fn resolve_img_src(img: &ElementRef<'_>) -> Option<String> {
    for attr in SRC_ATTRS {
        if let Some(value) = img.value().attr(attr) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    let srcset = img.value().attr("srcset").or_else(|| img.value().attr("data-srcset"))?;
    let first = srcset.split(',').next()?.trim();
    if first.is_empty() {
        return None;
    }
    first.split_whitespace().next().map(str::to_string)
}

fn has_header_or_nav_ancestor(img: &ElementRef<'_>) -> bool {
    let mut current = *img;
    while let Some(parent) = current.parent().and_then(ElementRef::wrap) {
        let name = parent.value().name();
        if name == "header" || name == "nav" {
            return true;
        }
        current = parent;
    }
    false
}
