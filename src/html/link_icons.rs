//! Extractor 2: `<link rel="...">` icons (apple-touch-icon, icon, mask-icon).

use scraper::{Html, Selector};

use crate::error::ExtractorError;
use crate::model::{Candidate, CandidateContext, CandidateSource};
use crate::urlutil;

use super::is_valid_candidate_src;

pub fn extract(doc: &Html, base_url: &str) -> Result<Vec<Candidate>, ExtractorError> {
    let selector = Selector::parse("link").map_err(|e| ExtractorError {
        extractor: "link_icons",
        reason: e.to_string(),
    })?;

    let mut out = Vec::new();
    for link in doc.select(&selector) {
        let Some(rel_raw) = link.value().attr("rel") else { continue };
        let rel_values: Vec<String> = rel_raw.split_whitespace().map(str::to_ascii_lowercase).collect();
        if rel_values.is_empty() {
            continue;
        }

        let source = if rel_values.iter().any(|v| v.contains("apple-touch-icon")) {
            Some(CandidateSource::AppleTouch)
        } else if rel_values.iter().any(|v| v == "icon" || v.ends_with("icon")) {
            Some(CandidateSource::Icon)
        } else if rel_values.iter().any(|v| v.contains("mask-icon")) {
            Some(CandidateSource::Icon)
        } else {
            None
        };
        let Some(source) = source else { continue };

        let Some(href) = link.value().attr("href") else { continue };
        let Some(absolute) = urlutil::resolve(href, base_url) else { continue };
        if !is_valid_candidate_src(&absolute) {
            continue;
        }

        let mut context = CandidateContext::new();
        context.insert("tag".to_string(), "link".to_string());
        context.insert("rel".to_string(), rel_raw.to_string());
        if let Some(sizes) = link.value().attr("sizes") {
            context.insert("sizes".to_string(), sizes.to_string());
        }
        if let Some(ty) = link.value().attr("type") {
            context.insert("type".to_string(), ty.to_string());
        }
        if let Some(color) = link.value().attr("color") {
            context.insert("color".to_string(), color.to_string());
        }

        out.push(Candidate::new(absolute, source, source.default_confidence(), context));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_apple_touch_icon() {
        let doc = Html::parse_document(r#"<link rel="apple-touch-icon" href="/apple.png">"#);
        let out = extract(&doc, "https://example.com").unwrap();
        assert_eq!(out[0].source, CandidateSource::AppleTouch);
        assert!((out[0].confidence - 0.70).abs() < 1e-9);
    }

    #[test]
    fn classifies_plain_icon() {
        let doc = Html::parse_document(r#"<link rel="icon" href="/favicon.ico">"#);
        let out = extract(&doc, "https://example.com").unwrap();
        assert_eq!(out[0].source, CandidateSource::Icon);
    }

    #[test]
    fn classifies_shortcut_icon_suffix() {
        let doc = Html::parse_document(r#"<link rel="shortcut icon" href="/favicon.ico">"#);
        let out = extract(&doc, "https://example.com").unwrap();
        assert_eq!(out[0].source, CandidateSource::Icon);
    }

    #[test]
    fn classifies_mask_icon() {
        let doc = Html::parse_document(r#"<link rel="mask-icon" href="/mask.svg" color="#000">"#);
        let out = extract(&doc, "https://example.com").unwrap();
        assert_eq!(out[0].source, CandidateSource::Icon);
    }

    #[test]
    fn ignores_unrelated_rel() {
        let doc = Html::parse_document(r#"<link rel="stylesheet" href="/styles.css">"#);
        let out = extract(&doc, "https://example.com").unwrap();
        assert!(out.is_empty());
    }
}
