//! Extractor 3: social meta tags (`og:image`, `twitter:image[:src]`).

use scraper::{Html, Selector};

use crate::error::ExtractorError;
use crate::model::{Candidate, CandidateContext, CandidateSource};
use crate::urlutil;

use super::is_valid_candidate_src;

pub fn extract(doc: &Html, base_url: &str) -> Result<Vec<Candidate>, ExtractorError> {
    let selector = Selector::parse("meta").map_err(|e| ExtractorError {
        extractor: "meta_social",
        reason: e.to_string(),
    })?;

    let mut out = Vec::new();
    for meta in doc.select(&selector) {
        let key_raw = meta
            .value()
            .attr("property")
            .or_else(|| meta.value().attr("name"));
        let Some(key_raw) = key_raw else { continue };
        let key = key_raw.to_ascii_lowercase();
        if key != "og:image" && key != "twitter:image" && key != "twitter:image:src" {
            continue;
        }
        let Some(content) = meta.value().attr("content") else { continue };
        let Some(absolute) = urlutil::resolve(content, base_url) else { continue };
        if !is_valid_candidate_src(&absolute) {
            continue;
        }

        let source = if key == "og:image" {
            CandidateSource::OgImage
        } else {
            CandidateSource::TwitterImage
        };

        let mut context = CandidateContext::new();
        context.insert("tag".to_string(), "meta".to_string());
        context.insert("key".to_string(), key_raw.to_string());
        context.insert("content".to_string(), content.to_string());

        out.push(Candidate::new(absolute, source, source.default_confidence(), context));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_og_image() {
        let doc = Html::parse_document(r#"<meta property="og:image" content="/img/logo.png">"#);
        let out = extract(&doc, "https://example.com").unwrap();
        assert_eq!(out[0].source, CandidateSource::OgImage);
        assert_eq!(out[0].src, "https://example.com/img/logo.png");
    }

    #[test]
    fn extracts_twitter_image_variants() {
        let doc = Html::parse_document(
            r#"<meta name="twitter:image:src" content="https://cdn.example.com/logo.jpg">"#,
        );
        let out = extract(&doc, "https://example.com").unwrap();
        assert_eq!(out[0].source, CandidateSource::TwitterImage);
    }

    #[test]
    fn rejects_implausible_filename() {
        let doc =
            Html::parse_document(r#"<meta property="og:image" content="https://cdn.example.com/hero-banner.jpg">"#);
        let out = extract(&doc, "https://example.com").unwrap();
        assert!(out.is_empty());
    }
}
