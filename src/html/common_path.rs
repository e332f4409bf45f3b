//! Extractor 5: well-known logo paths, scanned from every attribute value in
//! the document and also synthesized directly against the base URL.

use scraper::{Html, Selector};

use crate::error::ExtractorError;
use crate::model::{Candidate, CandidateContext, CandidateSource};
use crate::urlutil;

use super::is_valid_candidate_src;

const COMMON_PATH_EXTS: &[&str] = &["svg", "png", "jpg", "jpeg", "webp"];
const COMMON_PATH_PREFIXES: &[&str] = &["/assets/logo", "/static/logo"];
const EXTRA_PATHS: &[&str] = &["/favicon.svg"];

pub fn extract(doc: &Html, base_url: &str) -> Result<Vec<Candidate>, ExtractorError> {
    let selector = Selector::parse("*").map_err(|e| ExtractorError {
        extractor: "common_path",
        reason: e.to_string(),
    })?;

    let mut out = Vec::new();
    let mut emitted = std::collections::BTreeSet::new();

    for element in doc.select(&selector) {
        for (_, value) in element.value().attrs() {
            if !matches_common_path(value) {
                continue;
            }
            let Some(absolute) = urlutil::resolve(value, base_url) else { continue };
            if !is_valid_candidate_src(&absolute) || !emitted.insert(absolute.clone()) {
                continue;
            }
            let mut context = CandidateContext::new();
            context.insert("detected_from".to_string(), "attribute".to_string());
            context.insert("value".to_string(), value.to_string());
            out.push(candidate(absolute, context));
        }
    }

    for generated in generate_common_paths(base_url) {
        if !emitted.insert(generated.clone()) {
            continue;
        }
        let mut context = CandidateContext::new();
        context.insert("detected_from".to_string(), "heuristic".to_string());
        context.insert(
            "value".to_string(),
            url::Url::parse(&generated).map_or_else(|_| generated.clone(), |u| u.path().to_string()),
        );
        out.push(candidate(generated, context));
    }

    Ok(out)
}

fn candidate(src: String, context: CandidateContext) -> Candidate {
    Candidate::new(
        src,
        CandidateSource::CommonPath,
        CandidateSource::CommonPath.default_confidence(),
        context,
    )
}

/// Scheme-stripped path component of an attribute value: parsed as an
/// absolute URL when possible (mirroring the original `urlparse(value).path`),
/// falling back to the raw value with any query/fragment trimmed when
/// `value` is relative and therefore not parseable on its own.
fn attribute_path(value: &str) -> String {
    url::Url::parse(value).map_or_else(
        |_| value.split(['?', '#']).next().unwrap_or("").to_string(),
        |url| url.path().to_string(),
    )
}

fn matches_common_path(value: &str) -> bool {
    let path = attribute_path(value).to_ascii_lowercase();
    if path.is_empty() {
        return false;
    }
    if EXTRA_PATHS.contains(&path.as_str()) {
        return true;
    }
    for ext in COMMON_PATH_EXTS {
        if path == format!("/logo.{ext}") {
            return true;
        }
    }
    for prefix in COMMON_PATH_PREFIXES {
        for ext in COMMON_PATH_EXTS {
            if path == format!("{prefix}.{ext}") {
                return true;
            }
        }
    }
    false
}

fn generate_common_paths(base_url: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut emitted = std::collections::BTreeSet::new();

    let mut push = |path: String, out: &mut Vec<String>| {
        if let Some(absolute) = urlutil::resolve(&path, base_url) {
            if emitted.insert(absolute.clone()) {
                out.push(absolute);
            }
        }
    };

    for ext in COMMON_PATH_EXTS {
        push(format!("/logo.{ext}"), &mut out);
    }
    for prefix in COMMON_PATH_PREFIXES {
        for ext in COMMON_PATH_EXTS {
            push(format!("{prefix}.{ext}"), &mut out);
        }
    }
    for extra in EXTRA_PATHS {
        push((*extra).to_string(), &mut out);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_logo_svg_attribute_anywhere() {
        let doc = Html::parse_document(r#"<div data-foo="/assets/logo.svg"></div>"#);
        let out = extract(&doc, "https://example.com").unwrap();
        assert!(out.iter().any(|c| c.src == "https://example.com/assets/logo.svg"));
    }

    #[test]
    fn finds_logo_svg_attribute_with_absolute_url() {
        let doc = Html::parse_document(r#"<div data-foo="https://cdn.example.com/assets/logo.png"></div>"#);
        let out = extract(&doc, "https://example.com").unwrap();
        assert!(out.iter().any(|c| c.src == "https://cdn.example.com/assets/logo.png"));
    }

    #[test]
    fn always_synthesizes_heuristic_paths() {
        let doc = Html::parse_document("<html></html>");
        let out = extract(&doc, "https://example.com").unwrap();
        assert!(out.iter().any(|c| c.src == "https://example.com/logo.svg"));
        assert!(out.iter().any(|c| c.src == "https://example.com/favicon.svg"));
    }
}
