//! Extractor 1: JSON-LD `logo` fields (`<script type="application/ld+json">`).

use scraper::{Html, Selector};
use serde_json::Value;

use crate::error::ExtractorError;
use crate::model::{Candidate, CandidateContext, CandidateSource};
use crate::urlutil;

use super::is_valid_candidate_src;

pub fn extract(doc: &Html, base_url: &str) -> Result<Vec<Candidate>, ExtractorError> {
    let selector = Selector::parse("script").map_err(|e| ExtractorError {
        extractor: "jsonld_logo",
        reason: e.to_string(),
    })?;

    let mut out = Vec::new();
    for (index, script) in doc.select(&selector).enumerate() {
        let ty = script.value().attr("type").unwrap_or_default();
        if !ty.to_ascii_lowercase().contains("ld+json") {
            continue;
        }
        let text: String = script.text().collect();
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        let Ok(data) = serde_json::from_str::<Value>(text) else {
            continue;
        };
        collect_jsonld_logo_candidates(&data, base_url, index, &mut out);
    }

    Ok(out)
}

fn collect_jsonld_logo_candidates(data: &Value, base_url: &str, script_index: usize, out: &mut Vec<Candidate>) {
    for (path, node) in iter_dicts(data, Vec::new()) {
        let Some(logo) = node.get("logo") else { continue };
        let types = normalize_types(node.get("@type"));
        for logo_value in iter_logo_values(logo) {
            let Some(absolute) = urlutil::resolve(&logo_value, base_url) else { continue };
            if !is_valid_candidate_src(&absolute) {
                continue;
            }
            let mut context = CandidateContext::new();
            let mut full_path = path.clone();
            full_path.push("logo".to_string());
            context.insert("jsonld_path".to_string(), full_path.join("/"));
            if !types.is_empty() {
                context.insert("types".to_string(), types.join(","));
            }
            context.insert("script_index".to_string(), script_index.to_string());
            out.push(Candidate::new(
                absolute,
                CandidateSource::OrgLogo,
                CandidateSource::OrgLogo.default_confidence(),
                context,
            ));
        }
    }
}

/// Walk every nested JSON object, yielding `(path, object)` pairs (the JSON
/// equivalent of the python implementation's recursive `_iter_dicts`).
fn iter_dicts(data: &Value, path: Vec<String>) -> Vec<(Vec<String>, &serde_json::Map<String, Value>)> {
    let mut out = Vec::new();
    match data {
        Value::Object(map) => {
            out.push((path.clone(), map));
            for (key, value) in map {
                let mut next = path.clone();
                next.push(key.clone());
                out.extend(iter_dicts(value, next));
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                let mut next = path.clone();
                next.push(index.to_string());
                out.extend(iter_dicts(item, next));
            }
        }
        _ => {}
    }
    out
}

fn normalize_types(raw: Option<&Value>) -> Vec<String> {
    match raw {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(ToString::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn iter_logo_values(value: &Value) -> Vec<String> {
    let mut out = Vec::new();
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                out.push(trimmed.to_string());
            }
        }
        Value::Object(map) => {
            for key in ["@id", "url", "contentUrl", "href"] {
                if let Some(Value::String(s)) = map.get(key) {
                    let trimmed = s.trim();
                    if !trimmed.is_empty() {
                        out.push(trimmed.to_string());
                    }
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                out.extend(iter_logo_values(item));
            }
        }
        _ => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_string_logo() {
        let doc = Html::parse_document(
            r#"<script type="application/ld+json">{"@type":"Organization","logo":"https://cdn.example.com/logo.png"}</script>"#,
        );
        let out = extract(&doc, "https://example.com").unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].src, "https://cdn.example.com/logo.png");
        assert_eq!(out[0].confidence, 0.95);
    }

    #[test]
    fn extracts_object_logo_preferring_url_field() {
        let doc = Html::parse_document(
            r#"<script type="application/ld+json">{"logo":{"@id":"","url":"https://cdn.example.com/brand-logo.svg"}}</script>"#,
        );
        let out = extract(&doc, "https://example.com").unwrap();
        assert_eq!(out[0].src, "https://cdn.example.com/brand-logo.svg");
    }

    #[test]
    fn skips_invalid_json() {
        let doc = Html::parse_document(r#"<script type="application/ld+json">not json</script>"#);
        let out = extract(&doc, "https://example.com").unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn walks_nested_graph() {
        let doc = Html::parse_document(
            r#"<script type="application/ld+json">{"@graph":[{"@type":"Organization","logo":"https://cdn.example.com/logo.png"}]}</script>"#,
        );
        let out = extract(&doc, "https://example.com").unwrap();
        assert_eq!(out[0].src, "https://cdn.example.com/logo.png");
    }
}
