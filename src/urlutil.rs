//! Component A: URL resolution. Joins a possibly-relative candidate URL
//! against a base URL, coerces schemes, and validates the result.

use url::Url;

/// Resolve `raw` against `base`, returning `None` on parse/join failure or an
/// unsupported scheme. `data:` URIs pass through unchanged.
#[must_use]
pub fn resolve(raw: &str, base: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with("data:") {
        return Some(trimmed.to_string());
    }

    let base_url = Url::parse(base).ok()?;
    let joined = base_url.join(trimmed).ok()?;
    if !matches!(joined.scheme(), "http" | "https") {
        return None;
    }
    Some(joined.to_string())
}

/// Coerce a scheme-less top-level input line (read from `--input`) to
/// `https://`, matching §6.
#[must_use]
pub fn coerce_scheme(line: &str) -> String {
    let trimmed = line.trim();
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// Derive a filesystem/host-safe label for a site from its URL: netloc (or
/// path if there's no netloc), with any character outside
/// `[A-Za-z0-9._-]` replaced by `_`, leading/trailing `._-` stripped, and a
/// `site` fallback if the result is empty.
#[must_use]
pub fn host_label(url: &str) -> String {
    let raw = Url::parse(url).ok().map_or_else(
        || url.to_string(),
        |u| {
            u.host_str().map_or_else(
                || u.path().to_string(),
                |h| {
                    if let Some(port) = u.port() {
                        format!("{h}:{port}")
                    } else {
                        h.to_string()
                    }
                },
            )
        },
    );

    let sanitized: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = sanitized.trim_matches(|c| c == '.' || c == '_' || c == '-');
    if trimmed.is_empty() {
        "site".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_path_against_base() {
        assert_eq!(
            resolve("/logo.png", "https://example.com/about").as_deref(),
            Some("https://example.com/logo.png")
        );
    }

    #[test]
    fn passes_data_uri_through_unchanged() {
        let uri = "data:image/png;base64,Zm9v";
        assert_eq!(resolve(uri, "https://example.com").as_deref(), Some(uri));
    }

    #[test]
    fn rejects_non_http_scheme() {
        assert_eq!(resolve("ftp://example.com/x.png", "https://example.com"), None);
    }

    #[test]
    fn rejects_unparseable_base() {
        assert_eq!(resolve("/x.png", "not a url"), None);
    }

    #[test]
    fn coerces_missing_scheme_to_https() {
        assert_eq!(coerce_scheme("example.com"), "https://example.com");
        assert_eq!(coerce_scheme("http://example.com"), "http://example.com");
    }

    #[test]
    fn host_label_sanitizes_netloc() {
        assert_eq!(host_label("https://Example.com:8080/a"), "Example.com_8080");
        assert_eq!(host_label("https://foo.bar/"), "foo.bar");
    }

    #[test]
    fn host_label_falls_back_to_site() {
        assert_eq!(host_label("..."), "site");
    }
}
