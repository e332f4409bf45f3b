//! Component C: image bytes fetcher and sniffer.

use std::time::Duration;

use base64::Engine as _;
use image::GenericImageView;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::ImageInfo;

const IMAGE_TIMEOUT: Duration = Duration::from_secs(10);

static SVG_DIMENSION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]*\.?[0-9]+)").expect("valid regex"));

/// Download raw bytes for an image URL. Best-effort: any transport error
/// (including non-2xx status) yields `None`.
pub async fn fetch_image_bytes(client: &reqwest::Client, url: &str, referer: Option<&str>) -> Option<Vec<u8>> {
    if url.is_empty() {
        return None;
    }
    let mut request = client
        .get(url)
        .timeout(IMAGE_TIMEOUT)
        .header(reqwest::header::ACCEPT, "image/*,*/*;q=0.8");
    if let Some(referer) = referer {
        request = request.header(reqwest::header::REFERER, referer);
    }
    let response = request.send().await.ok()?;
    if !response.status().is_success() {
        return None;
    }
    response.bytes().await.ok().map(|b| b.to_vec())
}

/// Decode a `data:` URI locally: split on the first `,`; base64-decode if
/// the header says `;base64`, else percent-decode the remainder.
#[must_use]
pub fn decode_data_uri(uri: &str) -> Option<Vec<u8>> {
    if !uri.starts_with("data:") {
        return None;
    }
    let (header, data) = uri.split_once(',')?;
    if header.contains(";base64") {
        base64::engine::general_purpose::STANDARD.decode(data).ok()
    } else {
        percent_decode(data)
    }
}

fn percent_decode(data: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len());
    let bytes = data.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok()?;
            let value = u8::from_str_radix(hex, 16).ok()?;
            out.push(value);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Some(out)
}

/// Sniff basic metadata from raw image bytes: try raster decoding first,
/// fall back to a minimal SVG sniff.
#[must_use]
pub fn sniff_image_info(bytes: &[u8]) -> Option<ImageInfo> {
    if bytes.is_empty() {
        return None;
    }
    if let Ok(img) = image::load_from_memory(bytes) {
        let (width, height) = img.dimensions();
        let has_alpha = img.color().has_alpha();
        let mime = image::guess_format(bytes).ok().map(|fmt| fmt.to_mime_type().to_string());
        let aspect_ratio = compute_aspect_ratio(Some(f64::from(width)), Some(f64::from(height)));
        return Some(ImageInfo {
            width: Some(f64::from(width)),
            height: Some(f64::from(height)),
            has_alpha,
            mime,
            aspect_ratio,
        });
    }
    sniff_svg_metadata(bytes)
}

static SVG_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<svg\b[^>]*>").expect("valid regex"));

fn sniff_svg_metadata(bytes: &[u8]) -> Option<ImageInfo> {
    let head: Vec<u8> = bytes.iter().skip_while(|b| b.is_ascii_whitespace()).take(512).copied().collect();
    let head_lower = String::from_utf8_lossy(&head).to_ascii_lowercase();
    if !head_lower.starts_with('<') || !head_lower.contains("<svg") {
        return None;
    }

    let text = String::from_utf8_lossy(bytes);
    let opening_tag = SVG_TAG_RE.find(&text)?.as_str();

    let mut width = attr_value(opening_tag, "width").and_then(|v| extract_numeric_prefix(&v));
    let mut height = attr_value(opening_tag, "height").and_then(|v| extract_numeric_prefix(&v));

    if (width.is_none() || height.is_none())
        && let Some(view_box) = attr_value(opening_tag, "viewBox")
    {
        let parts: Vec<&str> = view_box.split([' ', ',']).filter(|s| !s.is_empty()).collect();
        if parts.len() == 4 {
            width = width.or_else(|| parts[2].parse().ok());
            height = height.or_else(|| parts[3].parse().ok());
        }
    }

    let aspect_ratio = compute_aspect_ratio(width, height);
    Some(ImageInfo {
        width,
        height,
        has_alpha: true,
        mime: Some("image/svg+xml".to_string()),
        aspect_ratio,
    })
}

fn attr_value(tag: &str, attr: &str) -> Option<String> {
    let pattern = format!(r#"(?is)\b{}\s*=\s*["']([^"']+)["']"#, regex::escape(attr));
    let re = Regex::new(&pattern).ok()?;
    re.captures(tag).and_then(|c| c.get(1)).map(|m| m.as_str().trim().to_string())
}

fn extract_numeric_prefix(value: &str) -> Option<f64> {
    SVG_DIMENSION_RE.find(value)?.as_str().parse().ok()
}

fn compute_aspect_ratio(width: Option<f64>, height: Option<f64>) -> Option<f64> {
    match (width, height) {
        (Some(w), Some(h)) if h != 0.0 => Some(w / h),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_base64_data_uri() {
        let decoded = decode_data_uri("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(decoded, b"hello");
    }

    #[test]
    fn decodes_percent_encoded_data_uri() {
        let decoded = decode_data_uri("data:text/plain,hello%20world").unwrap();
        assert_eq!(decoded, b"hello world");
    }

    #[test]
    fn sniffs_svg_dimensions_from_attributes() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="120px" height="60"></svg>"#;
        let info = sniff_image_info(svg).unwrap();
        assert_eq!(info.width, Some(120.0));
        assert_eq!(info.height, Some(60.0));
        assert!(info.has_alpha);
        assert_eq!(info.mime.as_deref(), Some("image/svg+xml"));
    }

    #[test]
    fn sniffs_svg_dimensions_from_viewbox_fallback() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 200 100"></svg>"#;
        let info = sniff_image_info(svg).unwrap();
        assert_eq!(info.width, Some(200.0));
        assert_eq!(info.height, Some(100.0));
    }

    #[test]
    fn returns_none_for_garbage() {
        assert!(sniff_image_info(b"not an image").is_none());
    }
}
