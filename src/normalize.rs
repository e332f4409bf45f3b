//! Component E: normalizer. decode -> trim -> square-pad -> resize, grounded
//! on the original pipeline's `to_png_rgba` / `trim_and_square` / `resize_logo`
//! sequence (`extract/normalize.py`), reimplemented over the `image` crate
//! plus `resvg`/`usvg`/`tiny-skia` for SVG rasterization (§10.5).

use image::imageops::FilterType;
use image::{GenericImageView, Rgba, RgbaImage};

use crate::error::PipelineError;

/// Side of the final normalized square image.
pub const NORMALIZED_SIZE: u32 = 256;
/// Transparent padding added around trimmed content before resizing.
pub const PAD: u32 = 8;

const SVG_MIME_HINTS: &[&str] = &["image/svg+xml", "image/svg", "text/svg"];
const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Full pipeline: decode (rasterizing SVG first if needed) -> trim -> pad to
/// a square -> resize to [`NORMALIZED_SIZE`] x [`NORMALIZED_SIZE`] RGBA.
pub fn normalize_logo(website: &str, bytes: &[u8], mime_hint: Option<&str>) -> Result<RgbaImage, PipelineError> {
    let rgba = decode_to_rgba(website, bytes, mime_hint)?;
    let trimmed = trim(&rgba);
    let squared = square_pad(&trimmed, PAD);
    Ok(resize(&squared, NORMALIZED_SIZE))
}

fn decode_to_rgba(website: &str, bytes: &[u8], mime_hint: Option<&str>) -> Result<RgbaImage, PipelineError> {
    if bytes.is_empty() {
        return invalid_image(website, "empty image payload");
    }

    let hint_is_svg = mime_hint.is_some_and(|m| SVG_MIME_HINTS.contains(&m.to_ascii_lowercase().as_str()));
    let is_svg = hint_is_svg || looks_like_svg(bytes);

    // OQ-1: a failed rasterization is not special-cased — we simply attempt
    // to decode whatever `working` ended up being, and let it fail naturally.
    let working: std::borrow::Cow<'_, [u8]> = if is_svg {
        rasterize_svg_to_png(bytes).map_or(std::borrow::Cow::Borrowed(bytes), std::borrow::Cow::Owned)
    } else {
        std::borrow::Cow::Borrowed(bytes)
    };

    image::load_from_memory(&working)
        .map(|img| img.to_rgba8())
        .map_err(|e| PipelineError::InvalidImage {
            website: website.to_string(),
            reason: e.to_string(),
        })
}

fn invalid_image(website: &str, reason: &str) -> Result<RgbaImage, PipelineError> {
    Err(PipelineError::InvalidImage {
        website: website.to_string(),
        reason: reason.to_string(),
    })
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head: Vec<u8> = bytes.iter().skip_while(|b| b.is_ascii_whitespace()).take(512).copied().collect();
    let lower = String::from_utf8_lossy(&head).to_ascii_lowercase();
    lower.starts_with("<svg") || (lower.starts_with("<?xml") && lower.contains("<svg"))
}

fn rasterize_svg_to_png(bytes: &[u8]) -> Option<Vec<u8>> {
    let options = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &options).ok()?;
    let size = tree.size();
    let (width, height) = (size.width().max(1.0).round() as u32, size.height().max(1.0).round() as u32);

    let mut pixmap = tiny_skia::Pixmap::new(width, height)?;
    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());
    pixmap.encode_png().ok()
}

/// Crop to the bounding box of non-transparent pixels, falling back to a
/// bounding box of pixels differing from the top-left pixel's colour when
/// the image is fully opaque (or the alpha bbox is empty).
fn trim(img: &RgbaImage) -> RgbaImage {
    let bbox = alpha_bbox(img).or_else(|| color_bbox(img));
    let Some((x, y, w, h)) = bbox else {
        return img.clone();
    };
    if w == 0 || h == 0 {
        return img.clone();
    }
    image::imageops::crop_imm(img, x, y, w, h).to_image()
}

/// `(x, y, width, height)` bounding box of pixels with nonzero alpha, or
/// `None` if every pixel is fully transparent.
fn alpha_bbox(img: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
    bbox_where(img, |p| p[3] != 0)
}

/// Bounding box of pixels whose colour differs from the top-left pixel.
fn color_bbox(img: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    let background = *img.get_pixel(0, 0);
    bbox_where(img, |p| *p != background)
}

fn bbox_where(img: &RgbaImage, predicate: impl Fn(&Rgba<u8>) -> bool) -> Option<(u32, u32, u32, u32)> {
    let (width, height) = img.dimensions();
    let (mut min_x, mut min_y) = (width, height);
    let (mut max_x, mut max_y) = (0u32, 0u32);
    let mut found = false;

    for (x, y, pixel) in img.enumerate_pixels() {
        if predicate(pixel) {
            found = true;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    if !found {
        return None;
    }
    Some((min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}

/// Place `img` centred on a transparent square canvas whose side is
/// `max(w,h) + 2*pad`.
fn square_pad(img: &RgbaImage, pad: u32) -> RgbaImage {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return img.clone();
    }
    let side = w.max(h) + pad * 2;
    let mut canvas = RgbaImage::from_pixel(side, side, TRANSPARENT);
    let offset_x = (side - w) / 2;
    let offset_y = (side - h) / 2;
    image::imageops::overlay(&mut canvas, img, i64::from(offset_x), i64::from(offset_y));
    canvas
}

/// Resize to `size` x `size` with Lanczos3 resampling.
fn resize(img: &RgbaImage, size: u32) -> RgbaImage {
    image::imageops::resize(img, size, size, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_png(w: u32, h: u32, color: Rgba<u8>) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, color);
        let mut out = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn normalizes_to_256x256_rgba() {
        let bytes = solid_png(64, 32, Rgba([10, 20, 30, 255]));
        let out = normalize_logo("example.com", &bytes, Some("image/png")).unwrap();
        assert_eq!(out.dimensions(), (NORMALIZED_SIZE, NORMALIZED_SIZE));
    }

    #[test]
    fn empty_payload_fails_invalid_image() {
        let err = normalize_logo("example.com", &[], None).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidImage { .. }));
    }

    #[test]
    fn garbage_bytes_fail_invalid_image() {
        let err = normalize_logo("example.com", b"not an image", None).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidImage { .. }));
    }

    #[test]
    fn trim_crops_uniform_border() {
        let mut img = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 0]));
        for x in 2..6 {
            for y in 3..7 {
                img.put_pixel(x, y, Rgba([255, 0, 0, 255]));
            }
        }
        let trimmed = trim(&img);
        assert_eq!(trimmed.dimensions(), (4, 4));
    }

    #[test]
    fn square_pad_centers_content_with_padding() {
        let img = RgbaImage::from_pixel(4, 2, Rgba([1, 2, 3, 255]));
        let squared = square_pad(&img, 8);
        assert_eq!(squared.dimensions(), (20, 20));
        // content should be centred: offset_x=(20-4)/2=8, offset_y=(20-2)/2=9
        assert_eq!(*squared.get_pixel(8, 9), Rgba([1, 2, 3, 255]));
        assert_eq!(squared.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn svg_input_rasterizes_before_decode() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="40"><rect width="40" height="40" fill="#ff0000"/></svg>"#;
        let out = normalize_logo("example.com", svg, Some("image/svg+xml")).unwrap();
        assert_eq!(out.dimensions(), (NORMALIZED_SIZE, NORMALIZED_SIZE));
    }
}
