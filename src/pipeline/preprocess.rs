//! Image preprocessing: re-encode the caller's bytes for the multimodal API.
//!
//! Invoice photos arrive in every state — phone shots at an angle, faded fax
//! scans, 40-megapixel flatbed output. This stage normalises them: RGB
//! colour, a capped longest edge, and (optionally) a sharpening/contrast
//! pass tuned for printed text on paper.
//!
//! ## Why PNG?
//! Lossless compression preserves text crispness. JPEG artefacts on small
//! digits confuse vision models exactly where invoices matter most — in the
//! amount columns.
//!
//! ## Failure policy
//! This stage never fails the extraction. If the bytes do not decode as an
//! image, they are passed through untouched — the model may still be able to
//! read a format this crate does not, and a decode bug here must not mask a
//! perfectly good upload.

use crate::config::ExtractionConfig;
use crate::provider::ImagePayload;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::{debug, warn};

/// Mean luma below which a scan is considered dark enough to lift.
const DARK_SCAN_THRESHOLD: f64 = 120.0;

/// Preprocess raw image bytes into a payload ready for the model call.
pub fn preprocess_image(bytes: &[u8], config: &ExtractionConfig) -> ImagePayload {
    let img = match image::load_from_memory(bytes) {
        Ok(img) => img,
        Err(e) => {
            warn!("image preprocessing skipped, passing bytes through: {e}");
            return ImagePayload::new(bytes.to_vec(), guess_mime(bytes));
        }
    };

    let (orig_w, orig_h) = (img.width(), img.height());
    let mut img = DynamicImage::ImageRgb8(img.to_rgb8());

    // Cap the longest edge; LLM APIs reject oversized bodies and gain nothing
    // from pixel densities beyond what the model's tiling can see.
    let max_dim = config.max_image_dimension;
    if img.width().max(img.height()) > max_dim {
        img = img.resize(max_dim, max_dim, FilterType::Lanczos3);
        debug!(
            "resized {}x{} -> {}x{}",
            orig_w,
            orig_h,
            img.width(),
            img.height()
        );
    }

    if config.enhance {
        img = enhance(img);
    }

    let mut buf = Vec::new();
    match img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png) {
        Ok(()) => {
            debug!(
                input_bytes = bytes.len(),
                output_bytes = buf.len(),
                "image preprocessed"
            );
            ImagePayload::new(buf, "image/png")
        }
        Err(e) => {
            warn!("PNG re-encode failed, passing original bytes through: {e}");
            ImagePayload::new(bytes.to_vec(), guess_mime(bytes))
        }
    }
}

/// Sharpening and contrast pass for printed text, plus a brightness lift for
/// dark scans.
fn enhance(img: DynamicImage) -> DynamicImage {
    // Unsharp mask first: edge definition on glyphs, then global contrast so
    // text separates from the paper background.
    let img = img.unsharpen(1.0, 3);
    let img = img.adjust_contrast(20.0);

    if mean_luma(&img) < DARK_SCAN_THRESHOLD {
        debug!("dark scan detected, lifting brightness");
        img.brighten(12)
    } else {
        img
    }
}

/// Average luma over the image, ITU-R BT.601 weights.
fn mean_luma(img: &DynamicImage) -> f64 {
    let rgb = img.to_rgb8();
    let pixels = (rgb.width() as u64 * rgb.height() as u64).max(1);
    let sum: f64 = rgb
        .pixels()
        .map(|p| 0.299 * p.0[0] as f64 + 0.587 * p.0[1] as f64 + 0.114 * p.0[2] as f64)
        .sum();
    sum / pixels as f64
}

/// Best-effort mime type for passthrough bytes.
fn guess_mime(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        _ => "image/png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn png_bytes(img: &RgbImage) -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img.clone())
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .expect("encode");
        buf
    }

    #[test]
    fn reencodes_to_png() {
        let src = png_bytes(&RgbImage::from_pixel(40, 30, Rgb([200, 200, 200])));
        let payload = preprocess_image(&src, &ExtractionConfig::default());
        assert_eq!(payload.mime_type, "image/png");
        let decoded = image::load_from_memory(&payload.data).expect("valid PNG out");
        assert_eq!((decoded.width(), decoded.height()), (40, 30));
    }

    #[test]
    fn caps_longest_edge() {
        let config = ExtractionConfig::builder()
            .max_image_dimension(256)
            .build()
            .unwrap();
        let src = png_bytes(&RgbImage::from_pixel(1024, 512, Rgb([255, 255, 255])));
        let payload = preprocess_image(&src, &config);
        let decoded = image::load_from_memory(&payload.data).unwrap();
        assert_eq!(decoded.width(), 256);
        assert_eq!(decoded.height(), 128, "aspect ratio preserved");
    }

    #[test]
    fn garbage_bytes_pass_through_unchanged() {
        let src = b"definitely not an image".to_vec();
        let payload = preprocess_image(&src, &ExtractionConfig::default());
        assert_eq!(payload.data, src);
    }

    #[test]
    fn dark_image_is_brightened() {
        let dark = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([30, 30, 30])));
        let before = mean_luma(&dark);
        let after = mean_luma(&enhance(dark));
        assert!(after > before, "expected {after} > {before}");
    }
}
