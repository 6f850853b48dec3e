//! Annotated-image rendering.
//!
//! Draws each detection's box on the source blueprint in its category
//! color, with a blossom dot on flowering symbols. This is a side output
//! for display; the authoritative data stays in the markers and CSV.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use thiserror::Error;

use crate::markers::category_color;
use detection::ParsedDetection;

const BOX_THICKNESS: i32 = 2;
const BLOSSOM_COLOR: Rgba<u8> = Rgba([0xFF, 0x69, 0xB4, 0xFF]);
const BLOSSOM_RADIUS: i32 = 5;

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("image decode failed: {0}")]
    ImageDecode(String),

    #[error("image encode failed: {0}")]
    ImageEncode(String),
}

/// Render detections onto the source image and return it PNG-encoded.
///
/// Boxes falling partially outside the canvas are clamped; a box that
/// clamps to nothing is skipped rather than wrapped around.
pub fn annotate(image_bytes: &[u8], detections: &[ParsedDetection]) -> Result<Vec<u8>, OverlayError> {
    let mut canvas = image::load_from_memory(image_bytes)
        .map_err(|e| OverlayError::ImageDecode(e.to_string()))?
        .to_rgba8();

    for det in detections {
        draw_detection(&mut canvas, det);
    }

    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(canvas)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| OverlayError::ImageEncode(e.to_string()))?;
    Ok(bytes)
}

fn draw_detection(canvas: &mut RgbaImage, det: &ParsedDetection) {
    let (img_w, img_h) = canvas.dimensions();
    let max_x = img_w.saturating_sub(1) as f32;
    let max_y = img_h.saturating_sub(1) as f32;

    let x1 = det.bbox.x1.clamp(0.0, max_x) as i32;
    let y1 = det.bbox.y1.clamp(0.0, max_y) as i32;
    let x2 = det.bbox.x2.clamp(0.0, max_x) as i32;
    let y2 = det.bbox.y2.clamp(0.0, max_y) as i32;
    if x2 <= x1 || y2 <= y1 {
        tracing::debug!(id = det.id, "detection box clamps to nothing, skipped");
        return;
    }

    let color = hex_rgba(category_color(det.properties.category));
    for inset in 0..BOX_THICKNESS {
        let width = (x2 - x1 - 2 * inset).max(1) as u32;
        let height = (y2 - y1 - 2 * inset).max(1) as u32;
        draw_hollow_rect_mut(
            canvas,
            Rect::at(x1 + inset, y1 + inset).of_size(width, height),
            color,
        );
    }

    if det.properties.flowering {
        draw_filled_circle_mut(canvas, (x2, y1), BLOSSOM_RADIUS, BLOSSOM_COLOR);
    }
}

/// Parse a `#RRGGBB` table color. The table is fixed, so a malformed entry
/// is a programming error; channels fall back to zero instead of panicking.
fn hex_rgba(hex: &str) -> Rgba<u8> {
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .unwrap_or(0)
    };
    Rgba([channel(1..3), channel(3..5), channel(5..7), 0xFF])
}

#[cfg(test)]
mod tests {
    use super::*;
    use detection::{aggregate, BoundingBox, RawDetection};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode png");
        bytes
    }

    fn detections() -> Vec<ParsedDetection> {
        aggregate(vec![RawDetection {
            bbox: BoundingBox {
                x1: 10.0,
                y1: 10.0,
                x2: 40.0,
                y2: 40.0,
            },
            confidence: 0.9,
            label: "Tree_Height2_Flowering".to_string(),
        }])
        .detections
    }

    #[test]
    fn annotate_returns_decodable_png() {
        let rendered = annotate(&png(64, 64), &detections()).expect("annotate");
        let decoded = image::load_from_memory(&rendered).expect("rendered image decodes");
        assert_eq!(decoded.width(), 64);
        assert_eq!(decoded.height(), 64);
    }

    #[test]
    fn annotate_draws_category_colored_border() {
        let rendered = annotate(&png(64, 64), &detections()).expect("annotate");
        let decoded = image::load_from_memory(&rendered).expect("decode").to_rgba8();
        // Tree border pixel at the box corner.
        assert_eq!(decoded.get_pixel(10, 10), &Rgba([0x22, 0x8B, 0x22, 0xFF]));
    }

    #[test]
    fn undecodable_source_is_rejected() {
        let err = annotate(b"not an image", &[]).expect_err("decode failure");
        assert!(matches!(err, OverlayError::ImageDecode(_)));
    }

    #[test]
    fn hex_colors_parse() {
        assert_eq!(hex_rgba("#FF6347"), Rgba([0xFF, 0x63, 0x47, 0xFF]));
        assert_eq!(hex_rgba("#000000"), Rgba([0, 0, 0, 0xFF]));
    }
}
