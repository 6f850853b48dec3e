//! Detector collaborator boundary.

use crate::types::{BoundingBox, DetectError, RawDetection};

/// Object-detection collaborator: image in, confidence-filtered detections
/// out. No ordering guarantee is assumed by the aggregation layer.
pub trait SymbolDetector: Send + Sync {
    fn detect(
        &self,
        image: &[u8],
        confidence_threshold: f32,
    ) -> Result<Vec<RawDetection>, DetectError>;

    /// True for stand-in implementations used when no model is mounted.
    fn degraded(&self) -> bool {
        false
    }
}

/// Sentinel class list reported by the degraded detector, one per major
/// category so downstream parsing and summarization get exercised.
const SENTINEL_DETECTIONS: &[(&str, f32)] = &[
    ("Tree_Height2_CanopySize2_Evergreen_Flowering_NONFruiting", 0.92),
    ("Shrub_Height1_CanopySize1_Deciduous_NONFlowering_Fruiting", 0.84),
    (
        "perennials_Height1_CanopySize2_Evergreen_BroadLeafed_Flowering",
        0.78,
    ),
    ("Rock_DecendingSize1", 0.88),
    ("FlowerPot", 0.71),
];

/// Fractional box centers for the sentinel detections, spread over the
/// image so overlay output is visually plausible.
const SENTINEL_ANCHORS: &[(f32, f32)] = &[(0.25, 0.25), (0.7, 0.3), (0.4, 0.6), (0.65, 0.75), (0.2, 0.8)];

/// Deterministic stand-in detector for setups without a model.
///
/// Reports the fixed sentinel classes at positions derived from the image
/// dimensions, so identical input always yields identical detections.
#[derive(Debug, Clone, Copy, Default)]
pub struct DegradedDetector;

impl SymbolDetector for DegradedDetector {
    fn detect(
        &self,
        image: &[u8],
        confidence_threshold: f32,
    ) -> Result<Vec<RawDetection>, DetectError> {
        let (width, height) = image::load_from_memory(image)
            .map(|img| (img.width() as f32, img.height() as f32))
            .map_err(|e| DetectError::ImageDecode(e.to_string()))?;

        let half_w = (width * 0.06).max(8.0);
        let half_h = (height * 0.06).max(8.0);

        let detections = SENTINEL_DETECTIONS
            .iter()
            .zip(SENTINEL_ANCHORS)
            .filter(|((_, confidence), _)| *confidence >= confidence_threshold)
            .map(|((label, confidence), (fx, fy))| {
                let cx = fx * width;
                let cy = fy * height;
                RawDetection {
                    bbox: BoundingBox {
                        x1: cx - half_w,
                        y1: cy - half_h,
                        x2: cx + half_w,
                        y2: cy + half_h,
                    },
                    confidence: *confidence,
                    label: (*label).to_string(),
                }
            })
            .collect();
        Ok(detections)
    }

    fn degraded(&self) -> bool {
        true
    }
}
