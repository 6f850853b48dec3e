use labels::{Category, ClassProperties, PlantSize};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Axis-aligned box in pixel space. `x1 < x2` and `y1 < y2` by the detector
/// contract; coordinates are fractional because the model reports sub-pixel
/// positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn center_x(&self) -> f32 {
        (self.x1 + self.x2) / 2.0
    }

    pub fn center_y(&self) -> f32 {
        (self.y1 + self.y2) / 2.0
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }
}

/// One unprocessed detector output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub bbox: BoundingBox,
    /// Detector confidence in `[0, 1]`; the provider has already applied
    /// its confidence threshold.
    pub confidence: f32,
    /// Raw class label, decoded downstream by the label parser.
    pub label: String,
}

/// A raw detection enriched with derived geometry, decoded properties, and
/// its position in the batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedDetection {
    /// 0-based sequence position within one detection batch. Stable for
    /// the batch, reset every call; not a persistent identifier.
    pub id: usize,
    pub bbox: BoundingBox,
    pub center_x: f32,
    pub center_y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    pub label: String,
    pub properties: ClassProperties,
}

/// Size histogram with all three buckets always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SizeDistribution {
    pub small: usize,
    pub medium: usize,
    pub large: usize,
}

impl SizeDistribution {
    pub fn bump(&mut self, size: PlantSize) {
        match size {
            PlantSize::Small => self.small += 1,
            PlantSize::Medium => self.medium += 1,
            PlantSize::Large => self.large += 1,
        }
    }
}

/// Derived rollup of one detection batch. Recomputable from the parsed
/// detections at any time; never mutated independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectionSummary {
    /// Histogram over categories actually seen; absent categories are
    /// absent, not zero-filled.
    pub by_category: BTreeMap<Category, usize>,
    pub flowering_count: usize,
    pub fruiting_count: usize,
    pub size_distribution: SizeDistribution,
}

/// Errors produced by the detection layer.
#[derive(Debug, Error)]
pub enum DetectError {
    /// Detector collaborator failed to run inference.
    #[error("detector inference failed: {0}")]
    Inference(String),

    /// Input bytes are not a decodable image.
    #[error("image decode failed: {0}")]
    ImageDecode(String),
}
