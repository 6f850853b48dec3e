//! Marker projection and the category color table.

use detection::ParsedDetection;
use labels::{Category, GrowthType, LeafType, PlantSize};
use serde::Serialize;

/// Fallback color (Other's gold). The parser only emits enumerated
/// categories, but the mapping stays robust should the taxonomy grow.
pub const DEFAULT_COLOR: &str = "#FFD700";

/// Fixed category color table used by markers and the annotated render.
pub fn category_color(category: Category) -> &'static str {
    match category {
        Category::Tree => "#228B22",
        Category::Shrub => "#32CD32",
        Category::Perennial => "#9370DB",
        Category::Annual => "#FF69B4",
        Category::Climber => "#8B4513",
        Category::Rock => "#808080",
        Category::FlowerPot => "#FF6347",
        Category::Object => "#4169E1",
        Category::Other => DEFAULT_COLOR,
    }
}

/// Display projection of one parsed detection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayMarker {
    pub id: usize,
    /// Marker anchor: the detection's box center, in source pixel space.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub label: String,
    pub confidence: f32,
    pub category: Category,
    pub flowering: bool,
    pub fruiting: bool,
    pub size: PlantSize,
    pub leaf_type: Option<LeafType>,
    pub growth_type: Option<GrowthType>,
    pub display_name: String,
    pub color: &'static str,
}

/// Build one marker per detection, 1:1 and order-preserving. Empty input
/// yields an empty marker list.
pub fn build_overlay(detections: &[ParsedDetection]) -> Vec<OverlayMarker> {
    detections
        .iter()
        .map(|det| {
            let props = &det.properties;
            OverlayMarker {
                id: det.id,
                x: det.center_x,
                y: det.center_y,
                width: det.width,
                height: det.height,
                label: det.label.clone(),
                confidence: det.confidence,
                category: props.category,
                flowering: props.flowering,
                fruiting: props.fruiting,
                size: props.size,
                leaf_type: props.leaf_type,
                growth_type: props.growth_type,
                display_name: props.display_name.clone(),
                color: category_color(props.category),
            }
        })
        .collect()
}
