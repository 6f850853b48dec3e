//! Enumerated plant/object attributes encoded in detector labels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level symbol category.
///
/// Categories form a closed set; anything the label grammar cannot place
/// lands in [`Category::Other`] rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Tree,
    Shrub,
    Perennial,
    Annual,
    Climber,
    Rock,
    FlowerPot,
    Object,
    Other,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Tree => "Tree",
            Category::Shrub => "Shrub",
            Category::Perennial => "Perennial",
            Category::Annual => "Annual",
            Category::Climber => "Climber",
            Category::Rock => "Rock",
            Category::FlowerPot => "FlowerPot",
            Category::Object => "Object",
            Category::Other => "Other",
        };
        f.write_str(name)
    }
}

/// Size bucket derived from `HeightN` / `CanopySizeN` tokens or size
/// keywords. Defaults to [`PlantSize::Medium`] when the label says nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlantSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl PlantSize {
    /// Capitalized form used in display names, e.g. `(Small)`.
    pub fn capitalized(self) -> &'static str {
        match self {
            PlantSize::Small => "Small",
            PlantSize::Medium => "Medium",
            PlantSize::Large => "Large",
        }
    }
}

impl fmt::Display for PlantSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlantSize::Small => "small",
            PlantSize::Medium => "medium",
            PlantSize::Large => "large",
        };
        f.write_str(name)
    }
}

/// Foliage type, when the label encodes one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeafType {
    #[serde(rename = "Broad Leaf")]
    Broad,
    #[serde(rename = "Thin Leaf")]
    Thin,
    #[serde(rename = "Needle Leaf")]
    Needle,
    Palm,
}

impl fmt::Display for LeafType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LeafType::Broad => "Broad Leaf",
            LeafType::Thin => "Thin Leaf",
            LeafType::Needle => "Needle Leaf",
            LeafType::Palm => "Palm",
        };
        f.write_str(name)
    }
}

/// Seasonal growth habit, when the label encodes one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrowthType {
    Evergreen,
    Deciduous,
}

impl fmt::Display for GrowthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GrowthType::Evergreen => "Evergreen",
            GrowthType::Deciduous => "Deciduous",
        };
        f.write_str(name)
    }
}
