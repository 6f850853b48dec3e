//! Label decoding rule cascade.
//!
//! Every rule is an entry in an ordered table evaluated top to bottom, so the
//! precedence that decides a classification can be read off directly. Order
//! matters in two places: category prefixes (`flowerpot` must be tried before
//! `pot`) and the size keyword table (`small` wins over `extrasmall` inside
//! the same token because it is tried first and matches as a substring).

use serde::{Deserialize, Serialize};

use crate::taxonomy::{Category, GrowthType, LeafType, PlantSize};

/// Structured properties decoded from a single detector class label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassProperties {
    /// The raw label the properties were decoded from.
    pub label: String,
    pub category: Category,
    pub flowering: bool,
    pub fruiting: bool,
    pub size: PlantSize,
    pub leaf_type: Option<LeafType>,
    pub growth_type: Option<GrowthType>,
    /// Human-readable name assembled from the decoded attributes.
    pub display_name: String,
}

/// Category prefixes, tried in order against the lowercased label.
const CATEGORY_PREFIXES: &[(&str, Category)] = &[
    ("tree", Category::Tree),
    ("shrub", Category::Shrub),
    ("perennial", Category::Perennial),
    ("annual", Category::Annual),
    ("climber", Category::Climber),
    ("rock", Category::Rock),
    ("flowerpot", Category::FlowerPot),
    ("pot", Category::FlowerPot),
];

/// Exact height/canopy tokens. Matched case-sensitively against whole
/// underscore-delimited tokens, never as substrings.
const HEIGHT_TOKENS: &[(&str, PlantSize)] = &[
    ("Height1", PlantSize::Small),
    ("Height2", PlantSize::Medium),
    ("Height3", PlantSize::Large),
    ("Height4", PlantSize::Large),
];

const CANOPY_TOKENS: &[(&str, PlantSize)] = &[
    ("CanopySize1", PlantSize::Small),
    ("CanopySize2", PlantSize::Medium),
    ("CanopySize3", PlantSize::Large),
    ("CanopySize4", PlantSize::Large),
];

/// Fallback size keywords, matched case-insensitively as substrings of a
/// token. Table order is load-bearing: the first keyword that matches a
/// token decides, so `Size1` can fire inside a longer token like
/// `DecendingSize1`.
const SIZE_KEYWORDS: &[(&str, PlantSize)] = &[
    ("small", PlantSize::Small),
    ("medium", PlantSize::Medium),
    ("large", PlantSize::Large),
    ("extrasmall", PlantSize::Small),
    ("size1", PlantSize::Small),
    ("size2", PlantSize::Medium),
];

/// Leaf type substrings, first hit wins. The `*leafed` spellings come first
/// so they are attributed before their shorter variants.
const LEAF_RULES: &[(&str, LeafType)] = &[
    ("broadleafed", LeafType::Broad),
    ("broadleaf", LeafType::Broad),
    ("thinleafed", LeafType::Thin),
    ("thinleaf", LeafType::Thin),
    ("needleleaf", LeafType::Needle),
    ("palm", LeafType::Palm),
];

/// Growth habit substrings. `ecergreen` is a misspelling present in the
/// detector's label vocabulary and must keep matching as Evergreen.
const GROWTH_RULES: &[(&str, GrowthType)] = &[
    ("evergreen", GrowthType::Evergreen),
    ("ecergreen", GrowthType::Evergreen),
    ("deciduous", GrowthType::Deciduous),
];

/// Decode a detector class label into structured properties.
///
/// Total function: any string yields a well-formed record. Unrecognized
/// labels classify as `Other` with medium size and no attributes.
pub fn parse(label: &str) -> ClassProperties {
    let lower = label.to_lowercase();
    let tokens: Vec<&str> = label.split('_').collect();

    let category = parse_category(&lower);
    let flowering = parse_marker(&lower, label, "flowering", "nonflowering", "NONFlowering");
    let fruiting = parse_marker(&lower, label, "fruiting", "nonfruiting", "NONFruiting");
    let size = parse_size(&tokens);
    let leaf_type = first_substring_hit(&lower, LEAF_RULES);
    let growth_type = first_substring_hit(&lower, GROWTH_RULES);

    let display_name = display_name(category, size, flowering, fruiting, leaf_type);

    ClassProperties {
        label: label.to_string(),
        category,
        flowering,
        fruiting,
        size,
        leaf_type,
        growth_type,
        display_name,
    }
}

fn parse_category(lower: &str) -> Category {
    for (prefix, category) in CATEGORY_PREFIXES {
        if lower.starts_with(prefix) {
            return *category;
        }
    }
    if lower == "objects" {
        return Category::Object;
    }
    Category::Other
}

/// Decide a boolean attribute marker with its negated form.
///
/// The straightforward case is a positive substring without the fused
/// negation. When the fused negation is present but the label still carries
/// a `_<marker>` segment, the upstream vocabulary disambiguates through the
/// exact `NON<Marker>` casing, so that one check stays case-sensitive.
fn parse_marker(lower: &str, raw: &str, positive: &str, negative: &str, negation_cased: &str) -> bool {
    if lower.contains(positive) && !lower.contains(negative) {
        return true;
    }
    let segment = format!("_{positive}");
    if lower.contains(&segment) {
        return !raw.contains(negation_cased);
    }
    false
}

fn parse_size(tokens: &[&str]) -> PlantSize {
    // Pass 1: exact height/canopy tokens, first hit ends the scan.
    for token in tokens {
        for (name, size) in HEIGHT_TOKENS.iter().chain(CANOPY_TOKENS) {
            if token == name {
                return *size;
            }
        }
    }
    // Pass 2: keyword substrings, first matching token decides.
    for token in tokens {
        let token_lower = token.to_lowercase();
        for (keyword, size) in SIZE_KEYWORDS {
            if token_lower.contains(keyword) {
                return *size;
            }
        }
    }
    PlantSize::Medium
}

fn first_substring_hit<T: Copy>(lower: &str, rules: &[(&str, T)]) -> Option<T> {
    rules
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, value)| *value)
}

fn display_name(
    category: Category,
    size: PlantSize,
    flowering: bool,
    fruiting: bool,
    leaf_type: Option<LeafType>,
) -> String {
    let mut parts = vec![category.to_string()];
    if size != PlantSize::Medium {
        parts.push(format!("({})", size.capitalized()));
    }
    if flowering {
        parts.push("🌸".to_string());
    }
    if fruiting {
        parts.push("🍎".to_string());
    }
    if let Some(leaf) = leaf_type {
        parts.push(format!("[{leaf}]"));
    }
    parts.join(" ")
}
