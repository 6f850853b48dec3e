//! Florify class-label layer.
//!
//! The symbol detector reports each hit as an underscore-delimited tag string
//! such as `Tree_Height2_CanopySize2_Evergreen_Flowering_NONFruiting`. This
//! crate decodes that vocabulary into a structured property record that the
//! rest of the pipeline (aggregation, overlay, export) can rely on.
//!
//! ## Pure function guarantee
//!
//! [`parse`] performs no I/O, touches no clock, and never fails: an
//! unrecognized label degrades to defaults (`Other`, medium, no attributes)
//! instead of erroring. Same label in, same properties out, on any machine.
//!
//! ## Vocabulary quirks worth knowing
//!
//! The label vocabulary comes from the detector's training data and carries
//! its warts. `ecergreen` is an accepted synonym for `evergreen`, and the
//! negated attribute markers use a fixed `NONFlowering` / `NONFruiting`
//! casing. Both are matched as-is; "fixing" them here would silently change
//! classification of real detector output.

mod parser;
mod taxonomy;

pub use crate::parser::{parse, ClassProperties};
pub use crate::taxonomy::{Category, GrowthType, LeafType, PlantSize};
