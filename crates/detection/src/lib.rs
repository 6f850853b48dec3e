//! Florify symbol detection layer.
//!
//! The object-detection model itself is an external collaborator behind the
//! [`SymbolDetector`] trait; this crate owns everything around it: the raw
//! detection record shape, a deterministic [`DegradedDetector`] stand-in
//! for model-less setups, and the aggregation step that turns a raw batch
//! into parsed records, a summary rollup, and the CSV export.
//!
//! Aggregation is pure and allocation-bounded: output size is linear in
//! the batch, ids restart at zero every call, and the same batch always
//! aggregates to the same result.

mod aggregate;
mod detector;
mod types;

pub use crate::aggregate::{aggregate, export_csv, summarize, Aggregated, CSV_HEADER};
pub use crate::detector::{DegradedDetector, SymbolDetector};
pub use crate::types::{
    BoundingBox, DetectError, DetectionSummary, ParsedDetection, RawDetection, SizeDistribution,
};
