//! Florify overlay layer.
//!
//! Projects parsed detections into display-ready artifacts: positioned
//! [`OverlayMarker`]s for the interactive frontend, and a rendered
//! annotated image with boxes drawn in category colors. Both are pure
//! derivations of one pipeline invocation's detections; nothing here is
//! edited independently or kept across requests.

mod annotate;
mod markers;

pub use crate::annotate::{annotate, OverlayError};
pub use crate::markers::{build_overlay, category_color, OverlayMarker, DEFAULT_COLOR};
