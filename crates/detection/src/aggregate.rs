//! Detection aggregation: geometry enrichment, label decoding, summary
//! fold, and the tabular export.

use crate::types::{DetectionSummary, ParsedDetection, RawDetection};

/// Fixed column order of the tabular export. Downstream snapshots depend
/// on it, so it never changes without a format version bump.
pub const CSV_HEADER: &str = "id,class_name,category,flowering,fruiting,size,leaf_type,growth_type,confidence,center_x,center_y,width,height";

/// Everything derived from one detection batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregated {
    pub detections: Vec<ParsedDetection>,
    pub summary: DetectionSummary,
    pub csv: String,
}

/// Enrich a raw detection batch into parsed records, a summary, and the
/// CSV export.
///
/// Ids are the 0-based batch positions, stable within this call only.
/// Empty input yields an empty detection list, a zeroed summary (size
/// buckets present, category map empty), and a header-only export.
pub fn aggregate(raw: Vec<RawDetection>) -> Aggregated {
    let detections: Vec<ParsedDetection> = raw
        .into_iter()
        .enumerate()
        .map(|(id, det)| {
            let properties = labels::parse(&det.label);
            ParsedDetection {
                id,
                bbox: det.bbox,
                center_x: det.bbox.center_x(),
                center_y: det.bbox.center_y(),
                width: det.bbox.width(),
                height: det.bbox.height(),
                confidence: det.confidence,
                label: det.label,
                properties,
            }
        })
        .collect();

    let summary = summarize(&detections);
    let csv = export_csv(&detections);

    tracing::debug!(
        detections = detections.len(),
        flowering = summary.flowering_count,
        fruiting = summary.fruiting_count,
        "aggregated detection batch"
    );

    Aggregated {
        detections,
        summary,
        csv,
    }
}

/// Fold the parsed batch into per-category, flowering/fruiting, and size
/// counts. Pure; recomputable from the same input at any time.
pub fn summarize(detections: &[ParsedDetection]) -> DetectionSummary {
    let mut summary = DetectionSummary::default();
    for det in detections {
        *summary
            .by_category
            .entry(det.properties.category)
            .or_insert(0) += 1;
        if det.properties.flowering {
            summary.flowering_count += 1;
        }
        if det.properties.fruiting {
            summary.fruiting_count += 1;
        }
        summary.size_distribution.bump(det.properties.size);
    }
    summary
}

/// Serialize the batch as CSV with the fixed column order.
///
/// Confidence renders with four decimal places and geometry with one; the
/// output is snapshot-compared downstream, so the formatting is exact.
pub fn export_csv(detections: &[ParsedDetection]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for det in detections {
        let props = &det.properties;
        let row = [
            det.id.to_string(),
            csv_field(&det.label),
            props.category.to_string(),
            props.flowering.to_string(),
            props.fruiting.to_string(),
            props.size.to_string(),
            props.leaf_type.map(|l| l.to_string()).unwrap_or_default(),
            props.growth_type.map(|g| g.to_string()).unwrap_or_default(),
            format!("{:.4}", det.confidence),
            format!("{:.1}", det.center_x),
            format!("{:.1}", det.center_y),
            format!("{:.1}", det.width),
            format!("{:.1}", det.height),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// Minimal CSV quoting. Labels are plain tag strings today; the guard only
/// exists so a pathological label cannot corrupt the row structure.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
