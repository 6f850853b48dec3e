use crate::error::{ServerError, ServerResult};
use crate::routes::{decode_image_field, encode_image};
use crate::state::ServerState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use florify::{annotate, DetectionSummary, ParsedDetection};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Symbol detection request
#[derive(Debug, Deserialize)]
pub struct DetectSymbolsRequest {
    /// Base64-encoded blueprint image (optionally a data URL)
    pub image: Option<String>,

    /// Detector confidence threshold
    #[serde(default)]
    pub conf_threshold: Option<f32>,
}

/// Symbol detection response
#[derive(Debug, Serialize)]
pub struct DetectSymbolsResponse {
    pub success: bool,
    pub detections: Vec<ParsedDetection>,
    pub total_detections: usize,
    pub summary: DetectionSummary,
    pub csv: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotated_image_base64: Option<String>,
    pub degraded: bool,
}

/// Detect garden symbols in a provided blueprint image.
///
/// Zero detections is a successful response with an empty list, a zeroed
/// summary, and a header-only CSV.
pub async fn detect_symbols(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<DetectSymbolsRequest>,
) -> ServerResult<impl IntoResponse> {
    let image = request
        .image
        .as_deref()
        .ok_or(ServerError::MissingField("image"))?;
    let image = decode_image_field("image", image)?;
    let threshold = request
        .conf_threshold
        .unwrap_or(state.config.pipeline.confidence_threshold);

    let pipeline = state.pipeline.clone();
    let degraded = pipeline.is_degraded();
    let (aggregated, annotated) = tokio::task::spawn_blocking(move || {
        let aggregated = pipeline.detect_symbols(&image, threshold)?;
        let annotated = match annotate(&image, &aggregated.detections) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                tracing::warn!(error = %err, "annotated render failed");
                None
            }
        };
        Ok::<_, ServerError>((aggregated, annotated))
    })
    .await
    .map_err(|e| ServerError::Internal(format!("detect task failed: {e}")))??;

    Ok(Json(DetectSymbolsResponse {
        success: true,
        total_detections: aggregated.detections.len(),
        summary: aggregated.summary,
        csv: aggregated.csv,
        annotated_image_base64: annotated.as_deref().map(encode_image),
        detections: aggregated.detections,
        degraded,
    }))
}
