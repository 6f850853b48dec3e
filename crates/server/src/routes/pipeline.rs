use crate::error::{ServerError, ServerResult};
use crate::routes::blueprint::MatchBlueprintResponse;
use crate::routes::{decode_image_field, encode_image};
use crate::state::ServerState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use florify::{DetectionSummary, OverlayMarker, ParsedDetection, PipelineRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Full pipeline request
#[derive(Debug, Deserialize)]
pub struct RunPipelineRequest {
    /// The non-skinned source blueprint (required)
    pub non_skinned_image: Option<String>,

    /// Optional skinned display variant; markers target its pixel space
    #[serde(default)]
    pub skinned_image: Option<String>,

    #[serde(default)]
    pub min_similarity: Option<f32>,

    #[serde(default)]
    pub conf_threshold: Option<f32>,
}

/// Detection phase of the pipeline response
#[derive(Debug, Serialize)]
pub struct DetectionPhase {
    pub detections: Vec<ParsedDetection>,
    pub total_detections: usize,
    pub summary: DetectionSummary,
}

/// Full pipeline response
///
/// `success` distinguishes "pipeline reached a terminal state" from an
/// internal error; a below-threshold match or a skipped detection phase
/// is still `success: true` with the downstream fields null.
#[derive(Debug, Serialize)]
pub struct RunPipelineResponse {
    pub success: bool,
    #[serde(rename = "match")]
    pub match_phase: MatchBlueprintResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection: Option<DetectionPhase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay: Option<Vec<OverlayMarker>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotated_image_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_skipped: Option<String>,
}

/// Run the full pipeline: match the blueprint, detect symbols on the
/// matched reference, aggregate, and build the overlay.
pub async fn run_pipeline(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<RunPipelineRequest>,
) -> ServerResult<impl IntoResponse> {
    let source = request
        .non_skinned_image
        .as_deref()
        .ok_or(ServerError::MissingField("non_skinned_image"))?;
    let source_image = decode_image_field("non_skinned_image", source)?;
    let display_image = request
        .skinned_image
        .as_deref()
        .map(|data| decode_image_field("skinned_image", data))
        .transpose()?;

    let pipeline_request = PipelineRequest {
        source_image,
        display_image,
        similarity_threshold: request
            .min_similarity
            .unwrap_or(state.config.pipeline.similarity_threshold),
        confidence_threshold: request
            .conf_threshold
            .unwrap_or(state.config.pipeline.confidence_threshold),
    };

    let pipeline = state.pipeline.clone();
    let outcome = tokio::task::spawn_blocking(move || pipeline.run(&pipeline_request))
        .await
        .map_err(|e| ServerError::Internal(format!("pipeline task failed: {e}")))??;

    let match_phase = MatchBlueprintResponse::from(&outcome.match_outcome);
    let (detection, csv) = match outcome.detection {
        Some(aggregated) => (
            Some(DetectionPhase {
                total_detections: aggregated.detections.len(),
                summary: aggregated.summary,
                detections: aggregated.detections,
            }),
            Some(aggregated.csv),
        ),
        None => (None, None),
    };

    Ok(Json(RunPipelineResponse {
        success: true,
        match_phase,
        detection,
        csv,
        overlay: outcome.overlay,
        annotated_image_base64: outcome.annotated_image.as_deref().map(encode_image),
        detection_skipped: outcome.detection_skipped,
    }))
}
