use crate::error::{ServerError, ServerResult};
use crate::routes::{decode_image_field, encode_image};
use crate::state::ServerState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use florify::MatchOutcome;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Blueprint match request
#[derive(Debug, Deserialize)]
pub struct MatchBlueprintRequest {
    /// Base64-encoded blueprint image (optionally a data URL)
    pub image: Option<String>,

    /// Minimum similarity to accept a match
    #[serde(default)]
    pub min_similarity: Option<f32>,
}

/// Blueprint match response
#[derive(Debug, Serialize)]
pub struct MatchBlueprintResponse {
    pub success: bool,
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
    /// Top-1 score when no reference cleared the threshold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_similarity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filled_image_base64: Option<String>,
    /// True when the match came from the degraded sentinel, never from a
    /// genuine similarity search
    pub degraded: bool,
}

impl From<&MatchOutcome> for MatchBlueprintResponse {
    fn from(outcome: &MatchOutcome) -> Self {
        match outcome {
            MatchOutcome::Matched {
                reference_index,
                similarity,
                filled_image,
                degraded,
            } => Self {
                success: true,
                matched: true,
                reference_index: Some(*reference_index),
                similarity: Some(*similarity),
                best_similarity: None,
                filled_image_base64: filled_image.as_deref().map(encode_image),
                degraded: *degraded,
            },
            MatchOutcome::NoMatch { best_similarity } => Self {
                success: true,
                matched: false,
                reference_index: None,
                similarity: None,
                best_similarity: Some(*best_similarity),
                filled_image_base64: None,
                degraded: false,
            },
        }
    }
}

/// Match an uploaded blueprint against the reference corpus.
///
/// A below-threshold best score is a successful response with
/// `matched: false`; only integrity and collaborator failures error.
pub async fn match_blueprint(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<MatchBlueprintRequest>,
) -> ServerResult<impl IntoResponse> {
    let image = request
        .image
        .as_deref()
        .ok_or(ServerError::MissingField("image"))?;
    let image = decode_image_field("image", image)?;
    let threshold = request
        .min_similarity
        .unwrap_or(state.config.pipeline.similarity_threshold);

    let pipeline = state.pipeline.clone();
    let outcome = tokio::task::spawn_blocking(move || pipeline.match_blueprint(&image, threshold))
        .await
        .map_err(|e| ServerError::Internal(format!("match task failed: {e}")))??;

    Ok(Json(MatchBlueprintResponse::from(&outcome)))
}

/// One sample pair for the demo/testing endpoint
#[derive(Debug, Serialize)]
pub struct SamplePair {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filled_base64: Option<String>,
}

/// Sample blueprint response
#[derive(Debug, Serialize)]
pub struct SamplesResponse {
    pub success: bool,
    pub samples: Vec<SamplePair>,
}

const SAMPLE_COUNT: usize = 5;

/// Return the first few empty/filled reference pairs for testing.
pub async fn sample_blueprints(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<impl IntoResponse> {
    let mut samples = Vec::with_capacity(SAMPLE_COUNT);
    for index in 0..SAMPLE_COUNT {
        let empty = state
            .assets
            .empty(index)
            .unwrap_or_else(|err| {
                tracing::warn!(index, error = %err, "empty sample lookup failed");
                None
            })
            .map(|bytes| encode_image(&bytes));
        let filled = state
            .assets
            .filled(index)
            .unwrap_or_else(|err| {
                tracing::warn!(index, error = %err, "filled sample lookup failed");
                None
            })
            .map(|bytes| encode_image(&bytes));

        samples.push(SamplePair {
            index,
            empty_base64: empty,
            filled_base64: filled,
        });
    }

    Ok(Json(SamplesResponse {
        success: true,
        samples,
    }))
}
