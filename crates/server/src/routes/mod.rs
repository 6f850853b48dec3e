//! API route handlers
//!
//! This module contains all HTTP endpoint implementations for the Florify
//! server. Routes are organized by functionality:
//!
//! - `health`: Health checks and readiness
//! - `blueprint`: Reference matching and sample pairs
//! - `symbols`: Symbol detection on a provided image
//! - `pipeline`: The full match-then-detect pipeline
//! - `labels`: Class label parsing

pub mod blueprint;
pub mod health;
pub mod labels;
pub mod pipeline;
pub mod symbols;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use base64::Engine;
use serde_json::json;

/// API version and base info
///
/// Returns server information including version and available endpoints.
/// This is the root endpoint (GET /) and requires no authentication.
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "Florify Server",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
        "endpoints": [
            "/api/v1/blueprint/match",
            "/api/v1/blueprint/samples",
            "/api/v1/symbols/detect",
            "/api/v1/pipeline",
            "/api/v1/labels/parse",
            "/health",
            "/ready"
        ]
    })))
}

/// 404 Not Found handler
///
/// Returns a standardized error response for undefined routes.
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}

/// Decode a base64 image field, accepting an optional data-URL prefix.
///
/// Client-fault validation happens here, before any pipeline component
/// runs: undecodable base64 and payloads that are not images are both
/// rejected as bad requests.
pub(crate) fn decode_image_field(field: &'static str, data: &str) -> ServerResult<Vec<u8>> {
    let encoded = match data.split_once("base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:image") => rest,
        _ => data,
    };
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| ServerError::BadRequest(format!("{field}: invalid base64: {e}")))?;
    image::load_from_memory(&bytes)
        .map_err(|e| ServerError::BadRequest(format!("{field}: undecodable image: {e}")))?;
    Ok(bytes)
}

/// Base64-encode a binary side output for the JSON response.
pub(crate) fn encode_image(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}
