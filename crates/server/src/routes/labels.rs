use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use florify::ClassProperties;
use serde::{Deserialize, Serialize};

/// Label parse request
#[derive(Debug, Deserialize)]
pub struct ParseLabelRequest {
    pub class_name: Option<String>,
}

/// Label parse response
#[derive(Debug, Serialize)]
pub struct ParseLabelResponse {
    pub success: bool,
    pub properties: ClassProperties,
}

/// Parse a detector class label into structured properties.
///
/// Parsing is total: any label yields a response; unknown vocabulary
/// degrades to the `Other` category with defaults.
pub async fn parse_label(
    Json(request): Json<ParseLabelRequest>,
) -> ServerResult<impl IntoResponse> {
    let class_name = request
        .class_name
        .as_deref()
        .ok_or(ServerError::MissingField("class_name"))?;

    Ok(Json(ParseLabelResponse {
        success: true,
        properties: florify::parse(class_name),
    }))
}
