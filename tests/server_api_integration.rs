//! Integration tests for the HTTP API, driven through the router without
//! binding a socket.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::Engine;
use http_body_util::BodyExt;
use tower::util::ServiceExt;

use florify::{
    DegradedDetector, EmbeddingProvider, GardenPipeline, InMemoryAssetStore, LinearSearch,
    MatchError, MatchSelector, PipelineConfig, ReferenceCorpus,
};
use server::{build_router, ServerConfig, ServerState};

struct FixedEmbedder {
    vector: Vec<f32>,
}

impl EmbeddingProvider for FixedEmbedder {
    fn dimension(&self) -> usize {
        self.vector.len()
    }

    fn embed(&self, _image: &[u8]) -> Result<Vec<f32>, MatchError> {
        Ok(self.vector.clone())
    }
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 255, 255, 255]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encode png");
    bytes
}

fn png_base64() -> String {
    base64::engine::general_purpose::STANDARD.encode(png(64, 64))
}

/// State with a degraded pipeline (no corpus on disk).
fn degraded_state() -> Arc<ServerState> {
    let config = ServerConfig {
        data_dir: "/nonexistent/florify-test-db".to_string(),
        ..ServerConfig::default()
    };
    Arc::new(ServerState::new(config).expect("degraded state"))
}

/// State with a live selector over a one-row corpus whose filled asset is
/// a real PNG, and the deterministic stand-in detector.
fn live_state() -> Arc<ServerState> {
    let search = LinearSearch::from_rows(vec![vec![1.0, 0.0]]).expect("index");
    let assets = Arc::new(InMemoryAssetStore::with_filled(vec![Some(png(96, 96))]));
    let selector = MatchSelector::new(
        Box::new(search),
        ReferenceCorpus::new(vec![florify::CorpusEntry {
            empty_id: "empty/0000.png".to_string(),
            filled_id: "filled/0000.png".to_string(),
        }]),
        assets.clone(),
    )
    .expect("selector");

    let pipeline = GardenPipeline::new(
        Arc::new(FixedEmbedder {
            vector: vec![1.0, 0.0],
        }),
        Arc::new(selector),
        Arc::new(DegradedDetector),
        PipelineConfig::default(),
    )
    .expect("pipeline");

    Arc::new(ServerState::with_pipeline(
        ServerConfig::default(),
        Arc::new(pipeline),
        assets,
    ))
}

async fn post_json(state: Arc<ServerState>, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let app = build_router(state);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
        )
        .await
        .expect("response");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let json = serde_json::from_slice(&bytes).expect("json body");
    (status, json)
}

#[tokio::test]
async fn health_endpoint_reports_healthy() {
    let app = build_router(degraded_state());
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "florify-server");
}

#[tokio::test]
async fn missing_image_field_is_client_fault() {
    let (status, json) = post_json(
        degraded_state(),
        "/api/v1/blueprint/match",
        serde_json::json!({ "min_similarity": 0.5 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "MISSING_FIELD");
}

#[tokio::test]
async fn undecodable_image_is_rejected_before_the_pipeline() {
    let not_an_image = base64::engine::general_purpose::STANDARD.encode(b"plain text");
    let (status, json) = post_json(
        degraded_state(),
        "/api/v1/blueprint/match",
        serde_json::json!({ "image": not_an_image }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "BAD_REQUEST");

    let (status, json) = post_json(
        degraded_state(),
        "/api/v1/blueprint/match",
        serde_json::json!({ "image": "%%%not-base64%%%" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn data_url_prefix_is_accepted() {
    let (status, json) = post_json(
        live_state(),
        "/api/v1/blueprint/match",
        serde_json::json!({ "image": format!("data:image/png;base64,{}", png_base64()) }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["matched"], true);
}

#[tokio::test]
async fn label_parse_endpoint_decodes_properties() {
    let (status, json) = post_json(
        degraded_state(),
        "/api/v1/labels/parse",
        serde_json::json!({
            "class_name": "Tree_Height2_CanopySize2_Evergreen_Flowering_NONFruiting"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["properties"]["category"], "Tree");
    assert_eq!(json["properties"]["size"], "medium");
    assert_eq!(json["properties"]["flowering"], true);
    assert_eq!(json["properties"]["fruiting"], false);
    assert_eq!(json["properties"]["growth_type"], "Evergreen");
}

#[tokio::test]
async fn full_pipeline_reports_match_detections_and_overlay() {
    let (status, json) = post_json(
        live_state(),
        "/api/v1/pipeline",
        serde_json::json!({ "non_skinned_image": png_base64() }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["match"]["matched"], true);
    assert_eq!(json["match"]["reference_index"], 0);
    assert_eq!(json["match"]["degraded"], false);

    // The stand-in detector reports its five sentinel symbols.
    let detections = json["detection"]["detections"].as_array().expect("detections");
    assert_eq!(detections.len(), 5);
    assert_eq!(json["detection"]["total_detections"], 5);
    let overlay = json["overlay"].as_array().expect("overlay");
    assert_eq!(overlay.len(), detections.len());

    // CSV carries a header plus one row per detection.
    let csv = json["csv"].as_str().expect("csv");
    assert_eq!(csv.lines().count(), 6);
    assert!(csv.starts_with("id,class_name,category"));

    assert!(json["annotated_image_base64"].is_string());
    assert!(json.get("detection_skipped").is_none());
}

#[tokio::test]
async fn degraded_pipeline_still_returns_a_flagged_terminal_state() {
    let (status, json) = post_json(
        degraded_state(),
        "/api/v1/pipeline",
        serde_json::json!({ "non_skinned_image": png_base64() }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["match"]["matched"], true);
    assert_eq!(json["match"]["degraded"], true);
    // No filled asset behind the sentinel pairing: detection is skipped
    // with an explicit reason rather than silently dropped.
    assert!(json.get("detection").is_none());
    assert!(json["detection_skipped"].as_str().expect("reason").contains("filled asset"));
}

#[tokio::test]
async fn detect_endpoint_runs_on_a_provided_image() {
    let (status, json) = post_json(
        live_state(),
        "/api/v1/symbols/detect",
        serde_json::json!({ "image": png_base64(), "conf_threshold": 0.8 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    // Threshold 0.8 keeps three of the five sentinel detections.
    assert_eq!(json["total_detections"], 3);
    assert_eq!(json["summary"]["size_distribution"]["small"], 2);
    assert!(json["csv"].as_str().expect("csv").lines().count() == 4);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = build_router(degraded_state());
    let response = app
        .oneshot(Request::builder().uri("/api/v1/nope").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
