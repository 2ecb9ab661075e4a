//! API Regression Tests
//!
//! In-process tests that build the Axum app via `create_app()` and exercise
//! every HTTP endpoint using `tower::ServiceExt::oneshot()`.
//! No binary spawn, no network port.

use repsense::api::{create_app, ApiState};
use repsense::config::{AnalyzerConfig, AnnotatorBackend};
use repsense::SyntheticAnnotator;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

fn create_test_state(config: AnalyzerConfig) -> ApiState {
    let annotator = SyntheticAnnotator::new(7, 4_000, 45.0).unwrap();
    ApiState::new(Arc::new(annotator), config, CancellationToken::new())
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, body)
}

#[tokio::test]
async fn health_reports_ok_and_no_sessions() {
    let app = create_app(create_test_state(AnalyzerConfig::default()));
    let (status, body) = get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["active_sessions"], 0);
    assert_eq!(body["sessions_served"], 0);
    assert_eq!(body["annotator"], "synthetic");
}

#[tokio::test]
async fn config_endpoint_uses_envelope_and_hides_api_key() {
    let mut config = AnalyzerConfig::default();
    config.segmenter.threshold = 20.0;
    config.annotator.backend = AnnotatorBackend::Synthetic;
    config.annotator.api_key = Some("secret-token".to_string());

    let app = create_app(create_test_state(config));
    let (status, body) = get_json(app, "/api/v1/config").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["version"], "1");
    assert_eq!(body["data"]["segmenter"]["threshold"], 20.0);
    assert_eq!(body["data"]["annotator"]["backend"], "synthetic");
    assert!(body["data"]["annotator"].get("api_key").is_none());
    assert!(!body.to_string().contains("secret-token"));
}

#[tokio::test]
async fn analysis_endpoint_requires_websocket_upgrade() {
    let app = create_app(create_test_state(AnalyzerConfig::default()));
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/ws/analysis")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(
        resp.status().is_client_error(),
        "plain GET should be rejected, got {}",
        resp.status()
    );
}

#[tokio::test]
async fn unknown_route_is_404() {
    let app = create_app(create_test_state(AnalyzerConfig::default()));
    let resp = app
        .oneshot(Request::builder().uri("/api/v1/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
