//! API route definitions
//!
//! - /health - liveness and session counts
//! - /api/v1/config - effective analyzer configuration
//! - /ws/analysis - per-connection analysis session

use axum::{routing::get, Router};

use super::handlers::{self, ApiState};
use super::ws;

/// Versioned JSON endpoints, nested under `/api/v1`
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/config", get(handlers::get_config))
        .with_state(state)
}

/// Root-level endpoints
pub fn root_routes(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/ws/analysis", get(ws::analysis_ws))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotator::SyntheticAnnotator;
    use crate::config::AnalyzerConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    fn create_test_state() -> ApiState {
        let annotator = SyntheticAnnotator::new(0, 4_000, 45.0).unwrap();
        ApiState::new(
            Arc::new(annotator),
            AnalyzerConfig::default(),
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn test_config_route() {
        let app = api_routes(create_test_state());
        let response = app
            .oneshot(Request::builder().uri("/config").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_route() {
        let app = root_routes(create_test_state());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
