//! System state endpoints: health, config

use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::Serialize;
use std::sync::atomic::Ordering;

use super::ApiState;
use crate::api::envelope::ApiResponse;

// ============================================================================
// Health Endpoint
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_seconds: u64,
    pub active_sessions: usize,
    pub sessions_served: u64,
    /// Annotation backend in use
    pub annotator: &'static str,
}

/// GET /health - Liveness and session counts
pub async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_seconds: state.started_at.elapsed().as_secs(),
        active_sessions: state.active_sessions(),
        sessions_served: state.sessions_served.load(Ordering::Relaxed),
        annotator: state.annotator.backend_name(),
    })
}

// ============================================================================
// Config Endpoint
// ============================================================================

/// GET /api/v1/config - Effective analyzer configuration (secrets omitted)
pub async fn get_config(State(state): State<ApiState>) -> Response {
    ApiResponse::ok(state.config.as_ref().clone())
}
