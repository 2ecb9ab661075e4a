//! API route handlers
//!
//! - Liveness with live session counts
//! - Effective analyzer configuration

mod status;

pub use status::*;

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::annotator::AngleAnnotator;
use crate::config::AnalyzerConfig;

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers.
///
/// Holds only what every session needs to start; per-session state lives in
/// the connection task that owns it.
#[derive(Clone)]
pub struct ApiState {
    pub annotator: Arc<dyn AngleAnnotator>,
    pub config: Arc<AnalyzerConfig>,
    /// Connections currently streaming frames
    pub active_sessions: Arc<AtomicUsize>,
    /// Connections accepted since startup
    pub sessions_served: Arc<AtomicU64>,
    pub started_at: Instant,
    /// Cancelled on server shutdown; each session watches a child token
    pub shutdown: CancellationToken,
}

impl ApiState {
    pub fn new(
        annotator: Arc<dyn AngleAnnotator>,
        config: AnalyzerConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            annotator,
            config: Arc::new(config),
            active_sessions: Arc::new(AtomicUsize::new(0)),
            sessions_served: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
            shutdown,
        }
    }

    pub fn active_sessions(&self) -> usize {
        self.active_sessions.load(Ordering::Relaxed)
    }

    /// Register a new session; the count drops again when the guard does.
    pub fn session_guard(&self) -> SessionGuard {
        self.active_sessions.fetch_add(1, Ordering::Relaxed);
        self.sessions_served.fetch_add(1, Ordering::Relaxed);
        SessionGuard {
            active: Arc::clone(&self.active_sessions),
        }
    }
}

/// Keeps a session counted as active while alive.
pub struct SessionGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotator::SyntheticAnnotator;

    fn create_test_state() -> ApiState {
        let annotator = SyntheticAnnotator::new(0, 4_000, 45.0).unwrap();
        ApiState::new(
            Arc::new(annotator),
            AnalyzerConfig::default(),
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn test_health_counts_sessions() {
        let state = create_test_state();
        let guard = state.session_guard();

        let response = get_health(axum::extract::State(state.clone())).await;
        assert_eq!(response.active_sessions, 1);
        assert_eq!(response.sessions_served, 1);
        assert_eq!(response.annotator, "synthetic");

        drop(guard);
        let response = get_health(axum::extract::State(state)).await;
        assert_eq!(response.active_sessions, 0);
        assert_eq!(response.sessions_served, 1);
    }
}
