//! Outbound per-frame messages.

use serde::{Deserialize, Serialize};

use super::ExerciseReport;

/// A visualization point, `[x, y]`.
pub type Point = [f64; 2];

/// What a session emits for every frame it receives.
///
/// Serializes with a `status` tag: `"analyzed"` or `"error"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SessionMessage {
    Analyzed(FrameAnalysis),
    Error { error: String },
}

impl SessionMessage {
    pub fn error(message: impl Into<String>) -> Self {
        SessionMessage::Error {
            error: message.into(),
        }
    }

    pub const fn is_error(&self) -> bool {
        matches!(self, SessionMessage::Error { .. })
    }

    pub const fn analysis(&self) -> Option<&FrameAnalysis> {
        match self {
            SessionMessage::Analyzed(a) => Some(a),
            SessionMessage::Error { .. } => None,
        }
    }
}

/// Payload of an `"analyzed"` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameAnalysis {
    /// Number the next repetition will get (history length + 1)
    pub current_rep: usize,

    pub current_angle: f64,

    pub form_feedback: String,

    pub safety_concerns: Vec<String>,

    /// Present once enough repetitions have completed, `null` otherwise
    pub report: Option<ExerciseReport>,

    pub points: Vec<Point>,
}
