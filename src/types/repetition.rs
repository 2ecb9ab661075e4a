//! Finalized repetitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Side a repetition is attributed to.
///
/// Assigned by the parity of the repetition's position in the session
/// history, not by any detected body side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeakPosition {
    Left,
    Right,
}

impl PeakPosition {
    /// Side for the repetition at zero-based history `index`.
    pub const fn for_index(index: usize) -> Self {
        if index % 2 == 0 {
            PeakPosition::Left
        } else {
            PeakPosition::Right
        }
    }
}

impl std::fmt::Display for PeakPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeakPosition::Left => write!(f, "left"),
            PeakPosition::Right => write!(f, "right"),
        }
    }
}

/// One finalized movement cycle. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedRepetition {
    /// 1-based, contiguous within a session
    pub rep_number: usize,

    /// Largest angle observed while the repetition was open (degrees)
    pub max_angle: f64,

    /// Last buffered sample time minus start time
    pub duration_seconds: f64,

    /// Mean form quality over the buffered samples
    pub avg_form_quality: f64,

    pub peak_position: PeakPosition,

    /// When the repetition opened
    pub timestamp: DateTime<Utc>,
}
