//! Cross-repetition exercise report.

use serde::{Deserialize, Serialize};

/// Derived snapshot over a session's full repetition history.
///
/// Recomputed from scratch whenever generated; never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseReport {
    pub total_reps: usize,

    /// Mean peak angle (degrees)
    pub avg_angle: f64,

    /// Mean repetition duration (seconds)
    pub avg_duration: f64,

    /// Mean of per-repetition form quality
    pub form_consistency: f64,

    /// Largest minus smallest peak angle
    pub range_of_motion: f64,

    /// 1.0 when left and right repetitions reach the same mean depth
    pub symmetry_score: f64,

    pub overall_quality: f64,

    pub recommendations: Vec<String>,

    /// 1-based number of the repetition with the best form
    pub best_rep: usize,

    pub needs_improvement: Vec<String>,
}
