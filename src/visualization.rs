//! Repetition chart projection.

use crate::config::defaults::{POINT_X_SCALE, POINT_Y_SCALE};
use crate::types::{CompletedRepetition, Point};

/// One point per repetition: `(rep_number * 60, max_angle * 2)`.
pub fn project_points(reps: &[CompletedRepetition]) -> Vec<Point> {
    reps.iter()
        .map(|r| [r.rep_number as f64 * POINT_X_SCALE, r.max_angle * POINT_Y_SCALE])
        .collect()
}
