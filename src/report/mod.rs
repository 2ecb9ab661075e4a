//! Exercise Report Generation
//!
//! Computes the cross-repetition quality report from a session's complete
//! history. Every report is a full recompute over all repetitions: population
//! standard deviations are taken over the whole history, so a running
//! aggregate would drift from the reference numbers.
//!
//! ## Metrics
//! - Angle consistency: `1 - σ(max_angle) / mean(max_angle)`
//! - Form consistency: mean per-repetition form quality
//! - Symmetry: left (even index) vs right (odd index) mean peak angle
//! - Overall quality: mean of angle and form consistency

use statrs::statistics::Statistics;

use crate::config::defaults::{
    ANGLE_CONSISTENCY_FLOOR, FORM_CONSISTENCY_FLOOR, MAX_DURATION_STD_DEV_SECS,
    MIN_AVG_ANGLE_DEG,
};
use crate::config::ReportConfig;
use crate::types::{CompletedRepetition, ExerciseReport};

pub const REC_STRETCH_DEPTH: &str = "maintain consistent stretch depth across repetitions";
pub const REC_FORM: &str = "focus on maintaining proper form throughout the exercise";
pub const IMPROVE_RANGE: &str = "increase stretch range gradually";
pub const IMPROVE_TIMING: &str = "maintain consistent timing for each repetition";

/// Report generator for one session.
///
/// Memoizes the last report by history length. Only valid because a
/// session's history is append-only, so one generator must never be shared
/// between sessions.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    min_reps: usize,
    memo: Option<(usize, ExerciseReport)>,
}

impl ReportGenerator {
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            min_reps: config.min_reps,
            memo: None,
        }
    }

    pub const fn min_reps(&self) -> usize {
        self.min_reps
    }

    /// Report over `reps`, or `None` while fewer than `min_reps` exist.
    pub fn generate(&mut self, reps: &[CompletedRepetition]) -> Option<ExerciseReport> {
        if reps.len() < self.min_reps {
            return None;
        }
        if let Some((len, report)) = &self.memo {
            if *len == reps.len() {
                return Some(report.clone());
            }
        }

        let report = compute_report(reps)?;
        self.memo = Some((reps.len(), report.clone()));
        Some(report)
    }
}

/// Compute a report over the full history. `None` only for an empty history.
pub fn compute_report(reps: &[CompletedRepetition]) -> Option<ExerciseReport> {
    if reps.is_empty() {
        return None;
    }

    let angles: Vec<f64> = reps.iter().map(|r| r.max_angle).collect();
    let durations: Vec<f64> = reps.iter().map(|r| r.duration_seconds).collect();
    let qualities: Vec<f64> = reps.iter().map(|r| r.avg_form_quality).collect();

    let avg_angle = angles.iter().mean();
    let angle_consistency = angle_consistency(&angles, avg_angle);
    let form_consistency = qualities.iter().mean();

    let max_angle = angles.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min_angle = angles.iter().copied().fold(f64::INFINITY, f64::min);

    let mut recommendations = Vec::new();
    if angle_consistency < ANGLE_CONSISTENCY_FLOOR {
        recommendations.push(REC_STRETCH_DEPTH.to_string());
    }
    if form_consistency < FORM_CONSISTENCY_FLOOR {
        recommendations.push(REC_FORM.to_string());
    }

    let mut needs_improvement = Vec::new();
    if avg_angle < MIN_AVG_ANGLE_DEG {
        needs_improvement.push(IMPROVE_RANGE.to_string());
    }
    if durations.iter().population_std_dev() > MAX_DURATION_STD_DEV_SECS {
        needs_improvement.push(IMPROVE_TIMING.to_string());
    }

    Some(ExerciseReport {
        total_reps: reps.len(),
        avg_angle,
        avg_duration: durations.iter().mean(),
        form_consistency,
        range_of_motion: max_angle - min_angle,
        symmetry_score: symmetry_score(&angles),
        overall_quality: (angle_consistency + form_consistency) / 2.0,
        recommendations,
        best_rep: best_rep(&qualities),
        needs_improvement,
    })
}

/// `1 - σ/μ` over peak angles, population σ. Zero mean yields 0.0.
fn angle_consistency(angles: &[f64], mean: f64) -> f64 {
    if mean == 0.0 {
        return 0.0;
    }
    1.0 - angles.iter().population_std_dev() / mean
}

/// Even-indexed repetitions count as left, odd as right, matching the
/// parity rule used when repetitions are finalized.
pub fn symmetry_score(angles: &[f64]) -> f64 {
    let left: Vec<f64> = angles.iter().step_by(2).copied().collect();
    let right: Vec<f64> = angles.iter().skip(1).step_by(2).copied().collect();
    if left.is_empty() || right.is_empty() {
        return 1.0;
    }

    let avg_left = left.iter().mean();
    let avg_right = right.iter().mean();
    let larger = avg_left.max(avg_right);
    if larger == 0.0 {
        return 1.0;
    }
    1.0 - (avg_left - avg_right).abs() / larger
}

/// 1-based index of the first maximum; ties go to the earliest repetition.
fn best_rep(qualities: &[f64]) -> usize {
    let mut best = 0;
    for (i, &q) in qualities.iter().enumerate().skip(1) {
        if q > qualities[best] {
            best = i;
        }
    }
    best + 1
}
