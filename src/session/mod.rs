//! Session Orchestration
//!
//! One [`Session`] per frame stream. It exclusively owns the stream's
//! segmenter, repetition history and report memo; nothing is shared between
//! sessions, so concurrent sessions need no locking.
//!
//! ## Per-frame flow
//!
//! ```text
//! annotate (bounded) ──fail──▶ error message, state untouched
//!     │
//!     ▼
//! segment ──▶ append finalized repetition
//!     │
//!     ▼
//! report (≥ min reps) ──▶ project points ──▶ analyzed message
//! ```

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::annotator::{validate_annotation, AngleAnnotator, AnnotationError};
use crate::config::AnalyzerConfig;
use crate::report::ReportGenerator;
use crate::segmenter::{OpenRepetition, RepSegmenter};
use crate::types::{
    AngleSample, Annotation, CompletedRepetition, ExerciseReport, FrameAnalysis, FrameInput,
    SessionMessage,
};
use crate::visualization::project_points;

/// Counters reported when a session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames_processed: u64,
    pub annotation_failures: u64,
    pub repetitions_completed: u64,
    /// Open repetitions dropped by the duration guard or at session end
    pub repetitions_discarded: u64,
}

pub struct Session {
    id: String,
    annotator: Arc<dyn AngleAnnotator>,
    annotation_timeout: Duration,
    segmenter: RepSegmenter,
    reports: ReportGenerator,
    history: Vec<CompletedRepetition>,
    stats: SessionStats,
}

impl Session {
    pub fn new(annotator: Arc<dyn AngleAnnotator>, config: &AnalyzerConfig) -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        debug!(session_id = %id, backend = annotator.backend_name(), "Session created");
        Self {
            id,
            annotator,
            annotation_timeout: config.annotator.timeout(),
            segmenter: RepSegmenter::new(config.segmenter.clone()),
            reports: ReportGenerator::new(&config.report),
            history: Vec::new(),
            stats: SessionStats::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn history(&self) -> &[CompletedRepetition] {
        &self.history
    }

    pub const fn open_repetition(&self) -> Option<&OpenRepetition> {
        self.segmenter.open_repetition()
    }

    pub const fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Current report, if enough repetitions have completed.
    pub fn report(&mut self) -> Option<ExerciseReport> {
        self.reports.generate(&self.history)
    }

    /// Annotate and analyze one frame.
    ///
    /// Annotation failures yield an error message and leave the session
    /// exactly as it was.
    pub async fn process_frame(&mut self, frame: &FrameInput) -> SessionMessage {
        self.stats.frames_processed += 1;

        match self.annotate(frame).await {
            Ok(annotation) => self.apply_annotation(frame.timestamp, &annotation),
            Err(e) => {
                self.stats.annotation_failures += 1;
                warn!(
                    session_id = %self.id,
                    timestamp = frame.timestamp,
                    error = %e,
                    "Annotation failed, frame skipped"
                );
                SessionMessage::error(e.to_string())
            }
        }
    }

    /// Run an already-validated annotation through segmentation, report
    /// and projection.
    pub fn apply_annotation(&mut self, timestamp_ms: i64, annotation: &Annotation) -> SessionMessage {
        let sample = AngleSample::from_annotation(timestamp_ms, annotation);
        let discarded_before = self.segmenter.discarded();

        if let Some(rep) = self.segmenter.push(sample, self.history.len()) {
            info!(
                session_id = %self.id,
                rep_number = rep.rep_number,
                max_angle = rep.max_angle,
                duration_secs = rep.duration_seconds,
                side = %rep.peak_position,
                "Repetition completed"
            );
            self.history.push(rep);
            self.stats.repetitions_completed += 1;
        }
        self.stats.repetitions_discarded += self.segmenter.discarded() - discarded_before;

        SessionMessage::Analyzed(FrameAnalysis {
            current_rep: self.history.len() + 1,
            current_angle: annotation.angle,
            form_feedback: annotation.feedback.clone(),
            safety_concerns: annotation.safety_concerns.clone(),
            report: self.reports.generate(&self.history),
            points: project_points(&self.history),
        })
    }

    async fn annotate(&self, frame: &FrameInput) -> Result<Annotation, AnnotationError> {
        let annotation = tokio::time::timeout(self.annotation_timeout, self.annotator.annotate(frame))
            .await
            .map_err(|_| AnnotationError::Timeout(self.annotation_timeout))??;
        validate_annotation(&annotation)?;
        Ok(annotation)
    }

    /// End the session. Any open repetition is dropped, not flushed.
    pub fn finish(mut self) -> SessionStats {
        if let Some(buffered) = self.segmenter.discard_open() {
            self.stats.repetitions_discarded += 1;
            debug!(session_id = %self.id, buffered, "Open repetition discarded at session end");
        }
        info!(
            session_id = %self.id,
            frames = self.stats.frames_processed,
            failures = self.stats.annotation_failures,
            repetitions = self.stats.repetitions_completed,
            discarded = self.stats.repetitions_discarded,
            "Session ended"
        );
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Replays scripted angles keyed by timestamp; unknown timestamps fail.
    struct ScriptedAnnotator {
        angles: HashMap<i64, f64>,
    }

    #[async_trait]
    impl AngleAnnotator for ScriptedAnnotator {
        async fn annotate(&self, frame: &FrameInput) -> Result<Annotation, AnnotationError> {
            let angle = *self
                .angles
                .get(&frame.timestamp)
                .ok_or(AnnotationError::Provider(503))?;
            Ok(Annotation {
                angle,
                form_quality: 0.9,
                posture_alignment: 0.9,
                feedback: format!("angle {angle}"),
                safety_concerns: Vec::new(),
            })
        }

        fn backend_name(&self) -> &'static str {
            "scripted"
        }
    }

    struct StalledAnnotator;

    #[async_trait]
    impl AngleAnnotator for StalledAnnotator {
        async fn annotate(&self, _frame: &FrameInput) -> Result<Annotation, AnnotationError> {
            std::future::pending().await
        }

        fn backend_name(&self) -> &'static str {
            "stalled"
        }
    }

    fn scripted_session(angles: &[f64]) -> Session {
        let angles = angles
            .iter()
            .enumerate()
            .map(|(i, &a)| (i as i64 * 100, a))
            .collect();
        Session::new(
            Arc::new(ScriptedAnnotator { angles }),
            &AnalyzerConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_error_leaves_state_untouched() {
        let mut session = scripted_session(&[20.0, 25.0]);
        session.process_frame(&FrameInput::new(0, "x")).await;
        session.process_frame(&FrameInput::new(100, "x")).await;
        let before = session.open_repetition().cloned();

        let msg = session.process_frame(&FrameInput::new(999, "x")).await;
        assert!(msg.is_error());
        assert_eq!(session.open_repetition().cloned(), before);
        assert!(session.history().is_empty());
        assert_eq!(session.stats().annotation_failures, 1);
        assert_eq!(session.stats().frames_processed, 3);
    }

    #[tokio::test]
    async fn test_messages_track_history() {
        let cycle = [20.0, 30.0, 40.0, 30.0, 20.0, 18.0, 0.0];
        let mut session = scripted_session(&cycle);

        let mut last = None;
        for i in 0..cycle.len() {
            last = Some(session.process_frame(&FrameInput::new(i as i64 * 100, "x")).await);
        }

        let analysis = last.unwrap().analysis().cloned().unwrap();
        assert_eq!(analysis.current_rep, 2);
        assert_eq!(analysis.current_angle, 0.0);
        assert_eq!(analysis.form_feedback, "angle 0");
        assert!(analysis.report.is_none());
        assert_eq!(analysis.points, vec![[60.0, 80.0]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_annotation_timeout_is_frame_error() {
        let mut config = AnalyzerConfig::default();
        config.annotator.timeout_secs = 1;
        let mut session = Session::new(Arc::new(StalledAnnotator), &config);

        let msg = session.process_frame(&FrameInput::new(0, "x")).await;
        match msg {
            SessionMessage::Error { error } => assert!(error.contains("timed out")),
            other => panic!("expected timeout error, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_annotation_rejected_before_segmenting() {
        let annotation = Annotation {
            angle: 30.0,
            form_quality: 3.0,
            posture_alignment: 0.5,
            feedback: String::new(),
            safety_concerns: Vec::new(),
        };
        assert!(validate_annotation(&annotation).is_err());
    }

    #[test]
    fn test_finish_discards_open_repetition() {
        let mut session = scripted_session(&[]);
        let annotation = Annotation {
            angle: 25.0,
            form_quality: 0.8,
            posture_alignment: 0.8,
            feedback: String::new(),
            safety_concerns: Vec::new(),
        };
        session.apply_annotation(0, &annotation);
        session.apply_annotation(100, &annotation);
        assert!(session.open_repetition().is_some());

        let stats = session.finish();
        assert_eq!(stats.repetitions_discarded, 1);
        assert_eq!(stats.repetitions_completed, 0);
    }
}
