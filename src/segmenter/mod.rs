//! Repetition Segmentation
//!
//! Hysteresis state machine over one session's angle stream. A single
//! threshold both opens and closes a repetition:
//!
//! ```text
//! idle ──angle > threshold──▶ open ──angle < threshold && buffered > min_frames──▶ finalize ──▶ idle
//!                              │ ▲
//!                              └─┘ every in-progress frame is buffered,
//!                                  including the opening and closing frames
//! ```
//!
//! A repetition that drops below the threshold before it has buffered enough
//! frames stays open and keeps accumulating. Without a configured
//! `max_rep_duration_secs` it can stay open indefinitely.

use chrono::DateTime;
use tracing::{debug, warn};

use crate::config::{OverlongPolicy, SegmenterConfig};
use crate::types::{AngleSample, CompletedRepetition, PeakPosition};

/// Samples belonging to the repetition currently in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenRepetition {
    samples: Vec<AngleSample>,
    start_timestamp_ms: i64,
}

impl OpenRepetition {
    fn new(start_timestamp_ms: i64) -> Self {
        Self {
            samples: Vec::new(),
            start_timestamp_ms,
        }
    }

    pub fn samples(&self) -> &[AngleSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub const fn start_timestamp_ms(&self) -> i64 {
        self.start_timestamp_ms
    }

    /// Seconds between the opening frame and `timestamp_ms`. Client
    /// timestamps are untrusted, so the difference saturates.
    fn elapsed_secs(&self, timestamp_ms: i64) -> f64 {
        timestamp_ms.saturating_sub(self.start_timestamp_ms) as f64 / 1000.0
    }

    /// Build the finished repetition. `history_len` is the number of
    /// repetitions already completed in the session.
    ///
    /// Returns `None` for an empty buffer.
    pub fn finalize(self, history_len: usize) -> Option<CompletedRepetition> {
        let last = self.samples.last()?;
        let count = self.samples.len() as f64;

        let max_angle = self
            .samples
            .iter()
            .map(|s| s.angle)
            .fold(f64::NEG_INFINITY, f64::max);
        let avg_form_quality =
            self.samples.iter().map(|s| s.form_quality).sum::<f64>() / count;

        Some(CompletedRepetition {
            rep_number: history_len + 1,
            max_angle,
            duration_seconds: self.elapsed_secs(last.timestamp_ms),
            avg_form_quality,
            peak_position: PeakPosition::for_index(history_len),
            timestamp: DateTime::from_timestamp_millis(self.start_timestamp_ms)
                .unwrap_or_default(),
        })
    }
}

/// Per-session repetition detector. Owns the (at most one) open repetition.
#[derive(Debug, Clone)]
pub struct RepSegmenter {
    config: SegmenterConfig,
    open: Option<OpenRepetition>,
    discarded: u64,
}

impl RepSegmenter {
    pub const fn new(config: SegmenterConfig) -> Self {
        Self {
            config,
            open: None,
            discarded: 0,
        }
    }

    pub const fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    pub const fn is_in_progress(&self) -> bool {
        self.open.is_some()
    }

    pub const fn open_repetition(&self) -> Option<&OpenRepetition> {
        self.open.as_ref()
    }

    /// Repetitions dropped by the max-duration guard or at session end.
    pub const fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Feed one sample. Returns the repetition it completed, if any.
    ///
    /// `history_len` is the number of repetitions the session has already
    /// completed; it determines the new repetition's number and side.
    pub fn push(&mut self, sample: AngleSample, history_len: usize) -> Option<CompletedRepetition> {
        let threshold = self.config.threshold;
        let angle = sample.angle;
        let timestamp_ms = sample.timestamp_ms;

        if self.open.is_none() && angle > threshold {
            debug!(angle, timestamp_ms, "Repetition opened");
            self.open = Some(OpenRepetition::new(timestamp_ms));
        }

        let (buffered, elapsed_secs) = {
            let open = self.open.as_mut()?;
            open.samples.push(sample);
            (open.len(), open.elapsed_secs(timestamp_ms))
        };

        if angle < threshold && buffered > self.config.min_frames {
            return self.close(history_len);
        }

        match self.config.max_rep_duration_secs {
            Some(max_secs) if elapsed_secs > max_secs => match self.config.overlong_policy {
                OverlongPolicy::Discard => {
                    warn!(
                        elapsed_secs,
                        max_secs, buffered, "Repetition exceeded max duration, discarding"
                    );
                    self.discard_open();
                    None
                }
                OverlongPolicy::ForceClose => {
                    warn!(
                        elapsed_secs,
                        max_secs, buffered, "Repetition exceeded max duration, force-closing"
                    );
                    self.close(history_len)
                }
            },
            _ => None,
        }
    }

    /// Drop the open repetition without finalizing it.
    ///
    /// Returns how many samples were buffered, or `None` if nothing was open.
    pub fn discard_open(&mut self) -> Option<usize> {
        let open = self.open.take()?;
        self.discarded += 1;
        Some(open.len())
    }

    fn close(&mut self, history_len: usize) -> Option<CompletedRepetition> {
        let open = self.open.take()?;
        let rep = open.finalize(history_len);
        if rep.is_none() {
            debug!("Skipping finalize of an empty repetition");
        }
        rep
    }
}
