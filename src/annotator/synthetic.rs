//! Simulated annotation backend.
//!
//! Produces a side-stretch waveform from the frame timestamp alone, so the
//! same `(seed, timestamp)` always yields the same annotation. The image
//! payload is ignored.

use async_trait::async_trait;
use rand::prelude::*;
use rand_distr::{Distribution, Normal};

use super::{AngleAnnotator, AnnotationError};
use crate::types::{Annotation, FrameInput};

/// Angle noise (degrees, 1σ)
const ANGLE_NOISE_STD: f64 = 1.5;

/// Form quality noise (1σ)
const QUALITY_NOISE_STD: f64 = 0.05;

const BASE_FORM_QUALITY: f64 = 0.85;

pub struct SyntheticAnnotator {
    seed: u64,
    cycle_ms: i64,
    peak_angle: f64,
    angle_noise: Normal<f64>,
    quality_noise: Normal<f64>,
}

impl SyntheticAnnotator {
    pub fn new(seed: u64, cycle_ms: i64, peak_angle: f64) -> Result<Self, AnnotationError> {
        if cycle_ms <= 0 {
            return Err(AnnotationError::Config(format!(
                "synthetic cycle must be positive, got {cycle_ms} ms"
            )));
        }
        let angle_noise = Normal::new(0.0, ANGLE_NOISE_STD)
            .map_err(|e| AnnotationError::Config(e.to_string()))?;
        let quality_noise = Normal::new(0.0, QUALITY_NOISE_STD)
            .map_err(|e| AnnotationError::Config(e.to_string()))?;

        Ok(Self {
            seed,
            cycle_ms,
            peak_angle,
            angle_noise,
            quality_noise,
        })
    }

    /// Noise-free angle at `timestamp_ms`: `peak * sin²(π * phase)`.
    pub fn clean_angle(&self, timestamp_ms: i64) -> f64 {
        let phase = timestamp_ms.rem_euclid(self.cycle_ms) as f64 / self.cycle_ms as f64;
        self.peak_angle * (std::f64::consts::PI * phase).sin().powi(2)
    }

    fn feedback_for(&self, angle: f64) -> &'static str {
        let ratio = angle / self.peak_angle;
        if ratio > 0.9 {
            "Good depth, hold the stretch"
        } else if ratio > 0.4 {
            "Keep reaching over"
        } else {
            "Return to neutral and breathe"
        }
    }
}

#[async_trait]
impl AngleAnnotator for SyntheticAnnotator {
    async fn annotate(&self, frame: &FrameInput) -> Result<Annotation, AnnotationError> {
        #[allow(clippy::cast_sign_loss)]
        let mut rng = StdRng::seed_from_u64(self.seed ^ frame.timestamp as u64);

        let angle = (self.clean_angle(frame.timestamp) + self.angle_noise.sample(&mut rng)).max(0.0);
        let form_quality = (BASE_FORM_QUALITY + self.quality_noise.sample(&mut rng)).clamp(0.0, 1.0);
        let posture_alignment = (BASE_FORM_QUALITY + self.quality_noise.sample(&mut rng)).clamp(0.0, 1.0);

        let mut safety_concerns = Vec::new();
        if angle > self.peak_angle * 1.1 {
            safety_concerns.push("Overextension: ease back slightly".to_string());
        }

        Ok(Annotation {
            angle,
            form_quality,
            posture_alignment,
            feedback: self.feedback_for(angle).to_string(),
            safety_concerns,
        })
    }

    fn backend_name(&self) -> &'static str {
        "synthetic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_angle_shape() {
        let a = SyntheticAnnotator::new(0, 4_000, 45.0).unwrap();
        assert!(a.clean_angle(0).abs() < 1e-9);
        assert!((a.clean_angle(2_000) - 45.0).abs() < 1e-9);
        assert!(a.clean_angle(4_000).abs() < 1e-9);
        assert!((a.clean_angle(1_000) - 22.5).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_non_positive_cycle() {
        assert!(matches!(
            SyntheticAnnotator::new(0, 0, 45.0),
            Err(AnnotationError::Config(_))
        ));
        assert!(matches!(
            SyntheticAnnotator::new(0, -4_000, 45.0),
            Err(AnnotationError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_deterministic_per_timestamp() {
        let a = SyntheticAnnotator::new(7, 4_000, 45.0).unwrap();
        let frame = FrameInput::new(1_700_000_001_234, "");
        let first = a.annotate(&frame).await.unwrap();
        let second = a.annotate(&frame).await.unwrap();
        assert_eq!(first, second);
        assert!((0.0..=1.0).contains(&first.form_quality));
        assert!(first.angle >= 0.0);
    }
}
