//! Angle Annotation Backends
//!
//! The image-to-angle conversion is an external capability. This module
//! defines the seam the session talks to and the backends behind it:
//!
//! - **HttpAnnotator**: remote vision provider, one POST per frame
//! - **SyntheticAnnotator**: simulated stretch cycles for demos and soak runs
//!
//! Every annotation is validated before it reaches the segmenter, so a
//! provider returning out-of-range values is treated like any other
//! provider failure.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{AnnotatorBackend, AnnotatorConfig};
use crate::types::{Annotation, FrameInput};

mod http;
mod payload;
mod synthetic;

pub use http::HttpAnnotator;
pub use payload::{prepare_image, PreparedImage, RawFrameFormat};
pub use synthetic::SyntheticAnnotator;

/// Annotation failures. Frame-level ones are recoverable: the session emits
/// an error message for the frame and carries on. `Config` only arises
/// while building a backend.
#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("Annotation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Annotation provider returned status {0}")]
    Provider(u16),

    #[error("Annotation transport error: {0}")]
    Transport(String),

    #[error("Malformed annotation: {0}")]
    Malformed(String),

    #[error("Invalid frame payload: {0}")]
    InvalidPayload(String),

    #[error("Annotator configuration error: {0}")]
    Config(String),
}

/// Turns one frame into an angle measurement.
#[async_trait]
pub trait AngleAnnotator: Send + Sync {
    async fn annotate(&self, frame: &FrameInput) -> Result<Annotation, AnnotationError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Reject values a provider should never return.
pub fn validate_annotation(annotation: &Annotation) -> Result<(), AnnotationError> {
    if !annotation.angle.is_finite() {
        return Err(AnnotationError::Malformed(format!(
            "angle is not finite ({})",
            annotation.angle
        )));
    }
    if !(0.0..=1.0).contains(&annotation.form_quality) {
        return Err(AnnotationError::Malformed(format!(
            "form_quality {} outside [0, 1]",
            annotation.form_quality
        )));
    }
    if !(0.0..=1.0).contains(&annotation.posture_alignment) {
        return Err(AnnotationError::Malformed(format!(
            "posture_alignment {} outside [0, 1]",
            annotation.posture_alignment
        )));
    }
    Ok(())
}

/// Build the backend selected by `config.backend`.
pub fn create_annotator(config: &AnnotatorConfig) -> Result<Arc<dyn AngleAnnotator>, AnnotationError> {
    let annotator: Arc<dyn AngleAnnotator> = match config.backend {
        AnnotatorBackend::Http => Arc::new(
            HttpAnnotator::new(&config.url, config.api_key.as_deref(), config.timeout())?
                .with_raw_format(RawFrameFormat {
                    width: config.frame_width,
                    height: config.frame_height,
                    jpeg_quality: config.jpeg_quality,
                }),
        ),
        AnnotatorBackend::Synthetic => Arc::new(SyntheticAnnotator::new(
            config.synthetic_seed,
            config.synthetic_cycle_ms,
            config.synthetic_peak_angle,
        )?),
    };

    tracing::info!(
        backend = annotator.backend_name(),
        timeout_secs = config.timeout_secs,
        "Annotation backend ready"
    );
    Ok(annotator)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotation(angle: f64, form_quality: f64) -> Annotation {
        Annotation {
            angle,
            form_quality,
            posture_alignment: 0.5,
            feedback: String::new(),
            safety_concerns: Vec::new(),
        }
    }

    #[test]
    fn test_validate_accepts_bounds() {
        assert!(validate_annotation(&annotation(-10.0, 0.0)).is_ok());
        assert!(validate_annotation(&annotation(90.0, 1.0)).is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert!(matches!(
            validate_annotation(&annotation(f64::NAN, 0.5)),
            Err(AnnotationError::Malformed(_))
        ));
        assert!(matches!(
            validate_annotation(&annotation(20.0, 1.2)),
            Err(AnnotationError::Malformed(_))
        ));
        let mut a = annotation(20.0, 0.5);
        a.posture_alignment = -0.1;
        assert!(validate_annotation(&a).is_err());
    }

    #[test]
    fn test_create_synthetic_backend() {
        let config = AnnotatorConfig {
            backend: AnnotatorBackend::Synthetic,
            ..AnnotatorConfig::default()
        };
        let annotator = create_annotator(&config).unwrap();
        assert_eq!(annotator.backend_name(), "synthetic");
    }

    #[test]
    fn test_create_http_backend() {
        let annotator = create_annotator(&AnnotatorConfig::default()).unwrap();
        assert_eq!(annotator.backend_name(), "http");
    }
}
