//! repsense: Stretching Repetition Analysis
//!
//! Streams camera frames through an angle annotator, segments the angle
//! signal into repetitions and keeps a running exercise report.
//!
//! ## Architecture
//!
//! - **Annotator**: external image-to-angle capability behind a trait
//! - **Segmenter**: threshold state machine that opens and closes repetitions
//! - **Report**: aggregate statistics and recommendations over finished reps
//! - **Session**: per-stream owner of all of the above
//! - **Pipeline / API**: JSON-lines replay and WebSocket transports

pub mod annotator;
pub mod api;
pub mod config;
pub mod pipeline;
pub mod report;
pub mod segmenter;
pub mod session;
pub mod types;
pub mod visualization;

// Re-export configuration
pub use config::AnalyzerConfig;

// Re-export commonly used types
pub use types::{
    AngleSample, Annotation, CompletedRepetition, ExerciseReport, FrameAnalysis, FrameInput,
    FramePayload, PeakPosition, Point, SessionMessage,
};

pub use annotator::{AngleAnnotator, AnnotationError, HttpAnnotator, SyntheticAnnotator};
pub use report::{compute_report, ReportGenerator};
pub use segmenter::RepSegmenter;
pub use session::{Session, SessionStats};
