//! System-wide default constants.
//!
//! Centralises the numbers that define the base analysis behaviour.
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Segmentation
// ============================================================================

/// Hysteresis threshold (degrees) used both to open and to close a repetition.
pub const REP_THRESHOLD_DEG: f64 = 15.0;

/// A repetition can only close once its buffer holds more than this many samples.
pub const MIN_FRAMES_PER_REP: usize = 6;

// ============================================================================
// Report
// ============================================================================

/// Minimum completed repetitions before a report is generated.
pub const MIN_REPS_FOR_REPORT: usize = 3;

/// Angle consistency below this triggers the stretch-depth recommendation.
pub const ANGLE_CONSISTENCY_FLOOR: f64 = 0.8;

/// Mean form quality below this triggers the form recommendation.
pub const FORM_CONSISTENCY_FLOOR: f64 = 0.7;

/// Mean peak angle (degrees) below this flags stretch range for improvement.
pub const MIN_AVG_ANGLE_DEG: f64 = 30.0;

/// Population std-dev of repetition durations (seconds) above this flags timing.
pub const MAX_DURATION_STD_DEV_SECS: f64 = 2.0;

// ============================================================================
// Visualization
// ============================================================================

/// Horizontal spacing per repetition number.
pub const POINT_X_SCALE: f64 = 60.0;

/// Vertical scale applied to the peak angle.
pub const POINT_Y_SCALE: f64 = 2.0;

// ============================================================================
// Annotation provider
// ============================================================================

/// Maximum time to wait for one frame's annotation before reporting an error (seconds).
pub const ANNOTATION_TIMEOUT_SECS: u64 = 30;

/// MIME type assumed when a frame does not declare one.
pub const DEFAULT_MEDIA_TYPE: &str = "image/jpeg";

/// Geometry of raw RGBA frames sent by the browser client (pixels).
pub const FRAME_WIDTH_PX: u32 = 640;
pub const FRAME_HEIGHT_PX: u32 = 480;

/// JPEG quality used when re-encoding raw frames.
pub const JPEG_QUALITY: u8 = 95;

/// Length of one simulated stretch cycle for the synthetic annotator (ms).
pub const SYNTHETIC_CYCLE_MS: i64 = 4_000;

/// Peak angle reached by the synthetic annotator (degrees).
pub const SYNTHETIC_PEAK_ANGLE_DEG: f64 = 45.0;

// ============================================================================
// Server
// ============================================================================

/// Default HTTP bind address.
pub const SERVER_ADDR: &str = "0.0.0.0:8000";
