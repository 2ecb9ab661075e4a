//! Inbound frames and their per-frame annotations.

use serde::{Deserialize, Serialize};

use crate::config::defaults::DEFAULT_MEDIA_TYPE;

/// One frame of the session stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameInput {
    /// Capture time, milliseconds since the Unix epoch
    pub timestamp: i64,

    /// Image payload
    pub data: FramePayload,

    /// MIME type of an encoded `data`; raw pixels are always sent as JPEG
    #[serde(default = "default_media_type")]
    pub media_type: String,
}

/// Image payload of a frame.
///
/// Browser clients send the canvas pixels straight from `ImageData` as an
/// integer array; other clients send an already-encoded (base64) image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FramePayload {
    /// Base64-encoded image, forwarded untouched
    Encoded(String),
    /// Row-major RGBA pixels, 4 bytes per pixel
    Rgba(Vec<u8>),
}

impl FramePayload {
    pub fn is_empty(&self) -> bool {
        match self {
            FramePayload::Encoded(s) => s.trim().is_empty(),
            FramePayload::Rgba(px) => px.is_empty(),
        }
    }
}

fn default_media_type() -> String {
    DEFAULT_MEDIA_TYPE.to_string()
}

impl FrameInput {
    pub fn new(timestamp: i64, data: impl Into<String>) -> Self {
        Self {
            timestamp,
            data: FramePayload::Encoded(data.into()),
            media_type: default_media_type(),
        }
    }

    /// Frame carrying raw RGBA pixels.
    pub fn rgba(timestamp: i64, pixels: Vec<u8>) -> Self {
        Self {
            timestamp,
            data: FramePayload::Rgba(pixels),
            media_type: default_media_type(),
        }
    }
}

/// Structured measurement returned by the annotation provider for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Stretch angle in degrees
    pub angle: f64,

    /// Form quality (0.0-1.0)
    pub form_quality: f64,

    /// Body alignment and posture (0.0-1.0)
    #[serde(default)]
    pub posture_alignment: f64,

    /// Free-text coaching feedback
    #[serde(default)]
    pub feedback: String,

    #[serde(default)]
    pub safety_concerns: Vec<String>,
}

/// A measurement buffered while a repetition is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngleSample {
    pub timestamp_ms: i64,
    pub angle: f64,
    pub form_quality: f64,
    pub feedback: String,
    pub safety_concerns: Vec<String>,
}

impl AngleSample {
    pub fn from_annotation(timestamp_ms: i64, annotation: &Annotation) -> Self {
        Self {
            timestamp_ms,
            angle: annotation.angle,
            form_quality: annotation.form_quality,
            feedback: annotation.feedback.clone(),
            safety_concerns: annotation.safety_concerns.clone(),
        }
    }
}
