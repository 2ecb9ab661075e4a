//! Turns a frame payload into the `{image, media_type}` pair a provider expects.

use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};

use super::AnnotationError;
use crate::config::defaults;
use crate::types::{FrameInput, FramePayload};

/// Geometry and encoding of raw RGBA frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrameFormat {
    pub width: u32,
    pub height: u32,
    pub jpeg_quality: u8,
}

impl Default for RawFrameFormat {
    fn default() -> Self {
        Self {
            width: defaults::FRAME_WIDTH_PX,
            height: defaults::FRAME_HEIGHT_PX,
            jpeg_quality: defaults::JPEG_QUALITY,
        }
    }
}

impl RawFrameFormat {
    fn expected_len(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(4)
    }
}

/// Image ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedImage {
    /// Base64-encoded image
    pub data: String,
    pub media_type: String,
}

/// Encoded payloads pass through; raw pixels drop alpha and become a base64 JPEG.
pub fn prepare_image(
    frame: &FrameInput,
    format: RawFrameFormat,
) -> Result<PreparedImage, AnnotationError> {
    if frame.data.is_empty() {
        return Err(AnnotationError::InvalidPayload("empty image payload".to_string()));
    }

    match &frame.data {
        FramePayload::Encoded(data) => Ok(PreparedImage {
            data: data.clone(),
            media_type: frame.media_type.clone(),
        }),
        FramePayload::Rgba(pixels) => {
            let jpeg = encode_jpeg(pixels, format)?;
            Ok(PreparedImage {
                data: base64::engine::general_purpose::STANDARD.encode(jpeg),
                media_type: "image/jpeg".to_string(),
            })
        }
    }
}

fn encode_jpeg(pixels: &[u8], format: RawFrameFormat) -> Result<Vec<u8>, AnnotationError> {
    if format.expected_len() != Some(pixels.len()) {
        return Err(AnnotationError::InvalidPayload(format!(
            "expected {}x{} RGBA frame ({} bytes), got {} bytes",
            format.width,
            format.height,
            format.expected_len().unwrap_or(usize::MAX),
            pixels.len()
        )));
    }

    let rgba = RgbaImage::from_raw(format.width, format.height, pixels.to_vec()).ok_or_else(
        || AnnotationError::InvalidPayload("pixel buffer does not match frame size".to_string()),
    )?;
    let rgb = DynamicImage::ImageRgba8(rgba).to_rgb8();

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, format.jpeg_quality)
        .encode_image(&rgb)
        .map_err(|e| AnnotationError::InvalidPayload(format!("JPEG encoding failed: {e}")))?;
    Ok(jpeg)
}
