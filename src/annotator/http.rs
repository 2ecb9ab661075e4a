//! HTTP annotation provider client.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use super::payload::{prepare_image, RawFrameFormat};
use super::{AngleAnnotator, AnnotationError};
use crate::types::{Annotation, FrameInput};

/// Request body sent to the provider.
#[derive(Debug, Serialize)]
struct AnnotationRequest<'a> {
    image: &'a str,
    media_type: &'a str,
}

/// Posts each frame to a remote vision provider and parses its JSON reply.
#[derive(Clone)]
pub struct HttpAnnotator {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
    timeout: Duration,
    raw_format: RawFrameFormat,
}

impl HttpAnnotator {
    pub fn new(url: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self, AnnotationError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnnotationError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            url: url.trim_end_matches('/').to_string(),
            api_key: api_key.map(str::to_string),
            timeout,
            raw_format: RawFrameFormat::default(),
        })
    }

    /// Geometry used to decode raw RGBA frames.
    pub fn with_raw_format(mut self, raw_format: RawFrameFormat) -> Self {
        self.raw_format = raw_format;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn map_error(&self, err: &reqwest::Error) -> AnnotationError {
        if err.is_timeout() {
            AnnotationError::Timeout(self.timeout)
        } else if err.is_decode() {
            AnnotationError::Malformed(err.to_string())
        } else {
            AnnotationError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl AngleAnnotator for HttpAnnotator {
    async fn annotate(&self, frame: &FrameInput) -> Result<Annotation, AnnotationError> {
        let prepared = prepare_image(frame, self.raw_format)?;
        let body = AnnotationRequest {
            image: &prepared.data,
            media_type: &prepared.media_type,
        };
        let mut req = self.http.post(&self.url).json(&body);
        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }

        let resp = req.send().await.map_err(|e| self.map_error(&e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AnnotationError::Provider(status.as_u16()));
        }

        resp.json::<Annotation>().await.map_err(|e| self.map_error(&e))
    }

    fn backend_name(&self) -> &'static str {
        "http"
    }
}
