//! Frame source abstraction.
//!
//! Provides a unified trait for reading frames from different transports:
//! in-memory replay, JSON lines (stdin or file), and WebSocket connections
//! (see [`crate::api::ws`]).

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::types::FrameInput;

/// Events produced by a frame source.
#[derive(Debug)]
pub enum FrameEvent {
    /// A well-formed frame.
    Frame(FrameInput),
    /// Input that could not be parsed as a frame. The session answers it
    /// with an error message and keeps going.
    Malformed(String),
    /// No more frames (EOF, peer closed the connection).
    Eof,
}

/// Trait abstracting where frames come from.
///
/// The processing loop calls [`next_frame`](FrameSource::next_frame) in a
/// `select!` with cancellation, so implementations must be cancel-safe at
/// frame boundaries.
#[async_trait]
pub trait FrameSource: Send {
    /// Read the next frame.
    ///
    /// Returns `Err` only for unrecoverable transport errors.
    async fn next_frame(&mut self) -> Result<FrameEvent>;

    /// Human-readable name for logging (e.g. "replay", "stdin", "websocket").
    fn source_name(&self) -> &str;
}

/// Parse one JSON-encoded frame.
pub fn parse_frame(text: &str) -> FrameEvent {
    match serde_json::from_str::<FrameInput>(text) {
        Ok(frame) => FrameEvent::Frame(frame),
        Err(e) => FrameEvent::Malformed(format!("invalid frame: {e}")),
    }
}

// ============================================================================
// Replay Source (in-memory frames)
// ============================================================================

/// Replays pre-loaded frames.
pub struct ReplaySource {
    frames: std::vec::IntoIter<FrameInput>,
}

impl ReplaySource {
    pub fn new(frames: Vec<FrameInput>) -> Self {
        Self {
            frames: frames.into_iter(),
        }
    }
}

#[async_trait]
impl FrameSource for ReplaySource {
    async fn next_frame(&mut self) -> Result<FrameEvent> {
        Ok(match self.frames.next() {
            Some(frame) => FrameEvent::Frame(frame),
            None => FrameEvent::Eof,
        })
    }

    fn source_name(&self) -> &str {
        "replay"
    }
}

// ============================================================================
// JSON Lines Source (stdin / file)
// ============================================================================

/// Reads one JSON frame per line. Blank lines are skipped.
pub struct JsonLinesSource<R> {
    reader: R,
    line_buffer: String,
    name: String,
}

impl<R: AsyncBufRead + Unpin + Send> JsonLinesSource<R> {
    pub fn new(reader: R, name: impl Into<String>) -> Self {
        Self {
            reader,
            line_buffer: String::with_capacity(4096),
            name: name.into(),
        }
    }
}

impl JsonLinesSource<BufReader<tokio::io::Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), "stdin")
    }
}

impl JsonLinesSource<BufReader<tokio::fs::File>> {
    pub async fn open(path: &Path) -> Result<Self> {
        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("Failed to open frame file {}", path.display()))?;
        Ok(Self::new(BufReader::new(file), path.display().to_string()))
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> FrameSource for JsonLinesSource<R> {
    async fn next_frame(&mut self) -> Result<FrameEvent> {
        loop {
            self.line_buffer.clear();
            let bytes = self.reader.read_line(&mut self.line_buffer).await?;
            if bytes == 0 {
                return Ok(FrameEvent::Eof);
            }
            let line = self.line_buffer.trim();
            if line.is_empty() {
                continue;
            }
            return Ok(parse_frame(line));
        }
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}
