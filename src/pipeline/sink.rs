//! Outbound message sinks.

use anyhow::Result;
use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::types::SessionMessage;

/// Where per-frame messages go, in order.
#[async_trait]
pub trait MessageSink: Send {
    /// Deliver one message. An error means the peer is gone.
    async fn send(&mut self, message: &SessionMessage) -> Result<()>;
}

/// Collects messages in memory.
#[async_trait]
impl MessageSink for Vec<SessionMessage> {
    async fn send(&mut self, message: &SessionMessage) -> Result<()> {
        self.push(message.clone());
        Ok(())
    }
}

/// Writes one JSON message per line.
pub struct JsonLinesSink<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin + Send> JsonLinesSink<W> {
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl JsonLinesSink<tokio::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> MessageSink for JsonLinesSink<W> {
    async fn send(&mut self, message: &SessionMessage) -> Result<()> {
        let mut line = serde_json::to_vec(message)?;
        line.push(b'\n');
        self.writer.write_all(&line).await?;
        self.writer.flush().await?;
        Ok(())
    }
}
