//! Unified frame processing loop shared across all transports.
//!
//! The replay CLI and every WebSocket connection run the same
//! source -> session -> sink loop. Frames are handled strictly one at a time:
//! frame N+1 is not read until frame N's message has been delivered.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::sink::MessageSink;
use super::source::{FrameEvent, FrameSource};
use crate::session::{Session, SessionStats};
use crate::types::SessionMessage;

/// Owns one session for the lifetime of one frame stream.
pub struct ProcessingLoop {
    session: Session,
    cancel_token: CancellationToken,
}

impl ProcessingLoop {
    pub const fn new(session: Session, cancel_token: CancellationToken) -> Self {
        Self {
            session,
            cancel_token,
        }
    }

    /// Run until the source is exhausted, the sink closes, or cancellation.
    ///
    /// Returns the session's final statistics.
    pub async fn run<S, K>(mut self, source: &mut S, sink: &mut K) -> SessionStats
    where
        S: FrameSource + ?Sized,
        K: MessageSink + ?Sized,
    {
        info!(
            session_id = %self.session.id(),
            source = source.source_name(),
            "Processing frames"
        );

        loop {
            let event = tokio::select! {
                biased;
                _ = self.cancel_token.cancelled() => {
                    info!(session_id = %self.session.id(), "Shutdown signal received");
                    break;
                }
                result = source.next_frame() => {
                    match result {
                        Ok(ev) => ev,
                        Err(e) => {
                            warn!(session_id = %self.session.id(), error = %e, "Source error");
                            break;
                        }
                    }
                }
            };

            let message = match event {
                FrameEvent::Frame(frame) => self.session.process_frame(&frame).await,
                FrameEvent::Malformed(reason) => {
                    debug!(session_id = %self.session.id(), %reason, "Malformed frame");
                    SessionMessage::error(reason)
                }
                FrameEvent::Eof => {
                    info!(
                        session_id = %self.session.id(),
                        frames = self.session.stats().frames_processed,
                        "Source reached end"
                    );
                    break;
                }
            };

            if let Err(e) = sink.send(&message).await {
                warn!(session_id = %self.session.id(), error = %e, "Sink closed");
                break;
            }
        }

        self.session.finish()
    }
}
