//! WebSocket analysis endpoint.
//!
//! Each connection owns exactly one [`Session`]. Inbound text messages carry
//! one JSON frame each; every frame is answered with exactly one JSON
//! message, in order, before the next frame is read.

use anyhow::Result;
use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{Sink, SinkExt, Stream, StreamExt};
use tracing::{debug, info};

use super::handlers::ApiState;
use crate::pipeline::source::parse_frame;
use crate::pipeline::{FrameEvent, FrameSource, MessageSink, ProcessingLoop};
use crate::session::{Session, SessionStats};
use crate::types::SessionMessage;

/// GET /ws/analysis - Upgrade to a per-connection analysis session
pub async fn analysis_ws(ws: WebSocketUpgrade, State(state): State<ApiState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: ApiState) {
    let _guard = state.session_guard();
    let (tx, rx) = socket.split();
    serve_session(WsSource::new(rx), WsSink::new(tx), &state).await;
}

/// Run one session over an already-split connection and return its counters.
pub async fn serve_session<R, T>(
    mut source: WsSource<R>,
    mut sink: WsSink<T>,
    state: &ApiState,
) -> SessionStats
where
    R: Stream<Item = Result<Message, axum::Error>> + Unpin + Send,
    T: Sink<Message> + Unpin + Send,
    T::Error: std::error::Error + Send + Sync + 'static,
{
    let session = Session::new(state.annotator.clone(), &state.config);
    let session_id = session.id().to_string();
    info!(%session_id, "WebSocket session opened");

    let stats = ProcessingLoop::new(session, state.shutdown.child_token())
        .run(&mut source, &mut sink)
        .await;

    // Best effort: the peer may already be gone
    let _ = sink.close().await;
    info!(
        %session_id,
        frames = stats.frames_processed,
        reps = stats.repetitions_completed,
        "WebSocket session closed"
    );
    stats
}

// ============================================================================
// Source / Sink adapters
// ============================================================================

/// Reads frames from the inbound half of a WebSocket.
pub struct WsSource<R> {
    inner: R,
}

impl<R> WsSource<R> {
    pub const fn new(inner: R) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<R> FrameSource for WsSource<R>
where
    R: Stream<Item = Result<Message, axum::Error>> + Unpin + Send,
{
    async fn next_frame(&mut self) -> Result<FrameEvent> {
        loop {
            let message = match self.inner.next().await {
                Some(Ok(message)) => message,
                Some(Err(e)) => {
                    debug!(error = %e, "WebSocket receive failed");
                    return Ok(FrameEvent::Eof);
                }
                None => return Ok(FrameEvent::Eof),
            };

            match message {
                Message::Text(text) => return Ok(parse_frame(&text)),
                Message::Binary(bytes) => {
                    return Ok(match std::str::from_utf8(&bytes) {
                        Ok(text) => parse_frame(text),
                        Err(_) => FrameEvent::Malformed("frame is not valid UTF-8".to_string()),
                    })
                }
                Message::Close(_) => return Ok(FrameEvent::Eof),
                Message::Ping(_) | Message::Pong(_) => continue,
            }
        }
    }

    fn source_name(&self) -> &str {
        "websocket"
    }
}

/// Writes session messages to the outbound half of a WebSocket as text.
pub struct WsSink<T> {
    inner: T,
}

impl<T> WsSink<T>
where
    T: Sink<Message> + Unpin + Send,
    T::Error: std::error::Error + Send + Sync + 'static,
{
    pub const fn new(inner: T) -> Self {
        Self { inner }
    }

    async fn close(&mut self) -> Result<()> {
        self.inner.close().await?;
        Ok(())
    }
}

#[async_trait]
impl<T> MessageSink for WsSink<T>
where
    T: Sink<Message> + Unpin + Send,
    T::Error: std::error::Error + Send + Sync + 'static,
{
    async fn send(&mut self, message: &SessionMessage) -> Result<()> {
        let text = serde_json::to_string(message)?;
        self.inner.send(Message::Text(text)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotator::SyntheticAnnotator;
    use crate::config::AnalyzerConfig;
    use futures::channel::mpsc;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    fn create_test_state() -> ApiState {
        let annotator = SyntheticAnnotator::new(3, 4_000, 45.0).unwrap();
        ApiState::new(
            Arc::new(annotator),
            AnalyzerConfig::default(),
            CancellationToken::new(),
        )
    }

    fn text(s: &str) -> Result<Message, axum::Error> {
        Ok(Message::Text(s.to_string()))
    }

    #[tokio::test]
    async fn test_one_reply_per_frame_in_order() {
        let state = create_test_state();
        let (in_tx, in_rx) = mpsc::unbounded::<Result<Message, axum::Error>>();
        let (out_tx, out_rx) = mpsc::unbounded::<Message>();

        in_tx.unbounded_send(text(r#"{"timestamp": 0, "data": "a"}"#)).unwrap();
        in_tx.unbounded_send(Ok(Message::Ping(vec![1]))).unwrap();
        in_tx.unbounded_send(text("garbage")).unwrap();
        in_tx.unbounded_send(text(r#"{"timestamp": 100, "data": "b"}"#)).unwrap();
        in_tx
            .unbounded_send(text(r#"{"type": "frame", "data": [0, 0, 0, 255], "timestamp": 200}"#))
            .unwrap();
        in_tx.unbounded_send(Ok(Message::Close(None))).unwrap();

        let stats = serve_session(WsSource::new(in_rx), WsSink::new(out_tx), &state).await;
        assert_eq!(stats.frames_processed, 3);
        assert_eq!(stats.annotation_failures, 0);

        let replies: Vec<serde_json::Value> = out_rx
            .map(|m| match m {
                Message::Text(t) => serde_json::from_str(&t).unwrap(),
                other => panic!("unexpected message {other:?}"),
            })
            .collect()
            .await;

        assert_eq!(replies.len(), 4);
        assert_eq!(replies[0]["status"], "analyzed");
        assert_eq!(replies[1]["status"], "error");
        assert_eq!(replies[2]["status"], "analyzed");
        assert_eq!(replies[2]["current_rep"], 1);
        assert_eq!(replies[3]["status"], "analyzed");
    }

    #[tokio::test]
    async fn test_peer_disconnect_ends_session() {
        let state = create_test_state();
        let (in_tx, in_rx) = mpsc::unbounded::<Result<Message, axum::Error>>();
        let (out_tx, mut out_rx) = mpsc::unbounded::<Message>();
        drop(in_tx);

        let stats = serve_session(WsSource::new(in_rx), WsSink::new(out_tx), &state).await;
        assert_eq!(stats, SessionStats::default());
        // Nothing was sent and the outbound half was closed
        assert!(out_rx.next().await.is_none());
    }
}
