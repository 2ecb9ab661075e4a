//! Frame Processing Pipeline
//!
//! ```text
//! FrameSource ──▶ Session (annotate → segment → report → project) ──▶ MessageSink
//! ```
//!
//! Every transport (JSON-lines replay, WebSocket) plugs a source and a sink
//! into the same [`ProcessingLoop`].

pub mod processing_loop;
pub mod sink;
pub mod source;

pub use processing_loop::ProcessingLoop;
pub use sink::{JsonLinesSink, MessageSink};
pub use source::{FrameEvent, FrameSource, JsonLinesSource, ReplaySource};
