//! Shared data structures for the repetition analysis pipeline
//!
//! - FrameInput: one inbound frame (timestamp + encoded image or raw pixels)
//! - Annotation: the provider's structured measurement for a frame
//! - AngleSample: a measurement buffered inside an open repetition
//! - CompletedRepetition: finalized, append-only history entry
//! - ExerciseReport: derived cross-repetition snapshot
//! - SessionMessage: outbound per-frame message

mod frame;
mod repetition;
mod report;
mod message;

pub use frame::*;
pub use repetition::*;
pub use report::*;
pub use message::*;
