//! Message types used by the barrier core.
//!
//! These are **transport-agnostic** logical messages:
//! - [`ClientMessage`]: what the engine consumes from a client.
//! - [`FrameAdvance`]: the one broadcast the engine produces per round.
//!
//! Note: the line/payload encoders live in the `sync-protocol` crate;
//! this module is purely logical.

use bytes::Bytes;

/// A high-level event from a connected client into the barrier engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Client wants a slot in the wall.
    Start,

    /// Client has finished rendering the current frame and is ready
    /// for the next one.
    Ready,

    /// Client asks for `text` to ride along with the next advance,
    /// delivered to every client.
    Broadcast(String),
}

/// The per-round broadcast: "everyone move to the next frame".
///
/// `frame` is the number of the round that just completed, i.e. the
/// counter value before this advance incremented it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameAdvance {
    pub frame: u64,

    /// Accumulated broadcast text for this round, separator-stripped.
    pub text: Option<String>,

    /// At most one structured payload per round.
    pub payload: Option<FramePayload>,
}

/// Structured payload attached to a frame advance.
///
/// Byte and int payloads are mutually exclusive per round; when both
/// were queued the byte payload wins (see `BarrierEngine`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramePayload {
    Bytes(Bytes),
    Ints(Vec<i32>),
}

impl FrameAdvance {
    /// Convenience constructor for a bare advance (no text, no payload).
    pub fn bare(frame: u64) -> Self {
        FrameAdvance {
            frame,
            text: None,
            payload: None,
        }
    }
}
