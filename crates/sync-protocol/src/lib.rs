//! sync-protocol
//!
//! Wire-level encoding/decoding for the frame-synchronization server.
//!
//! This crate turns logical engine messages (`sync_core::ClientMessage`
//! / `FrameAdvance`) into bytes and back again.
//!
//! - [`line_codec`]    : newline-delimited text protocol (control lines)
//! - [`payload_codec`] : binary payload frames (byte / int sequences)

pub mod line_codec;
pub mod payload_codec;

pub use line_codec::{format_advance, parse_advance_line, parse_client_line, AdvanceLine};
pub use payload_codec::{
    decode_bytes_payload, decode_ints_payload, encode_payload, PayloadKind, ProtocolError,
};
