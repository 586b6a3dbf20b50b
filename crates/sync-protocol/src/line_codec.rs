//! Newline-delimited text protocol.
//!
//! Inbound (client -> server), one command per line:
//!
//! - Start (request a slot):
//!   `S`
//!
//! - Done rendering / ready for the next frame:
//!   `D`
//!
//! - Queue text for broadcast with the next frame advance:
//!   `T,<text>`   (everything after the first comma, verbatim)
//!
//! Outbound (server -> client), one control line per round:
//!
//!   `[B|I]?G,<frame>[:<text>]`
//!
//! - `G,<frame>` is the advance command; `<frame>` is the number of
//!   the round that just completed.
//! - A `B` prefix announces a byte payload frame, `I` an int payload
//!   frame, written immediately after the control line on the same
//!   connection (see [`crate::payload_codec`]). No prefix means no
//!   payload frame follows.
//! - `<text>` after the first `:` is the round's broadcast text.
//!
//! Line terminators are owned by the transport layer; these functions
//! deal in unterminated lines.

use sync_core::{ClientMessage, FrameAdvance, FramePayload};

use crate::payload_codec::PayloadKind;

/// Parsed form of an outbound control line, for client-side use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvanceLine {
    pub frame: u64,
    pub text: Option<String>,
    pub payload: Option<PayloadKind>,
}

/// Parse a single inbound line into a `ClientMessage`.
///
/// Returns `None` for blank lines and anything outside the grammar;
/// the server logs and drops those rather than failing the connection.
pub fn parse_client_line(line: &str) -> Option<ClientMessage> {
    let trimmed = line.trim_end_matches(['\r', '\n']);
    if trimmed.trim().is_empty() {
        return None;
    }

    match trimmed {
        "S" => Some(ClientMessage::Start),
        "D" => Some(ClientMessage::Ready),
        _ => {
            let text = trimmed.strip_prefix("T,")?;
            Some(ClientMessage::Broadcast(text.to_string()))
        }
    }
}

/// Format the per-round control line for a `FrameAdvance`.
pub fn format_advance(msg: &FrameAdvance) -> String {
    let prefix = match msg.payload {
        Some(FramePayload::Bytes(_)) => "B",
        Some(FramePayload::Ints(_)) => "I",
        None => "",
    };

    let mut line = format!("{}G,{}", prefix, msg.frame);
    if let Some(text) = &msg.text {
        line.push(':');
        line.push_str(text);
    }
    line
}

/// Parse an outbound control line back into its parts.
///
/// This is the client half of the protocol; the example client and the
/// tests use it to decide whether a payload frame follows.
pub fn parse_advance_line(line: &str) -> Option<AdvanceLine> {
    let trimmed = line.trim_end_matches(['\r', '\n']);

    let (payload, rest) = if let Some(rest) = trimmed.strip_prefix('B') {
        (Some(PayloadKind::Bytes), rest)
    } else if let Some(rest) = trimmed.strip_prefix('I') {
        (Some(PayloadKind::Ints), rest)
    } else {
        (None, trimmed)
    };

    let rest = rest.strip_prefix("G,")?;

    let (frame_str, text) = match rest.split_once(':') {
        Some((frame_str, text)) => (frame_str, Some(text.to_string())),
        None => (rest, None),
    };

    let frame = frame_str.parse::<u64>().ok()?;

    Some(AdvanceLine {
        frame,
        text,
        payload,
    })
}
