//! Binary payload frames.
//!
//! A round whose control line carries a `B` or `I` prefix is followed
//! by exactly one payload frame on the same connection:
//!
//! ```text
//! Byte payload (prefix B)
//! -----------------------
//! [0..4] : count (u32 BE) = number of raw bytes
//! [4..]  : raw bytes
//!
//! Int payload (prefix I)
//! ----------------------
//! [0..4] : count (u32 BE) = number of ints
//! [4..]  : count * i32 (BE)
//! ```
//!
//! NOTE: this module encodes/decodes **one frame per buffer**. The
//! stream layer reads the 4-byte count first and then exactly the
//! body the count implies.

use std::fmt;

use bytes::Bytes;
use sync_core::FramePayload;

/// Which kind of payload frame a control-line prefix announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Bytes,
    Ints,
}

/// Errors that can arise when encoding/decoding a payload frame.
#[derive(Debug)]
pub enum ProtocolError {
    /// Buffer too short for the count it declares.
    Truncated,
    /// Payload too large for the u32 count field.
    Oversized(usize),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Truncated => write!(f, "Payload frame truncated"),
            ProtocolError::Oversized(len) => {
                write!(f, "Payload too large for wire format: {} elements", len)
            }
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Encode a payload frame. The encoded bytes are appended to `out`.
pub fn encode_payload(payload: &FramePayload, out: &mut Vec<u8>) -> Result<(), ProtocolError> {
    match payload {
        FramePayload::Bytes(data) => {
            let count = u32::try_from(data.len()).map_err(|_| ProtocolError::Oversized(data.len()))?;
            out.extend_from_slice(&count.to_be_bytes());
            out.extend_from_slice(data);
        }
        FramePayload::Ints(ints) => {
            let count = u32::try_from(ints.len()).map_err(|_| ProtocolError::Oversized(ints.len()))?;
            out.extend_from_slice(&count.to_be_bytes());
            for v in ints {
                out.extend_from_slice(&v.to_be_bytes());
            }
        }
    }
    Ok(())
}

/// Decode a byte payload frame (count + raw bytes).
pub fn decode_bytes_payload(buf: &[u8]) -> Result<Bytes, ProtocolError> {
    let count = read_count(buf)?;
    if buf.len() < 4 + count {
        return Err(ProtocolError::Truncated);
    }
    Ok(Bytes::copy_from_slice(&buf[4..4 + count]))
}

/// Decode an int payload frame (count + big-endian i32s).
pub fn decode_ints_payload(buf: &[u8]) -> Result<Vec<i32>, ProtocolError> {
    let count = read_count(buf)?;
    if buf.len() < 4 + count * 4 {
        return Err(ProtocolError::Truncated);
    }

    let mut ints = Vec::with_capacity(count);
    for i in 0..count {
        let offset = 4 + i * 4;
        ints.push(read_i32_be(&buf[offset..offset + 4]));
    }
    Ok(ints)
}

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

fn read_count(buf: &[u8]) -> Result<usize, ProtocolError> {
    if buf.len() < 4 {
        return Err(ProtocolError::Truncated);
    }
    let arr: [u8; 4] = buf[0..4].try_into().expect("slice with incorrect length");
    Ok(u32::from_be_bytes(arr) as usize)
}

fn read_i32_be(bytes: &[u8]) -> i32 {
    let arr: [u8; 4] = bytes[0..4].try_into().expect("slice with incorrect length");
    i32::from_be_bytes(arr)
}
