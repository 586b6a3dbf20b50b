//! Shared types for the frame-synchronization server.
//!
//! This module defines:
//! - `ClientId`: a lightweight handle for connected clients
//! - `OutboundFrame`: what the engine pushes to a client's writer
//! - channel aliases between clients and the engine loop
//! - `EngineCommand`: everything that mutates barrier state

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot, RwLock};

/// Identifier for a connected client.
///
/// This is intentionally opaque; we just guarantee uniqueness over the
/// lifetime of the process. Slot indices are assigned separately by
/// the barrier engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub u64);

/// One write to a client socket.
///
/// Lines are written with a trailing newline; blobs (payload frames)
/// are written as-is, immediately after their announcing control line.
#[derive(Debug, Clone)]
pub enum OutboundFrame {
    Line(String),
    Blob(Bytes),
}

/// Outbound frames from the engine to a given client.
pub type OutboundTx = mpsc::UnboundedSender<OutboundFrame>;
pub type OutboundRx = mpsc::UnboundedReceiver<OutboundFrame>;

/// Registry of connected clients and their outbound channels.
///
/// - Key: `ClientId`
/// - Value: `OutboundTx` feeding that client's writer task.
pub type ClientRegistry = Arc<RwLock<HashMap<ClientId, OutboundTx>>>;

/// Everything that mutates barrier state flows through this enum into
/// the single engine task, which is the mutual-exclusion domain for
/// slots, the frame counter, and the pending payload.
#[derive(Debug)]
pub enum EngineCommand {
    /// A client asked for a slot (`S` line).
    Register { client_id: ClientId },

    /// A client finished its frame (`D` line).
    Ready { client_id: ClientId },

    /// A client queued broadcast text (`T,<text>` line).
    Broadcast { client_id: ClientId, text: String },

    /// Administrative: attach a byte payload to the next advance.
    QueueBytes { data: Bytes },

    /// Administrative: attach an int payload to the next advance.
    QueueInts { data: Vec<i32> },

    /// A client's connection ended (EOF, read error, or write error).
    Disconnect { client_id: ClientId },

    /// Administrative: restart the frame counter at 0.
    ResetFrameCount,

    /// Administrative: is the wall empty (no seat connected)?
    AllDisconnected { reply: oneshot::Sender<bool> },

    /// Stop the engine loop once queued commands are drained.
    Shutdown,
}

/// Channel from clients (and admins) into the engine task.
pub type EngineTx = mpsc::UnboundedSender<EngineCommand>;
pub type EngineRx = mpsc::UnboundedReceiver<EngineCommand>;
