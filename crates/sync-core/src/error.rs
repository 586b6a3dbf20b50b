//! Error types for the barrier core.
//!
//! Per-connection I/O failures never reach this crate; they are
//! converted to disconnect events at the server layer. What remains
//! fallible here is slot accounting and construction-time validation.

use std::fmt;

/// Errors from the slot table and barrier engine.
#[derive(Debug, PartialEq, Eq)]
pub enum SyncError {
    /// Every configured slot is already occupied.
    NoFreeSlot,

    /// Slot index outside `0..screens`.
    InvalidSlot(usize),

    /// Rejected configuration value (e.g. zero screens or framerate).
    InvalidConfig(&'static str),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::NoFreeSlot => write!(f, "No free client slot"),
            SyncError::InvalidSlot(slot) => write!(f, "Invalid slot index: {}", slot),
            SyncError::InvalidConfig(what) => write!(f, "Invalid configuration: {}", what),
        }
    }
}

impl std::error::Error for SyncError {}
