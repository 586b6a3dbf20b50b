//! The barrier engine: readiness bookkeeping, frame-rate throttling,
//! and assembly of the per-round advance broadcast.
//!
//! The engine is deliberately free of clocks, sockets and locks. Time
//! flows in through `Instant` arguments and the actual sleep is owned
//! by the caller, which makes the advance sequence testable with
//! fabricated timestamps. A full round looks like:
//!
//! ```text
//! set_ready(slot) == Ok(true)        // barrier complete
//!   -> throttle_delay(now)           // how long to sleep
//!   -> (caller sleeps)
//!   -> finish_advance()              // reset flags, bump counter,
//!                                    //   build the broadcast
//!   -> (caller fans the frame out)
//!   -> mark_advanced(now)            // taken after the broadcast so
//!                                    //   throttling accounts for it
//! ```
//!
//! The caller must run this sequence to completion before feeding the
//! engine any further readiness reports; that is what guarantees no
//! slot can report ready for round K+1 before round K has been fully
//! sent.

use std::time::{Duration, Instant};

use bytes::Bytes;

use crate::error::SyncError;
use crate::messages::{FrameAdvance, FramePayload};
use crate::slot::SlotTable;

/// Sleep applied even when a round is already behind schedule, so a
/// wall of instantly-ready clients does not spin the server flat out.
pub const MIN_ADVANCE_SLEEP: Duration = Duration::from_millis(2);

/// Separator between queued broadcast texts; the last one is stripped
/// from the outgoing control line.
const MESSAGE_SEPARATOR: char = ':';

/// Barrier state for one wall of `screens` clients.
#[derive(Debug)]
pub struct BarrierEngine {
    slots: SlotTable,
    framerate: u32,
    frame_count: u64,
    last_advance: Instant,

    // Pending payload state, drained by `finish_advance`.
    message: String,
    has_message: bool,
    pending_bytes: Option<Bytes>,
    pending_ints: Option<Vec<i32>>,
}

impl BarrierEngine {
    /// Create an engine for `screens` clients throttled to `framerate`
    /// frames per second. Both must be non-zero.
    ///
    /// `now` seeds the throttle clock: the first advance is paced
    /// against construction time, the same way the original wall
    /// server timestamped server start.
    pub fn new(screens: usize, framerate: u32, now: Instant) -> Result<Self, SyncError> {
        if screens == 0 {
            return Err(SyncError::InvalidConfig("screens must be > 0"));
        }
        if framerate == 0 {
            return Err(SyncError::InvalidConfig("framerate must be > 0"));
        }

        Ok(BarrierEngine {
            slots: SlotTable::new(screens),
            framerate,
            frame_count: 0,
            last_advance: now,
            message: String::new(),
            has_message: false,
            pending_bytes: None,
            pending_ints: None,
        })
    }

    pub fn screens(&self) -> usize {
        self.slots.len()
    }

    pub fn framerate(&self) -> u32 {
        self.framerate
    }

    /// Number of the next round to complete.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn connected_count(&self) -> usize {
        self.slots.connected_count()
    }

    /// Slots that have not reported ready for the current round.
    pub fn pending_count(&self) -> usize {
        self.slots.pending_count()
    }

    /// Claim the first free slot for a new connection.
    pub fn assign(&mut self) -> Result<usize, SyncError> {
        self.slots.assign()
    }

    /// Release a slot on disconnect.
    ///
    /// The seat keeps counting toward the barrier, so a dropped client
    /// stalls the wall until something reconnects into that slot.
    pub fn drop_slot(&mut self, slot: usize) -> Result<(), SyncError> {
        self.slots.drop_slot(slot)
    }

    /// Record a readiness report for `slot`.
    ///
    /// Returns `Ok(true)` when this report completes the barrier; the
    /// caller must then run the advance sequence (see module docs)
    /// before processing further reports. Reporting an already-ready
    /// slot is harmless and cannot complete the barrier twice.
    pub fn set_ready(&mut self, slot: usize) -> Result<bool, SyncError> {
        self.slots.set_ready(slot)
    }

    /// Queue broadcast text for the next advance.
    ///
    /// Each queued message carries its own trailing separator (the
    /// producer appends `:`); texts accumulate across calls within a
    /// round and the final separator is stripped from the control line.
    pub fn queue_message(&mut self, text: &str) {
        self.message.push_str(text);
        self.has_message = true;
    }

    /// Queue a byte payload for the next advance.
    pub fn queue_bytes(&mut self, data: Bytes) {
        self.pending_bytes = Some(data);
    }

    /// Queue an int-sequence payload for the next advance.
    pub fn queue_ints(&mut self, data: Vec<i32>) {
        self.pending_ints = Some(data);
    }

    /// How long the advancing caller must sleep before broadcasting.
    ///
    /// The target interval is `trunc(1.0 / framerate * 1000.0)` ms,
    /// measured from the previous advance (or from construction for
    /// the first one). Behind schedule the caller still sleeps
    /// [`MIN_ADVANCE_SLEEP`].
    pub fn throttle_delay(&self, now: Instant) -> Duration {
        let desired_ms = ((1.0f64 / self.framerate as f64) * 1000.0) as u64;

        let elapsed_ms = now.saturating_duration_since(self.last_advance).as_millis() as u64;
        if elapsed_ms < desired_ms {
            Duration::from_millis(desired_ms - elapsed_ms)
        } else {
            MIN_ADVANCE_SLEEP
        }
    }

    /// Complete the round: clear every ready flag, bump the frame
    /// counter, and drain the pending payload state into the broadcast.
    ///
    /// The broadcast carries the pre-increment counter value (the
    /// number of the round that just completed). When both a byte and
    /// an int payload were queued this round, the byte payload wins;
    /// both are cleared either way.
    pub fn finish_advance(&mut self) -> FrameAdvance {
        self.slots.clear_ready();

        let frame = self.frame_count;
        self.frame_count += 1;

        let text = if self.has_message {
            let mut msg = std::mem::take(&mut self.message);
            if msg.ends_with(MESSAGE_SEPARATOR) {
                msg.pop();
            }
            self.has_message = false;
            Some(msg)
        } else {
            None
        };

        let payload = match (self.pending_bytes.take(), self.pending_ints.take()) {
            (Some(bytes), _) => Some(FramePayload::Bytes(bytes)),
            (None, Some(ints)) => Some(FramePayload::Ints(ints)),
            (None, None) => None,
        };

        FrameAdvance {
            frame,
            text,
            payload,
        }
    }

    /// Record when the broadcast finished, so the next round's
    /// throttle accounts for the fan-out cost.
    pub fn mark_advanced(&mut self, now: Instant) {
        self.last_advance = now;
    }

    /// Restart at frame 0 and discard any pending broadcast text.
    ///
    /// Connection and readiness state are untouched, and a queued
    /// byte/int payload survives the reset.
    pub fn reset_frame_count(&mut self) {
        self.frame_count = 0;
        self.message.clear();
        self.has_message = false;
    }
}
