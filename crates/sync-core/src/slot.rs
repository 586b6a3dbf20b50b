//! Fixed-size table of per-client slots.
//!
//! One slot per expected screen, created up front and never resized.
//! A slot tracks connection and readiness independently of which
//! physical connection currently occupies it: a client that drops and
//! rejoins gets the first free seat, not necessarily its old one.

use crate::error::SyncError;

/// State of one logical seat in the wall.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientSlot {
    /// A connection currently occupies this slot.
    pub connected: bool,

    /// The occupant has reported ready for the next frame.
    pub ready: bool,
}

/// Bounds-checked slot table, sized at construction.
#[derive(Debug, Clone)]
pub struct SlotTable {
    slots: Vec<ClientSlot>,
}

impl SlotTable {
    /// Create a table with `screens` empty slots.
    pub fn new(screens: usize) -> Self {
        SlotTable {
            slots: vec![ClientSlot::default(); screens],
        }
    }

    /// Number of slots (fixed for the lifetime of the table).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<&ClientSlot> {
        self.slots.get(slot)
    }

    /// Claim the first unconnected slot.
    pub fn assign(&mut self) -> Result<usize, SyncError> {
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if !slot.connected {
                slot.connected = true;
                return Ok(idx);
            }
        }
        Err(SyncError::NoFreeSlot)
    }

    /// Release a slot: clears both flags.
    ///
    /// A released slot still counts toward the barrier, so the wall
    /// stalls until the seat is re-filled and reports ready again.
    pub fn drop_slot(&mut self, slot: usize) -> Result<(), SyncError> {
        let entry = self
            .slots
            .get_mut(slot)
            .ok_or(SyncError::InvalidSlot(slot))?;
        entry.connected = false;
        entry.ready = false;
        Ok(())
    }

    /// Mark a slot ready and report whether every slot is now ready.
    ///
    /// Readiness is tracked per seat, not per connection, so this does
    /// not require `connected` to be set.
    pub fn set_ready(&mut self, slot: usize) -> Result<bool, SyncError> {
        let entry = self
            .slots
            .get_mut(slot)
            .ok_or(SyncError::InvalidSlot(slot))?;
        entry.ready = true;
        Ok(self.all_ready())
    }

    /// True iff every slot has reported ready.
    pub fn all_ready(&self) -> bool {
        self.slots.iter().all(|s| s.ready)
    }

    /// Clear every ready flag (start of a new round).
    pub fn clear_ready(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.ready = false;
        }
    }

    pub fn connected_count(&self) -> usize {
        self.slots.iter().filter(|s| s.connected).count()
    }

    /// How many slots have not reported ready yet.
    pub fn pending_count(&self) -> usize {
        self.slots.iter().filter(|s| !s.ready).count()
    }
}
