//! sync-core
//!
//! Pure frame-barrier logic:
//! - messages (logical inbound/outbound types)
//! - per-client slot table
//! - barrier engine (readiness, throttle, frame advance)

pub mod barrier;
pub mod error;
pub mod messages;
pub mod slot;

pub use barrier::{BarrierEngine, MIN_ADVANCE_SLEEP};
pub use error::SyncError;

pub use messages::{ClientMessage, FrameAdvance, FramePayload};

pub use slot::{ClientSlot, SlotTable};
