//! sync-server
//!
//! Multi-client async TCP server that holds N rendering clients in
//! frame lockstep.

pub mod config;
pub mod engine_task;
pub mod server;
pub mod types;

// internal module, not re-exported
mod client;
