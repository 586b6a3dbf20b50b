//! Central engine loop.
//!
//! This task owns the `BarrierEngine` plus the `ClientId -> slot` map
//! and processes every `EngineCommand` strictly in order. That makes
//! it the single mutual-exclusion domain the barrier needs: slot
//! mutation, the all-ready check, and the advance (throttle sleep
//! included) all happen inline here, so no round-K+1 readiness report
//! can be observed before round K's broadcast has been handed to every
//! client's writer.
//!
//! Fan-out is per-client queues rather than direct socket writes: a
//! slow client delays only its own writer task, never the barrier. A
//! client whose queue is gone (writer dead) is treated as disconnected
//! and the round continues for the others.

use std::collections::HashMap;

use bytes::Bytes;
use tracing::{debug, error, info, warn};

use sync_core::BarrierEngine;
use sync_protocol::{encode_payload, format_advance};

use crate::config::Config;
use crate::types::{ClientId, ClientRegistry, EngineCommand, EngineRx, OutboundFrame};

/// Run the central engine processing loop.
///
/// - `engine_rx`: receives commands from all client tasks and admins.
/// - `clients`: registry of connected clients and their outbound queues.
pub async fn run_engine_loop(mut engine_rx: EngineRx, clients: ClientRegistry, config: Config) {
    let mut engine = match BarrierEngine::new(
        config.screens,
        config.framerate,
        tokio::time::Instant::now().into_std(),
    ) {
        Ok(engine) => engine,
        Err(e) => {
            // Config validation already rejects these values; reaching
            // this means a caller bypassed `Config::from_args`.
            error!(error = %e, "refusing to start engine loop");
            return;
        }
    };

    let mut slots: HashMap<ClientId, usize> = HashMap::new();

    while let Some(cmd) = engine_rx.recv().await {
        match cmd {
            EngineCommand::Register { client_id } => {
                // A client already holds a seat: a repeated start
                // request must not claim (and orphan) a second one.
                if let Some(&slot) = slots.get(&client_id) {
                    debug!(client = client_id.0, slot, "duplicate start request ignored");
                    continue;
                }

                match engine.assign() {
                    Ok(slot) => {
                        slots.insert(client_id, slot);
                        info!(
                            client = client_id.0,
                            slot,
                            connected = engine.connected_count(),
                            "assigned slot"
                        );
                    }
                    Err(e) => {
                        warn!(client = client_id.0, error = %e, "refusing client");
                        remove_client(&clients, client_id).await;
                    }
                }
            }

            EngineCommand::Ready { client_id } => {
                let Some(&slot) = slots.get(&client_id) else {
                    warn!(client = client_id.0, "ready report from client without a slot");
                    continue;
                };

                match engine.set_ready(slot) {
                    Ok(true) => advance(&mut engine, &mut slots, &clients).await,
                    Ok(false) => {
                        debug!(slot, pending = engine.pending_count(), "waiting on barrier");
                    }
                    Err(e) => warn!(client = client_id.0, slot, error = %e, "bad ready report"),
                }
            }

            EngineCommand::Broadcast { client_id, text } => {
                debug!(client = client_id.0, text = %text, "queueing broadcast text");
                // Each queued message carries its trailing separator;
                // the advance strips the last one.
                engine.queue_message(&format!("{}:", text));
            }

            EngineCommand::QueueBytes { data } => engine.queue_bytes(data),

            EngineCommand::QueueInts { data } => engine.queue_ints(data),

            EngineCommand::Disconnect { client_id } => {
                if let Some(slot) = slots.remove(&client_id) {
                    if let Err(e) = engine.drop_slot(slot) {
                        warn!(client = client_id.0, slot, error = %e, "drop failed");
                    } else {
                        info!(client = client_id.0, slot, "released slot");
                    }
                }
                remove_client(&clients, client_id).await;

                // Decided from engine-owned seat state, not the shared
                // registry: the accept loop may already have inserted a
                // rejoining client whose Register is still queued.
                if engine.connected_count() == 0 {
                    info!("all clients disconnected, resetting frame count");
                    engine.reset_frame_count();
                }
            }

            EngineCommand::ResetFrameCount => {
                info!("resetting frame count");
                engine.reset_frame_count();
            }

            EngineCommand::AllDisconnected { reply } => {
                let _ = reply.send(engine.connected_count() == 0);
            }

            EngineCommand::Shutdown => break,
        }
    }

    info!("engine loop shutting down");
}

/// Run one barrier advance: throttle, complete the round, fan out.
///
/// Runs inline in the engine loop, so the throttle sleep blocks every
/// other command for up to one frame interval. That is the barrier's
/// causal guarantee, not an accident.
async fn advance(
    engine: &mut BarrierEngine,
    slots: &mut HashMap<ClientId, usize>,
    clients: &ClientRegistry,
) {
    let delay = engine.throttle_delay(tokio::time::Instant::now().into_std());
    tokio::time::sleep(delay).await;

    let frame = engine.finish_advance();
    let line = format_advance(&frame);

    let blob = frame.payload.as_ref().and_then(|payload| {
        let mut buf = Vec::with_capacity(64);
        match encode_payload(payload, &mut buf) {
            Ok(()) => Some(Bytes::from(buf)),
            Err(e) => {
                warn!(error = %e, "dropping unencodable payload frame");
                None
            }
        }
    });

    // Snapshot of current clients to minimize lock hold time.
    let current_clients = {
        let guard = clients.read().await;
        guard.clone()
    };

    debug!(
        frame = frame.frame,
        clients = current_clients.len(),
        payload = blob.is_some(),
        "broadcasting advance"
    );

    let mut dead: Vec<ClientId> = Vec::new();
    for (client_id, tx) in current_clients.iter() {
        if tx.send(OutboundFrame::Line(line.clone())).is_err() {
            dead.push(*client_id);
            continue;
        }
        if let Some(blob) = &blob {
            if tx.send(OutboundFrame::Blob(blob.clone())).is_err() {
                dead.push(*client_id);
            }
        }
    }

    engine.mark_advanced(tokio::time::Instant::now().into_std());

    // A client we cannot queue to is a disconnect, never a reason to
    // abort the round for the others.
    for client_id in dead {
        warn!(client = client_id.0, "send failed, dropping client");
        if let Some(slot) = slots.remove(&client_id) {
            let _ = engine.drop_slot(slot);
        }
        remove_client(clients, client_id).await;
    }
}

async fn remove_client(clients: &ClientRegistry, client_id: ClientId) {
    let mut guard = clients.write().await;
    guard.remove(&client_id);
}
