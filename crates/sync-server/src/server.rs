//! TCP listener and top-level server wiring.
//!
//! This module:
//! - Listens on the configured address/port.
//! - Accepts new TCP connections, refusing any beyond `screens`.
//! - Assigns each connection a `ClientId`.
//! - Spawns:
//!   - a per-client task to handle I/O,
//!   - a single central engine task that owns the `BarrierEngine`.
//! - Stops accepting on Ctrl-C and lets an in-flight advance finish.
//!
//! The actual per-client logic and engine loop live in `client` and
//! `engine_task` modules respectively.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use crate::client;
use crate::config::Config;
use crate::engine_task;
use crate::types::{ClientId, ClientRegistry, EngineCommand, EngineRx, EngineTx, OutboundRx, OutboundTx};

/// Global-ish counter for assigning unique `ClientId`s.
static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

fn next_client_id() -> ClientId {
    let id = NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed);
    ClientId(id)
}

/// Run the TCP server with the given configuration.
///
/// Returns once shutdown is requested (Ctrl-C) or the listener fails.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr = config.socket_addr_string();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    serve(listener, config).await
}

/// Serve an already-bound listener. Split out of [`run`] so callers
/// (and tests) can bind an ephemeral port themselves.
pub async fn serve(listener: TcpListener, config: Config) -> anyhow::Result<()> {
    let addr = listener
        .local_addr()
        .context("listener has no local address")?;
    info!(
        addr = %addr,
        screens = config.screens,
        framerate = config.framerate,
        "listening"
    );

    // Shared registry of clients -> outbound queues.
    let clients: ClientRegistry = Arc::new(tokio::sync::RwLock::new(Default::default()));

    // Channel from clients -> engine task.
    let (engine_tx, engine_rx): (EngineTx, EngineRx) = mpsc::unbounded_channel();

    // Spawn the central engine task.
    let engine_handle = {
        let clients_clone = clients.clone();
        let config_clone = config.clone();
        tokio::spawn(async move {
            engine_task::run_engine_loop(engine_rx, clients_clone, config_clone).await;
        })
    };

    // Ctrl-C flips the shutdown watch; the accept loop sees it and exits.
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                info!("shutdown requested, no longer accepting connections");
                break;
            }
            accepted = listener.accept() => {
                let (stream, peer_addr) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        // Barrier state is untouched; we just stop
                        // taking new clients.
                        error!(error = %e, "accept failed, closing listener");
                        break;
                    }
                };

                let current_clients = {
                    let guard = clients.read().await;
                    guard.len()
                };

                if current_clients >= config.screens {
                    warn!(
                        peer = %peer_addr,
                        screens = config.screens,
                        "rejecting connection: all slots occupied"
                    );
                    // Just drop the stream; client will see the connection closed.
                    continue;
                }

                let client_id = next_client_id();
                info!(client = client_id.0, peer = %peer_addr, "accepted connection");

                // Outbound queue for this client.
                let (out_tx, out_rx): (OutboundTx, OutboundRx) = mpsc::unbounded_channel();

                // Register client.
                {
                    let mut guard = clients.write().await;
                    guard.insert(client_id, out_tx);
                }

                let clients_clone = clients.clone();
                let engine_tx_clone = engine_tx.clone();

                tokio::spawn(async move {
                    if let Err(e) =
                        client::run_client(client_id, stream, engine_tx_clone, out_rx, clients_clone).await
                    {
                        warn!(client = client_id.0, error = %e, "client task failed");
                    } else {
                        info!(client = client_id.0, "client task finished");
                    }
                });
            }
        }
    }

    // Let the engine drain queued commands (an in-flight advance
    // completes before the Shutdown command is reached).
    let _ = engine_tx.send(EngineCommand::Shutdown);
    engine_handle.await.context("engine task panicked")?;

    info!("server stopped");
    Ok(())
}
