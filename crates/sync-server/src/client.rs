//! Per-connection I/O.
//!
//! Each accepted connection gets two halves:
//! - a writer task draining the client's outbound queue (control lines
//!   and payload blobs, in the order the engine enqueued them),
//! - a reader loop turning newline-terminated lines into
//!   `EngineCommand`s.
//!
//! The reader never parses payload framing: clients only speak the
//! line grammar (`S`, `D`, `T,<text>`). Unparsable lines are logged
//! and dropped, not fatal.

use anyhow::Result;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{tcp::OwnedWriteHalf, TcpStream};
use tracing::{debug, warn};

use sync_core::ClientMessage;
use sync_protocol::parse_client_line;

use crate::types::{ClientId, ClientRegistry, EngineCommand, EngineTx, OutboundFrame, OutboundRx};

/// Upper bound on buffered inbound bytes awaiting a newline. The
/// grammar is single-letter commands plus short broadcast texts, so a
/// client exceeding this is not speaking the protocol and gets
/// disconnected instead of growing the buffer without bound.
const MAX_LINE_BYTES: usize = 8 * 1024;

/// Run the client I/O loop for a single connection.
pub async fn run_client(
    client_id: ClientId,
    stream: TcpStream,
    engine_tx: EngineTx,
    mut out_rx: OutboundRx,
    clients: ClientRegistry,
) -> Result<()> {
    let (mut read_stream, write_stream) = stream.into_split();

    // Writer task: drain the outbound queue onto the socket. When the
    // engine drops our sender (rejection or disconnect), the queue
    // closes and we shut the write half down.
    let _writer_handle = tokio::spawn(async move {
        let mut write_stream = write_stream;

        while let Some(frame) = out_rx.recv().await {
            if let Err(e) = write_frame(&mut write_stream, frame).await {
                warn!(client = client_id.0, error = %e, "write error");
                break;
            }
        }

        let _ = write_stream.shutdown().await;
    });

    // Reader loop: accumulate bytes, extract newline-terminated lines.
    let mut buffer = Vec::new();
    let mut temp_buf = [0u8; 1024];

    loop {
        match read_stream.read(&mut temp_buf).await {
            Ok(0) => {
                debug!(client = client_id.0, "EOF, client disconnected");
                break;
            }
            Ok(n) => {
                buffer.extend_from_slice(&temp_buf[..n]);

                while let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=newline_pos).collect();
                    let line_str = String::from_utf8_lossy(&line);

                    let Some(msg) = parse_client_line(&line_str) else {
                        if !line_str.trim().is_empty() {
                            warn!(client = client_id.0, line = %line_str.trim(), "unparsable line");
                        }
                        continue;
                    };

                    let cmd = match msg {
                        ClientMessage::Start => EngineCommand::Register { client_id },
                        ClientMessage::Ready => EngineCommand::Ready { client_id },
                        ClientMessage::Broadcast(text) => {
                            EngineCommand::Broadcast { client_id, text }
                        }
                    };

                    if engine_tx.send(cmd).is_err() {
                        debug!(client = client_id.0, "engine channel closed");
                        return Ok(());
                    }
                }

                if buffer.len() > MAX_LINE_BYTES {
                    warn!(
                        client = client_id.0,
                        buffered = buffer.len(),
                        "line exceeds limit, dropping client"
                    );
                    break;
                }
            }
            Err(e) => {
                warn!(client = client_id.0, error = %e, "read error");
                break;
            }
        }
    }

    // Normally the engine handles the removal; fall back to removing
    // ourselves if it is already gone.
    if engine_tx.send(EngineCommand::Disconnect { client_id }).is_err() {
        let mut guard = clients.write().await;
        guard.remove(&client_id);
    }

    Ok(())
}

async fn write_frame(stream: &mut OwnedWriteHalf, frame: OutboundFrame) -> Result<()> {
    match frame {
        OutboundFrame::Line(line) => {
            stream.write_all(line.as_bytes()).await?;
            stream.write_all(b"\n").await?;
        }
        OutboundFrame::Blob(blob) => {
            stream.write_all(&blob).await?;
        }
    }
    stream.flush().await?;
    Ok(())
}
