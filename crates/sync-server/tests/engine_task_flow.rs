// crates/sync-server/tests/engine_task_flow.rs
//
// Drives the engine loop through channels with fake clients, under a
// paused tokio clock so the throttle sleeps cost no wall time.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio::task::JoinHandle;

use sync_server::config::Config;
use sync_server::engine_task::run_engine_loop;
use sync_server::types::{
    ClientId, ClientRegistry, EngineCommand, EngineTx, OutboundFrame, OutboundRx,
};

struct TestWall {
    engine_tx: EngineTx,
    clients: ClientRegistry,
    handle: JoinHandle<()>,
}

fn test_config(screens: usize, framerate: u32) -> Config {
    Config {
        screens,
        framerate,
        ..Config::default()
    }
}

fn spawn_wall(screens: usize, framerate: u32) -> TestWall {
    let clients: ClientRegistry = Arc::new(RwLock::new(HashMap::new()));
    let (engine_tx, engine_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(run_engine_loop(
        engine_rx,
        clients.clone(),
        test_config(screens, framerate),
    ));
    TestWall {
        engine_tx,
        clients,
        handle,
    }
}

/// Register a fake client: its outbound queue stands in for the writer
/// task, and the returned receiver is "the socket".
async fn join(wall: &TestWall, id: u64) -> OutboundRx {
    let client_id = ClientId(id);
    let (tx, rx) = mpsc::unbounded_channel();
    wall.clients.write().await.insert(client_id, tx);
    wall.engine_tx
        .send(EngineCommand::Register { client_id })
        .unwrap();
    rx
}

fn ready(wall: &TestWall, id: u64) {
    wall.engine_tx
        .send(EngineCommand::Ready {
            client_id: ClientId(id),
        })
        .unwrap();
}

async fn expect_line(rx: &mut OutboundRx) -> String {
    match rx.recv().await.expect("outbound channel closed") {
        OutboundFrame::Line(line) => line,
        other => panic!("expected a control line, got {:?}", other),
    }
}

async fn expect_blob(rx: &mut OutboundRx) -> Bytes {
    match rx.recv().await.expect("outbound channel closed") {
        OutboundFrame::Blob(blob) => blob,
        other => panic!("expected a payload blob, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn two_clients_advance_in_lockstep() {
    let wall = spawn_wall(2, 10);
    let mut rx_a = join(&wall, 1).await;
    let mut rx_b = join(&wall, 2).await;

    ready(&wall, 1);
    ready(&wall, 2);
    assert_eq!(expect_line(&mut rx_a).await, "G,0");
    assert_eq!(expect_line(&mut rx_b).await, "G,0");

    ready(&wall, 2);
    ready(&wall, 1);
    assert_eq!(expect_line(&mut rx_a).await, "G,1");
    assert_eq!(expect_line(&mut rx_b).await, "G,1");

    wall.engine_tx.send(EngineCommand::Shutdown).unwrap();
    wall.handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn broadcast_text_rides_the_next_frame() {
    let wall = spawn_wall(2, 10);
    let mut rx_a = join(&wall, 1).await;
    let mut rx_b = join(&wall, 2).await;

    ready(&wall, 1);
    wall.engine_tx
        .send(EngineCommand::Broadcast {
            client_id: ClientId(1),
            text: "hello".to_string(),
        })
        .unwrap();
    ready(&wall, 2);

    assert_eq!(expect_line(&mut rx_a).await, "G,0:hello");
    assert_eq!(expect_line(&mut rx_b).await, "G,0:hello");

    // Consumed with the round it rode on.
    ready(&wall, 1);
    ready(&wall, 2);
    assert_eq!(expect_line(&mut rx_a).await, "G,1");
}

#[tokio::test(start_paused = true)]
async fn byte_payload_round_delivers_control_line_then_blob() {
    let wall = spawn_wall(2, 10);
    let mut rx_a = join(&wall, 1).await;
    let mut rx_b = join(&wall, 2).await;

    wall.engine_tx
        .send(EngineCommand::QueueBytes {
            data: Bytes::from_static(&[1, 2, 3]),
        })
        .unwrap();
    ready(&wall, 1);
    ready(&wall, 2);

    for rx in [&mut rx_a, &mut rx_b] {
        assert_eq!(expect_line(rx).await, "BG,0");
        assert_eq!(expect_blob(rx).await, Bytes::from_static(&[0, 0, 0, 3, 1, 2, 3]));
    }
}

#[tokio::test(start_paused = true)]
async fn int_payload_round() {
    let wall = spawn_wall(1, 10);
    let mut rx = join(&wall, 1).await;

    wall.engine_tx
        .send(EngineCommand::QueueInts { data: vec![-1, 7] })
        .unwrap();
    ready(&wall, 1);

    assert_eq!(expect_line(&mut rx).await, "IG,0");
    assert_eq!(
        expect_blob(&mut rx).await,
        Bytes::from_static(&[0, 0, 0, 2, 0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 7])
    );
}

#[tokio::test(start_paused = true)]
async fn client_beyond_capacity_is_refused() {
    let wall = spawn_wall(1, 10);
    let mut rx_a = join(&wall, 1).await;
    let mut rx_b = join(&wall, 2).await;

    // The engine removes the rejected client from the registry and
    // drops its outbound queue, which is the writer's cue to close.
    assert!(rx_b.recv().await.is_none());

    // The wall itself keeps running with its one seat filled.
    ready(&wall, 1);
    assert_eq!(expect_line(&mut rx_a).await, "G,0");
}

#[tokio::test(start_paused = true)]
async fn duplicate_start_request_does_not_leak_a_seat() {
    let wall = spawn_wall(2, 10);
    let mut rx_a = join(&wall, 1).await;

    // Same client asks for a seat again: ignored, not re-assigned.
    wall.engine_tx
        .send(EngineCommand::Register {
            client_id: ClientId(1),
        })
        .unwrap();

    // The second seat is still free for a legitimate client, and the
    // wall still advances on exactly the two seated clients.
    let mut rx_b = join(&wall, 2).await;
    ready(&wall, 1);
    ready(&wall, 2);
    assert_eq!(expect_line(&mut rx_a).await, "G,0");
    assert_eq!(expect_line(&mut rx_b).await, "G,0");
}

#[tokio::test(start_paused = true)]
async fn dropped_seat_stalls_the_wall_until_refilled() {
    let wall = spawn_wall(2, 10);
    let mut rx_a = join(&wall, 1).await;
    let _rx_b = join(&wall, 2).await;

    wall.engine_tx
        .send(EngineCommand::Disconnect {
            client_id: ClientId(2),
        })
        .unwrap();
    ready(&wall, 1);

    // The empty seat still counts toward the barrier: no advance.
    let stalled = tokio::time::timeout(Duration::from_secs(5), rx_a.recv()).await;
    assert!(stalled.is_err());

    // A new client takes the free seat and completes the round.
    let mut rx_c = join(&wall, 3).await;
    ready(&wall, 3);
    assert_eq!(expect_line(&mut rx_a).await, "G,0");
    assert_eq!(expect_line(&mut rx_c).await, "G,0");
}

#[tokio::test(start_paused = true)]
async fn all_disconnected_resets_the_frame_count() {
    let wall = spawn_wall(1, 10);
    let mut rx_a = join(&wall, 1).await;

    ready(&wall, 1);
    assert_eq!(expect_line(&mut rx_a).await, "G,0");
    ready(&wall, 1);
    assert_eq!(expect_line(&mut rx_a).await, "G,1");

    wall.engine_tx
        .send(EngineCommand::Disconnect {
            client_id: ClientId(1),
        })
        .unwrap();

    // A rejoining wall starts over at frame 0.
    let mut rx_b = join(&wall, 2).await;
    ready(&wall, 2);
    assert_eq!(expect_line(&mut rx_b).await, "G,0");
}

#[tokio::test(start_paused = true)]
async fn consecutive_frames_respect_the_throttle() {
    let wall = spawn_wall(1, 10); // 100ms interval
    let mut rx = join(&wall, 1).await;

    ready(&wall, 1);
    assert_eq!(expect_line(&mut rx).await, "G,0");

    let t0 = tokio::time::Instant::now();
    ready(&wall, 1);
    assert_eq!(expect_line(&mut rx).await, "G,1");
    assert!(t0.elapsed() >= Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn reset_command_restarts_numbering() {
    let wall = spawn_wall(1, 10);
    let mut rx = join(&wall, 1).await;

    ready(&wall, 1);
    assert_eq!(expect_line(&mut rx).await, "G,0");

    wall.engine_tx.send(EngineCommand::ResetFrameCount).unwrap();

    ready(&wall, 1);
    assert_eq!(expect_line(&mut rx).await, "G,0");
}

#[tokio::test(start_paused = true)]
async fn all_disconnected_query() {
    let wall = spawn_wall(1, 10);

    let (reply_tx, reply_rx) = oneshot::channel();
    wall.engine_tx
        .send(EngineCommand::AllDisconnected { reply: reply_tx })
        .unwrap();
    assert!(reply_rx.await.unwrap());

    let _rx = join(&wall, 1).await;
    let (reply_tx, reply_rx) = oneshot::channel();
    wall.engine_tx
        .send(EngineCommand::AllDisconnected { reply: reply_tx })
        .unwrap();
    assert!(!reply_rx.await.unwrap());
}
