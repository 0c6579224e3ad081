//! Janitor timing tests against a running relay actor.
//!
//! All tests run with paused time, so the 60 s sweep period and 30 min
//! retention window elapse instantly.

use std::time::Duration;

use serde_json::json;
use tandem_protocol::ClientMessage;
use tandem_room::{Outbound, RelayConfig, RelayHandle, spawn_janitor, spawn_relay};
use tandem_transport::ConnectionId;
use tokio::sync::mpsc;

const MINUTE: Duration = Duration::from_secs(60);

fn join_msg(room: &str) -> ClientMessage {
    serde_json::from_value(json!({"t": "join", "room": room})).unwrap()
}

async fn join(
    relay: &RelayHandle,
    id: u64,
    room: &str,
) -> (ConnectionId, mpsc::UnboundedReceiver<Outbound>) {
    let conn = ConnectionId::new(id);
    let (tx, rx) = mpsc::unbounded_channel();
    relay.open(conn, tx).await.unwrap();
    relay.message(conn, join_msg(room)).await.unwrap();
    (conn, rx)
}

fn start() -> RelayHandle {
    let config = RelayConfig::default();
    let relay = spawn_relay(config.clone());
    spawn_janitor(relay.clone(), config.sweep_interval);
    relay
}

#[tokio::test(start_paused = true)]
async fn test_empty_room_survives_inside_ttl() {
    let relay = start();
    let (conn, _rx) = join(&relay, 1, "r").await;
    relay.closed(conn).await.unwrap();

    tokio::time::sleep(10 * MINUTE).await;
    assert_eq!(relay.room_count().await.unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_empty_room_evicted_after_ttl() {
    let relay = start();
    let (conn, _rx) = join(&relay, 1, "r").await;
    relay.closed(conn).await.unwrap();

    tokio::time::sleep(32 * MINUTE).await;
    assert_eq!(relay.room_count().await.unwrap(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_occupied_room_is_never_evicted() {
    let relay = start();
    let (_conn, _rx) = join(&relay, 1, "r").await;

    tokio::time::sleep(120 * MINUTE).await;
    assert_eq!(relay.room_count().await.unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_room_with_dead_occupant_is_evicted() {
    let relay = start();
    let (_conn, rx) = join(&relay, 1, "r").await;
    relay.room_count().await.unwrap();
    drop(rx);

    tokio::time::sleep(32 * MINUTE).await;
    assert_eq!(relay.room_count().await.unwrap(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_janitor_stops_after_relay_shutdown() {
    let config = RelayConfig::default();
    let relay = spawn_relay(config.clone());
    let janitor = spawn_janitor(relay.clone(), config.sweep_interval);

    join(&relay, 1, "r").await;
    assert_eq!(relay.shutdown().await.unwrap(), 1);

    tokio::time::timeout(2 * MINUTE, janitor)
        .await
        .expect("janitor should stop")
        .unwrap();
    assert!(relay.room_count().await.is_err());
}
