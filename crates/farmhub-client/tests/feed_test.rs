//! Integration tests for the live notification feed.

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout};

use common::{MockApi, MockConnector, notification};
use farmhub_client::feed::NotificationFeed;
use farmhub_client::transport::{ClientTransport, ConnectionState};
use farmhub_core::config::client::ReconnectConfig;
use farmhub_core::types::id::FarmId;

fn reconnect() -> ReconnectConfig {
    ReconnectConfig {
        max_attempts: 3,
        initial_delay_ms: 5,
        max_delay_ms: 20,
    }
}

fn transport(connector: Arc<MockConnector>) -> Arc<ClientTransport> {
    Arc::new(ClientTransport::new(
        "ws://localhost:8080/ws",
        "test-token",
        Some(FarmId::new()),
        reconnect(),
        connector,
    ))
}

#[tokio::test]
async fn test_mount_fetches_snapshot_and_connects() {
    let farm = FarmId::new();
    let api = MockApi::with_notifications(vec![
        notification(farm, false),
        notification(farm, true),
    ]);
    let (connector, mut sessions) = MockConnector::new(false);
    let transport = transport(connector);

    let feed = NotificationFeed::mount(api, transport, true)
        .await
        .expect("mount");

    timeout(Duration::from_secs(1), sessions.recv())
        .await
        .expect("auto-connect")
        .expect("session");
    sleep(Duration::from_millis(20)).await;

    let state = feed.snapshot();
    assert_eq!(state.notifications.len(), 2);
    assert_eq!(state.unread_count, 1);
    assert!(state.is_connected);

    let pagination = state.pagination.expect("pagination present");
    assert_eq!(pagination.page, 1);
    assert_eq!(pagination.total_items, 2);
}

#[tokio::test]
async fn test_push_prepends_and_counts_unread_only() {
    let farm = FarmId::new();
    let api = MockApi::with_notifications(vec![notification(farm, true)]);
    let (connector, mut sessions) = MockConnector::new(false);
    let feed = NotificationFeed::mount(api, transport(connector), true)
        .await
        .expect("mount");

    let session = timeout(Duration::from_secs(1), sessions.recv())
        .await
        .expect("connect")
        .expect("session");

    let unread = notification(farm, false);
    let frame = serde_json::json!({ "event": "notification:new", "data": &unread });
    session
        .to_client
        .send(frame.to_string())
        .await
        .expect("push");
    sleep(Duration::from_millis(20)).await;

    let state = feed.snapshot();
    assert_eq!(state.notifications.len(), 2);
    assert_eq!(state.notifications[0].id, unread.id);
    assert_eq!(state.unread_count, 1);

    // An already-read push extends the list but not the counter.
    let read = notification(farm, true);
    let frame = serde_json::json!({ "event": "notification:new", "data": &read });
    session
        .to_client
        .send(frame.to_string())
        .await
        .expect("push");

    // A duplicate of an id already in the list is ignored entirely.
    let duplicate = serde_json::json!({ "event": "notification:new", "data": &unread });
    session
        .to_client
        .send(duplicate.to_string())
        .await
        .expect("push duplicate");
    sleep(Duration::from_millis(20)).await;

    let state = feed.snapshot();
    assert_eq!(state.notifications.len(), 3);
    assert_eq!(state.unread_count, 1);
}

#[tokio::test]
async fn test_mark_as_read_is_optimistic_and_idempotent() {
    let farm = FarmId::new();
    let target = notification(farm, false);
    let api = MockApi::with_notifications(vec![target.clone(), notification(farm, false)]);
    let (connector, _sessions) = MockConnector::new(false);
    let feed = NotificationFeed::mount(api.clone(), transport(connector), false)
        .await
        .expect("mount");

    assert_eq!(feed.snapshot().unread_count, 2);

    feed.mark_as_read(&target.id).await.expect("mark read");
    let state = feed.snapshot();
    assert_eq!(state.unread_count, 1);
    let local = state
        .notifications
        .iter()
        .find(|n| n.id == target.id)
        .expect("still listed");
    assert!(local.is_read());

    // Marking again must not decrement a second time.
    feed.mark_as_read(&target.id).await.expect("mark read again");
    assert_eq!(feed.snapshot().unread_count, 1);

    assert_eq!(api.read_calls.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_delete_decrements_unread_exactly_once() {
    let farm = FarmId::new();
    let unread = notification(farm, false);
    let read = notification(farm, true);
    let api = MockApi::with_notifications(vec![unread.clone(), read.clone()]);
    let (connector, _sessions) = MockConnector::new(false);
    let feed = NotificationFeed::mount(api.clone(), transport(connector), false)
        .await
        .expect("mount");

    feed.delete_notification(&unread.id).await.expect("delete");
    let state = feed.snapshot();
    assert_eq!(state.notifications.len(), 1);
    assert_eq!(state.unread_count, 0);

    // Deleting it again changes nothing locally.
    feed.delete_notification(&unread.id).await.expect("repeat delete");
    assert_eq!(feed.snapshot().unread_count, 0);

    // Deleting a read item leaves the counter alone.
    feed.delete_notification(&read.id).await.expect("delete read");
    let state = feed.snapshot();
    assert!(state.notifications.is_empty());
    assert_eq!(state.unread_count, 0);

    assert_eq!(api.delete_calls.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_connection_flag_mirrors_transport() {
    let farm = FarmId::new();
    let api = MockApi::with_notifications(vec![notification(farm, false)]);
    let (connector, mut sessions) = MockConnector::new(false);
    let feed = NotificationFeed::mount(api, transport(connector), true)
        .await
        .expect("mount");

    let session = timeout(Duration::from_secs(1), sessions.recv())
        .await
        .expect("connect")
        .expect("session");
    sleep(Duration::from_millis(20)).await;
    assert!(feed.snapshot().is_connected);

    // Server drop flips the flag; reconnection flips it back.
    drop(session);
    sleep(Duration::from_millis(5)).await;
    let reconnected = timeout(Duration::from_secs(1), sessions.recv())
        .await
        .expect("reconnect")
        .expect("session");
    sleep(Duration::from_millis(20)).await;
    assert!(feed.snapshot().is_connected);
    drop(reconnected);
}

#[tokio::test]
async fn test_close_unregisters_handlers_and_disconnects() {
    let farm = FarmId::new();
    let api = MockApi::with_notifications(vec![]);
    let (connector, mut sessions) = MockConnector::new(false);
    let transport = transport(connector);
    let feed = NotificationFeed::mount(api, transport.clone(), true)
        .await
        .expect("mount");

    timeout(Duration::from_secs(1), sessions.recv())
        .await
        .expect("connect")
        .expect("session");
    sleep(Duration::from_millis(20)).await;

    feed.close();
    assert_eq!(transport.state(), ConnectionState::Disconnected);
    assert_eq!(transport.bus().handler_count("notification:new"), 0);
    assert_eq!(transport.bus().handler_count("connect"), 0);

    // State is frozen after close; nothing fires anymore.
    let before = feed.snapshot();
    sleep(Duration::from_millis(30)).await;
    assert_eq!(feed.snapshot().notifications.len(), before.notifications.len());
    assert!(!feed.snapshot().is_connected);
}
