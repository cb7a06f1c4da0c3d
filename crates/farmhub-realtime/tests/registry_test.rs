//! Integration tests for connection registry membership and fan-out.

use std::sync::Arc;

use tokio::sync::mpsc;

use farmhub_core::config::realtime::{NotificationStoreConfig, RealtimeConfig};
use farmhub_core::events::{AnimalHealthChange, ChangeKind, FarmEvent, HealthStatus, RecordChange};
use farmhub_core::types::id::{AnimalId, FarmId, UserId};
use farmhub_realtime::bridge::event_bridge::EventBridge;
use farmhub_realtime::channel::registry::ChannelRegistry;
use farmhub_realtime::connection::authenticator::AuthenticatedConnection;
use farmhub_realtime::connection::handle::ConnectionHandle;
use farmhub_realtime::connection::manager::ConnectionManager;
use farmhub_realtime::message::types::OutboundMessage;
use farmhub_service::NotificationService;

fn manager() -> ConnectionManager {
    ConnectionManager::new(RealtimeConfig::default(), Arc::new(ChannelRegistry::new()))
}

fn auth(farm_id: Option<FarmId>) -> AuthenticatedConnection {
    AuthenticatedConnection {
        user_id: UserId::new(),
        name: "tester".to_string(),
        farm_id,
    }
}

/// Drains every frame currently queued on a receiver.
fn drain(rx: &mut mpsc::Receiver<String>) -> Vec<serde_json::Value> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(serde_json::from_str(&frame).expect("frame is JSON"));
    }
    frames
}

#[tokio::test]
async fn test_switch_farm_moves_membership() {
    let manager = manager();
    let farm_a = FarmId::new();
    let farm_b = FarmId::new();

    let (handle, _rx) = manager.register(&auth(Some(farm_a)));
    assert_eq!(manager.farm_connection_count(farm_a), 1);
    assert_eq!(manager.farm_connection_count(farm_b), 0);

    manager.join_farm(&handle.id, farm_b);
    assert_eq!(manager.farm_connection_count(farm_a), 0);
    assert_eq!(manager.farm_connection_count(farm_b), 1);
    assert_eq!(handle.current_farm(), Some(farm_b));

    // Joining the same farm again is a no-op.
    manager.join_farm(&handle.id, farm_b);
    assert_eq!(manager.farm_connection_count(farm_b), 1);
}

#[tokio::test]
async fn test_active_farms_and_online_introspection() {
    let manager = manager();
    let farm = FarmId::new();

    let credentials = auth(Some(farm));
    let user_id = credentials.user_id;
    let (handle, _rx) = manager.register(&credentials);

    assert_eq!(manager.active_farms(), vec![farm]);
    assert!(manager.is_user_online(&user_id));
    assert_eq!(manager.connection_count(), 1);

    manager.unregister(&handle.id);
    assert!(manager.active_farms().is_empty());
    assert!(!manager.is_user_online(&user_id));
}

#[tokio::test]
async fn test_unregister_is_idempotent() {
    let manager = manager();
    let (handle, _rx) = manager.register(&auth(Some(FarmId::new())));

    manager.unregister(&handle.id);
    // Disconnect racing explicit teardown: second call finds nothing.
    manager.unregister(&handle.id);
    assert_eq!(manager.connection_count(), 0);
}

#[tokio::test]
async fn test_emit_to_farm_reaches_members_only() {
    let manager = manager();
    let farm_a = FarmId::new();
    let farm_b = FarmId::new();

    let (_member, mut member_rx) = manager.register(&auth(Some(farm_a)));
    let (_other, mut other_rx) = manager.register(&auth(Some(farm_b)));

    manager.emit_to_farm(
        farm_a,
        &OutboundMessage::Pong {
            timestamp: chrono::Utc::now(),
        },
    );

    let member_frames = drain(&mut member_rx);
    assert_eq!(member_frames.len(), 1);
    assert_eq!(member_frames[0]["event"], "pong");
    assert!(drain(&mut other_rx).is_empty());
}

#[tokio::test]
async fn test_entity_subscription_is_independent_of_farm() {
    let manager = manager();
    let farm_a = FarmId::new();
    let farm_b = FarmId::new();
    let animal = AnimalId::new();

    let (handle, mut rx) = manager.register(&auth(Some(farm_a)));
    manager.subscribe_entity(&handle.id, animal);

    // Switching farms must not disturb the animal subscription.
    manager.join_farm(&handle.id, farm_b);

    manager.emit_to_entity(
        animal,
        &OutboundMessage::Pong {
            timestamp: chrono::Utc::now(),
        },
    );
    assert_eq!(drain(&mut rx).len(), 1);

    manager.unsubscribe_entity(&handle.id, animal);
    manager.emit_to_entity(
        animal,
        &OutboundMessage::Pong {
            timestamp: chrono::Utc::now(),
        },
    );
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_ping_answered_with_pong() {
    let manager = manager();
    let (handle, mut rx) = manager.register(&auth(None));

    manager.handle_inbound(&handle.id, r#"{"event":"ping"}"#);

    let frames = drain(&mut rx);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["event"], "pong");
}

#[tokio::test]
async fn test_malformed_frame_gets_error_and_connection_survives() {
    let manager = manager();
    let (handle, mut rx) = manager.register(&auth(None));

    manager.handle_inbound(&handle.id, "not json at all");

    let frames = drain(&mut rx);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["event"], "error");

    // The connection still works afterwards.
    manager.handle_inbound(&handle.id, r#"{"event":"ping"}"#);
    assert_eq!(drain(&mut rx)[0]["event"], "pong");
}

#[tokio::test]
async fn test_switch_farm_inbound_frame() {
    let manager = manager();
    let farm_a = FarmId::new();
    let farm_b = FarmId::new();

    let (handle, _rx) = manager.register(&auth(Some(farm_a)));
    let frame = format!(r#"{{"event":"switch-farm","data":{{"farmId":"{farm_b}"}}}}"#);
    manager.handle_inbound(&handle.id, &frame);

    assert_eq!(manager.farm_connection_count(farm_a), 0);
    assert_eq!(manager.farm_connection_count(farm_b), 1);
}

#[tokio::test]
async fn test_bridge_fans_out_to_farm_and_entity() {
    let channels = Arc::new(ChannelRegistry::new());
    let connections = Arc::new(ConnectionManager::new(RealtimeConfig::default(), channels));
    let notifications = Arc::new(NotificationService::new(&NotificationStoreConfig {
        max_entries: 100,
    }));
    let bridge = EventBridge::new(connections.clone(), notifications.clone());

    let farm = FarmId::new();
    let animal = AnimalId::new();

    // One farm member, one entity watcher scoped to a different farm.
    let (_member, mut member_rx) = connections.register(&auth(Some(farm)));
    let (watcher, mut watcher_rx) = connections.register(&auth(Some(FarmId::new())));
    connections.subscribe_entity(&watcher.id, animal);

    let notification = bridge.record(&FarmEvent::AnimalHealth(AnimalHealthChange {
        farm_id: farm,
        animal_id: animal,
        tag: "B-107".to_string(),
        previous: HealthStatus::Healthy,
        current: HealthStatus::Sick,
    }));

    let member_frames = drain(&mut member_rx);
    assert_eq!(member_frames.len(), 1);
    assert_eq!(member_frames[0]["event"], "notification:new");
    assert_eq!(member_frames[0]["data"]["id"], notification.id.as_str());
    assert_eq!(member_frames[0]["data"]["severity"], "high");

    let watcher_frames = drain(&mut watcher_rx);
    assert_eq!(watcher_frames.len(), 1);
    assert_eq!(watcher_frames[0]["event"], "animal:health-changed");
    assert_eq!(watcher_frames[0]["data"]["newStatus"], "sick");

    // The record landed in the store too.
    assert_eq!(notifications.unread_count(farm), 1);
}

#[tokio::test]
async fn test_bridge_broadcasts_record_changes() {
    let channels = Arc::new(ChannelRegistry::new());
    let connections = Arc::new(ConnectionManager::new(RealtimeConfig::default(), channels));
    let notifications = Arc::new(NotificationService::new(&NotificationStoreConfig {
        max_entries: 100,
    }));
    let bridge = EventBridge::new(connections.clone(), notifications);

    let farm = FarmId::new();
    let animal = AnimalId::new();

    let (member, mut rx) = connections.register(&auth(Some(farm)));
    connections.subscribe_entity(&member.id, animal);

    bridge.record_change(RecordChange::new(
        ChangeKind::Update,
        "animal",
        animal.into_uuid(),
        farm,
        serde_json::json!({"weightKg": 412}),
        None,
    ));

    let frames = drain(&mut rx);
    let events: Vec<_> = frames.iter().map(|f| f["event"].as_str().unwrap()).collect();
    assert!(events.contains(&"data:update"));
    assert!(events.contains(&"animal:update"));
}

// Keep the handle type exercised directly: a dead handle drops frames.
#[tokio::test]
async fn test_dead_handle_drops_frames() {
    let (tx, _rx) = mpsc::channel(4);
    let handle = ConnectionHandle::new(UserId::new(), "tester".to_string(), tx);

    assert!(handle.send("frame".to_string()));
    handle.mark_dead();
    assert!(!handle.send("frame".to_string()));
}
