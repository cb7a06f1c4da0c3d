//! Domain event → notification mapping.
//!
//! Bridges farm domain events into the notification store and out to
//! connected clients: the record is written first, then fanned out to the
//! owning farm's channel, and entity-scoped events additionally reach
//! their entity subscribers on a narrower channel.

use std::sync::Arc;

use farmhub_core::events::{ChangeKind, FarmEvent, RecordChange};
use farmhub_core::types::id::AnimalId;
use farmhub_entity::Notification;
use farmhub_service::NotificationService;

use crate::connection::manager::ConnectionManager;
use crate::message::types::OutboundMessage;

/// Name of the animal record collection in CRUD change events.
const ANIMAL_ENTITY: &str = "animal";

/// Bridges domain events into the realtime system.
#[derive(Debug)]
pub struct EventBridge {
    /// Connection manager for fan-out.
    connections: Arc<ConnectionManager>,
    /// Notification service owning the store.
    notifications: Arc<NotificationService>,
}

impl EventBridge {
    /// Creates a new event bridge.
    pub fn new(connections: Arc<ConnectionManager>, notifications: Arc<NotificationService>) -> Self {
        Self {
            connections,
            notifications,
        }
    }

    /// Records a farm event as a notification and fans it out.
    ///
    /// The farm channel always receives `notification:new`; an animal
    /// health change additionally reaches that animal's subscribers as
    /// `animal:health-changed`. The two broadcasts are independent — no
    /// ordering is guaranteed between them.
    pub fn record(&self, event: &FarmEvent) -> Notification {
        let notification = self.notifications.record(event);

        self.connections.emit_to_farm(
            notification.farm_id,
            &OutboundMessage::NotificationNew(notification.clone()),
        );

        if let FarmEvent::AnimalHealth(change) = event {
            self.connections.emit_to_entity(
                change.animal_id,
                &OutboundMessage::AnimalHealthChanged {
                    animal_id: change.animal_id,
                    previous_status: change.previous.to_string(),
                    new_status: change.current.to_string(),
                    notification_id: notification.id.clone(),
                    timestamp: notification.timestamp,
                },
            );
        }

        notification
    }

    /// Broadcasts a CRUD change to the owning farm and, for animal
    /// records, to that animal's subscribers.
    pub fn record_change(&self, change: RecordChange) {
        self.connections
            .emit_to_farm(change.farm_id, &OutboundMessage::DataUpdate(change.clone()));

        if change.entity == ANIMAL_ENTITY {
            let animal_id = AnimalId::from(change.entity_id);
            let message = match change.change {
                ChangeKind::Create => OutboundMessage::AnimalCreated(change),
                ChangeKind::Update => OutboundMessage::AnimalUpdated(change),
                ChangeKind::Delete => OutboundMessage::AnimalDeleted(change),
            };
            self.connections.emit_to_entity(animal_id, &message);
        }
    }
}
