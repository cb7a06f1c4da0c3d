//! Inbound and outbound WebSocket message type definitions.
//!
//! Frames are adjacently tagged: `{"event": "...", "data": {...}}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use farmhub_core::events::RecordChange;
use farmhub_core::types::id::{AnimalId, FarmId};
use farmhub_entity::Notification;

/// Messages sent by the client to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum InboundMessage {
    /// Re-scope this connection to a different farm.
    #[serde(rename = "switch-farm", rename_all = "camelCase")]
    SwitchFarm {
        /// The farm to join.
        farm_id: FarmId,
    },
    /// Leave the current farm channel without joining another.
    #[serde(rename = "leave-farm", rename_all = "camelCase")]
    LeaveFarm {
        /// The farm to leave.
        farm_id: FarmId,
    },
    /// Start watching one specific animal.
    #[serde(rename = "subscribe-animal", rename_all = "camelCase")]
    SubscribeAnimal {
        /// The animal to watch.
        animal_id: AnimalId,
    },
    /// Stop watching an animal.
    #[serde(rename = "unsubscribe-animal", rename_all = "camelCase")]
    UnsubscribeAnimal {
        /// The animal to stop watching.
        animal_id: AnimalId,
    },
    /// Locally-originated animal health push, rebroadcast to the farm.
    #[serde(rename = "update-animal-health", rename_all = "camelCase")]
    UpdateAnimalHealth {
        /// The animal concerned.
        animal_id: AnimalId,
        /// The updated health fields.
        data: serde_json::Value,
    },
    /// Locally-originated animal location push, rebroadcast to the farm.
    #[serde(rename = "update-animal-location", rename_all = "camelCase")]
    UpdateAnimalLocation {
        /// The animal concerned.
        animal_id: AnimalId,
        /// The updated location fields.
        data: serde_json::Value,
    },
    /// Liveness probe; answered with `pong`.
    #[serde(rename = "ping")]
    Ping,
}

/// Messages sent by the server to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum OutboundMessage {
    /// A new notification was recorded for the connection's farm.
    #[serde(rename = "notification:new")]
    NotificationNew(Notification),
    /// A domain record changed (farm-wide CRUD broadcast).
    #[serde(rename = "data:update")]
    DataUpdate(RecordChange),
    /// A watched animal's health status changed.
    #[serde(rename = "animal:health-changed", rename_all = "camelCase")]
    AnimalHealthChanged {
        /// The animal concerned.
        animal_id: AnimalId,
        /// Status before the change.
        previous_status: String,
        /// Status after the change.
        new_status: String,
        /// The notification recorded for this change.
        notification_id: String,
        /// When the change happened.
        timestamp: DateTime<Utc>,
    },
    /// A watched animal record was created.
    #[serde(rename = "animal:create")]
    AnimalCreated(RecordChange),
    /// A watched animal record was updated.
    #[serde(rename = "animal:update")]
    AnimalUpdated(RecordChange),
    /// A watched animal record was deleted.
    #[serde(rename = "animal:delete")]
    AnimalDeleted(RecordChange),
    /// Answer to a client `ping`.
    #[serde(rename = "pong")]
    Pong {
        /// Server time.
        timestamp: DateTime<Utc>,
    },
    /// In-band error report; the connection stays open.
    #[serde(rename = "error")]
    Error {
        /// Error code.
        code: String,
        /// Error description.
        message: String,
    },
}

impl OutboundMessage {
    /// The wire event name for this message.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::NotificationNew(_) => "notification:new",
            Self::DataUpdate(_) => "data:update",
            Self::AnimalHealthChanged { .. } => "animal:health-changed",
            Self::AnimalCreated(_) => "animal:create",
            Self::AnimalUpdated(_) => "animal:update",
            Self::AnimalDeleted(_) => "animal:delete",
            Self::Pong { .. } => "pong",
            Self::Error { .. } => "error",
        }
    }
}
