//! Generic CRUD change events for non-notification broadcasts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::id::{FarmId, UserId};

/// Kind of record mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// A record was created.
    Create,
    /// A record was updated.
    Update,
    /// A record was deleted.
    Delete,
}

impl ChangeKind {
    /// String form matching the wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// A CRUD-style change to a domain record, broadcast to the owning farm
/// and optionally to entity subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordChange {
    /// What happened to the record.
    #[serde(rename = "type")]
    pub change: ChangeKind,
    /// The record's collection name ("animal", "crop", "task", ...).
    pub entity: String,
    /// The record's identifier.
    pub entity_id: Uuid,
    /// The owning farm.
    pub farm_id: FarmId,
    /// The changed record (or the changed fields).
    pub data: serde_json::Value,
    /// The user who made the change, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    /// When the change happened.
    pub timestamp: DateTime<Utc>,
}

impl RecordChange {
    /// Create a change event stamped with the current time.
    pub fn new(
        change: ChangeKind,
        entity: impl Into<String>,
        entity_id: Uuid,
        farm_id: FarmId,
        data: serde_json::Value,
        user_id: Option<UserId>,
    ) -> Self {
        Self {
            change,
            entity: entity.into(),
            entity_id,
            farm_id,
            data,
            user_id,
            timestamp: Utc::now(),
        }
    }
}
