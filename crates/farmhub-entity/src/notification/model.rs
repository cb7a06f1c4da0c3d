//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use farmhub_core::types::id::FarmId;

use super::kind::{EntityKind, NotificationKind};
use super::Severity;

/// Metadata key carrying the read flag.
///
/// Read state is deliberately kept in the open metadata map rather than
/// as a first-class field: the record itself is immutable after creation
/// except for this flag.
pub const READ_KEY: &str = "read";

/// A fact asserted about a farm at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Unique identifier: `{prefix}_{entity id}_{unix millis}_{counter}`.
    pub id: String,
    /// Notification kind.
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Notification title.
    pub title: String,
    /// Notification body text.
    pub message: String,
    /// Derived severity level.
    pub severity: Severity,
    /// The owning farm; all reads are scoped by this.
    pub farm_id: FarmId,
    /// Back-reference to the originating entity, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<Uuid>,
    /// Kind of the originating entity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<EntityKind>,
    /// Whether the notification demands user action (derived).
    pub action_required: bool,
    /// Optional deep link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
    /// Open key/value map; carries the `read` flag.
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Expiry instant governing pruning, independent of read state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// Build the unique id for a notification.
    ///
    /// The monotonic counter disambiguates events created within the same
    /// millisecond.
    pub fn make_id(kind: NotificationKind, origin: Uuid, at: DateTime<Utc>, counter: u64) -> String {
        format!(
            "{}_{}_{}_{}",
            kind.id_prefix(),
            origin,
            at.timestamp_millis(),
            counter
        )
    }

    /// Whether the user has read this notification.
    pub fn is_read(&self) -> bool {
        self.metadata
            .get(READ_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Whether the notification is still unread.
    pub fn is_unread(&self) -> bool {
        !self.is_read()
    }

    /// Mark the notification as read.
    pub fn mark_read(&mut self) {
        self.metadata.insert(READ_KEY.to_string(), Value::Bool(true));
    }

    /// Whether the notification has expired as of `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|exp| exp <= now).unwrap_or(false)
    }

    /// Whether the notification has expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Notification {
        let now = Utc::now();
        Notification {
            id: Notification::make_id(NotificationKind::SystemAlert, Uuid::new_v4(), now, 1),
            kind: NotificationKind::SystemAlert,
            title: "Maintenance".to_string(),
            message: "Scheduled downtime tonight".to_string(),
            severity: Severity::Medium,
            farm_id: FarmId::new(),
            entity_id: None,
            entity_type: None,
            action_required: false,
            action_url: None,
            metadata: Map::new(),
            timestamp: now,
            expires_at: None,
        }
    }

    #[test]
    fn test_read_flag_lives_in_metadata() {
        let mut n = sample();
        assert!(n.is_unread());

        n.mark_read();
        assert!(n.is_read());
        assert_eq!(n.metadata.get(READ_KEY), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_ids_unique_within_same_millisecond() {
        let now = Utc::now();
        let origin = Uuid::new_v4();
        let a = Notification::make_id(NotificationKind::AnimalHealth, origin, now, 1);
        let b = Notification::make_id(NotificationKind::AnimalHealth, origin, now, 2);
        assert_ne!(a, b);
        assert!(a.starts_with("health_"));
    }

    #[test]
    fn test_expiry_check() {
        let mut n = sample();
        assert!(!n.is_expired());

        n.expires_at = Some(Utc::now() - chrono::Duration::seconds(1));
        assert!(n.is_expired());
    }

    #[test]
    fn test_wire_shape_is_camel_case() {
        let n = sample();
        let json = serde_json::to_value(&n).expect("serialize");
        assert!(json.get("farmId").is_some());
        assert!(json.get("actionRequired").is_some());
        assert_eq!(
            json.get("type").and_then(Value::as_str),
            Some("system_alert")
        );
    }
}
