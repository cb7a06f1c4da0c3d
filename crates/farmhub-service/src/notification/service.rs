//! Notification construction and store management.

use chrono::Utc;
use serde_json::{Map, Value, json};
use tracing::debug;

use farmhub_core::config::realtime::NotificationStoreConfig;
use farmhub_core::events::{
    AnimalHealthChange, BreedingEvent, FarmEvent, FeedExpiring, FeedStockLow, SystemAlert,
    VeterinaryReminder,
};
use farmhub_core::types::id::FarmId;
use farmhub_entity::{EntityKind, Notification, NotificationKind};

use super::rules;
use super::store::NotificationStore;

/// Converts farm domain events into notification records.
///
/// Owns the [`NotificationStore`] exclusively. Severity and urgency are
/// derived here, never accepted from callers; fan-out to connected
/// clients is the realtime engine's concern.
#[derive(Debug)]
pub struct NotificationService {
    /// The in-memory store.
    store: NotificationStore,
}

impl NotificationService {
    /// Creates a new service with an empty store.
    pub fn new(config: &NotificationStoreConfig) -> Self {
        Self {
            store: NotificationStore::new(config),
        }
    }

    /// Builds a notification from a domain event and inserts it.
    ///
    /// Every call also prunes expired entries across all farms (the store
    /// does this on insert). Returns the created record so the caller can
    /// fan it out.
    pub fn record(&self, event: &FarmEvent) -> Notification {
        let (notification, seq) = self.build(event);
        self.store.insert(notification.clone(), seq);

        debug!(
            id = %notification.id,
            kind = %notification.kind,
            farm_id = %notification.farm_id,
            severity = %notification.severity,
            "Notification recorded"
        );

        notification
    }

    /// Returns notifications for a farm, newest first.
    pub fn list_for_farm(&self, farm_id: FarmId, limit: Option<usize>) -> Vec<Notification> {
        self.store.list_for_farm(farm_id, limit)
    }

    /// Sets the read flag. Returns `false` when the id is unknown.
    pub fn mark_read(&self, id: &str) -> bool {
        self.store.mark_read(id)
    }

    /// Removes a notification. Returns `false` when the id is unknown.
    pub fn clear(&self, id: &str) -> bool {
        self.store.clear(id)
    }

    /// Counts unread notifications for a farm.
    pub fn unread_count(&self, farm_id: FarmId) -> usize {
        self.store.unread_count(farm_id)
    }

    /// Builds (but does not insert) the notification for an event,
    /// returning it together with its insertion sequence.
    fn build(&self, event: &FarmEvent) -> (Notification, u64) {
        match event {
            FarmEvent::AnimalHealth(e) => self.build_health(e),
            FarmEvent::FeedStockLow(e) => self.build_feed_stock(e),
            FarmEvent::FeedExpiring(e) => self.build_feed_expiry(e),
            FarmEvent::VeterinaryReminder(e) => self.build_veterinary(e),
            FarmEvent::Breeding(e) => self.build_breeding(e),
            FarmEvent::SystemAlert(e) => self.build_system(e),
        }
    }

    fn build_health(&self, e: &AnimalHealthChange) -> (Notification, u64) {
        let now = Utc::now();
        let derived = rules::health_change(e.current);
        let seq = self.store.allocate_seq();

        let notification = Notification {
            id: Notification::make_id(NotificationKind::AnimalHealth, e.animal_id.into_uuid(), now, seq),
            kind: NotificationKind::AnimalHealth,
            title: format!("Health update: {}", e.tag),
            message: format!(
                "{} changed from {} to {}",
                e.tag, e.previous, e.current
            ),
            severity: derived.severity,
            farm_id: e.farm_id,
            entity_id: Some(e.animal_id.into_uuid()),
            entity_type: Some(EntityKind::Animal),
            action_required: derived.action_required,
            action_url: Some(format!("/animals/{}", e.animal_id)),
            metadata: metadata(json!({
                "previousStatus": e.previous,
                "newStatus": e.current,
            })),
            timestamp: now,
            expires_at: Some(rules::health_expiry(now)),
        };
        (notification, seq)
    }

    fn build_feed_stock(&self, e: &FeedStockLow) -> (Notification, u64) {
        let now = Utc::now();
        let derived = rules::feed_stock(e.current_stock, e.reorder_point);
        let seq = self.store.allocate_seq();

        let notification = Notification {
            id: Notification::make_id(NotificationKind::FeedAlert, e.feed_id.into_uuid(), now, seq),
            kind: NotificationKind::FeedAlert,
            title: format!("Low feed stock: {}", e.name),
            message: format!(
                "{} is down to {} {} (reorder point {} {})",
                e.name, e.current_stock, e.unit, e.reorder_point, e.unit
            ),
            severity: derived.severity,
            farm_id: e.farm_id,
            entity_id: Some(e.feed_id.into_uuid()),
            entity_type: Some(EntityKind::Feed),
            action_required: derived.action_required,
            action_url: Some(format!("/feed/{}", e.feed_id)),
            metadata: metadata(json!({
                "currentStock": e.current_stock,
                "reorderPoint": e.reorder_point,
                "unit": e.unit,
            })),
            timestamp: now,
            expires_at: Some(rules::feed_stock_expiry(now)),
        };
        (notification, seq)
    }

    fn build_feed_expiry(&self, e: &FeedExpiring) -> (Notification, u64) {
        let now = Utc::now();
        let derived = rules::feed_expiry(e.days_until_expiry);
        let seq = self.store.allocate_seq();

        let notification = Notification {
            id: Notification::make_id(NotificationKind::FeedAlert, e.feed_id.into_uuid(), now, seq),
            kind: NotificationKind::FeedAlert,
            title: format!("Feed expiring: {}", e.name),
            message: format!(
                "{} expires in {} days",
                e.name, e.days_until_expiry
            ),
            severity: derived.severity,
            farm_id: e.farm_id,
            entity_id: Some(e.feed_id.into_uuid()),
            entity_type: Some(EntityKind::Feed),
            action_required: derived.action_required,
            action_url: Some(format!("/feed/{}", e.feed_id)),
            metadata: metadata(json!({
                "daysUntilExpiry": e.days_until_expiry,
                "expiresAt": e.expires_at,
            })),
            timestamp: now,
            // Time-bound alert: the notification dies with the feed batch.
            expires_at: Some(e.expires_at),
        };
        (notification, seq)
    }

    fn build_veterinary(&self, e: &VeterinaryReminder) -> (Notification, u64) {
        let now = Utc::now();
        let derived = rules::veterinary(e.hours_until);
        let seq = self.store.allocate_seq();

        let notification = Notification {
            id: Notification::make_id(
                NotificationKind::VeterinaryReminder,
                e.record_id.into_uuid(),
                now,
                seq,
            ),
            kind: NotificationKind::VeterinaryReminder,
            title: "Veterinary appointment".to_string(),
            message: format!(
                "{} scheduled for {}",
                e.description,
                e.scheduled_at.format("%Y-%m-%d %H:%M")
            ),
            severity: derived.severity,
            farm_id: e.farm_id,
            entity_id: Some(e.record_id.into_uuid()),
            entity_type: Some(EntityKind::Veterinary),
            action_required: derived.action_required,
            action_url: Some(format!("/veterinary/{}", e.record_id)),
            metadata: metadata(json!({
                "animalId": e.animal_id,
                "scheduledAt": e.scheduled_at,
                "hoursUntil": e.hours_until,
            })),
            timestamp: now,
            // Time-bound alert: irrelevant once the appointment has passed.
            expires_at: Some(e.scheduled_at),
        };
        (notification, seq)
    }

    fn build_breeding(&self, e: &BreedingEvent) -> (Notification, u64) {
        let now = Utc::now();
        let derived = rules::breeding(e.kind);
        let seq = self.store.allocate_seq();

        let notification = Notification {
            id: Notification::make_id(
                NotificationKind::BreedingUpdate,
                e.record_id.into_uuid(),
                now,
                seq,
            ),
            kind: NotificationKind::BreedingUpdate,
            title: "Breeding update".to_string(),
            message: match &e.notes {
                Some(notes) => format!("{}: {}", breeding_label(e.kind), notes),
                None => breeding_label(e.kind).to_string(),
            },
            severity: derived.severity,
            farm_id: e.farm_id,
            entity_id: Some(e.record_id.into_uuid()),
            entity_type: Some(EntityKind::Breeding),
            action_required: derived.action_required,
            action_url: Some(format!("/breeding/{}", e.record_id)),
            metadata: metadata(json!({
                "animalId": e.animal_id,
                "event": e.kind,
            })),
            timestamp: now,
            expires_at: Some(rules::breeding_expiry(now)),
        };
        (notification, seq)
    }

    fn build_system(&self, e: &SystemAlert) -> (Notification, u64) {
        let now = Utc::now();
        let derived = rules::system(e.severity);
        let seq = self.store.allocate_seq();

        let notification = Notification {
            id: Notification::make_id(NotificationKind::SystemAlert, e.farm_id.into_uuid(), now, seq),
            kind: NotificationKind::SystemAlert,
            title: e.title.clone(),
            message: e.message.clone(),
            severity: derived.severity,
            farm_id: e.farm_id,
            entity_id: None,
            entity_type: None,
            action_required: derived.action_required,
            action_url: e.action_url.clone(),
            metadata: Map::new(),
            timestamp: now,
            expires_at: Some(rules::system_expiry(now)),
        };
        (notification, seq)
    }
}

/// Human-readable label for a breeding event kind.
fn breeding_label(kind: farmhub_core::events::BreedingEventKind) -> &'static str {
    use farmhub_core::events::BreedingEventKind::*;
    match kind {
        HeatDetected => "Heat cycle detected",
        InseminationPerformed => "Insemination performed",
        PregnancyConfirmed => "Pregnancy confirmed",
        BirthExpected => "Birth expected soon",
        BirthOccurred => "Birth occurred",
        WeaningDue => "Weaning due",
    }
}

/// Wraps a JSON object value into the metadata map.
fn metadata(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use farmhub_core::events::{BreedingEventKind, HealthStatus};
    use farmhub_core::types::id::{AnimalId, BreedingRecordId, FeedId, VeterinaryRecordId};
    use farmhub_entity::Severity;

    fn service() -> NotificationService {
        NotificationService::new(&NotificationStoreConfig { max_entries: 1000 })
    }

    fn health_event(farm_id: FarmId, current: HealthStatus) -> FarmEvent {
        FarmEvent::AnimalHealth(AnimalHealthChange {
            farm_id,
            animal_id: AnimalId::new(),
            tag: "B-107".to_string(),
            previous: HealthStatus::Healthy,
            current,
        })
    }

    #[test]
    fn test_record_health_event() {
        let svc = service();
        let farm = FarmId::new();

        let n = svc.record(&health_event(farm, HealthStatus::Sick));
        assert_eq!(n.kind, NotificationKind::AnimalHealth);
        assert_eq!(n.severity, Severity::High);
        assert!(n.action_required);
        assert_eq!(n.entity_type, Some(EntityKind::Animal));
        assert!(n.id.starts_with("health_"));
        assert!(n.expires_at.is_some());

        assert_eq!(svc.list_for_farm(farm, None).len(), 1);
        assert_eq!(svc.unread_count(farm), 1);
    }

    #[test]
    fn test_record_ids_unique_for_rapid_events() {
        let svc = service();
        let farm = FarmId::new();

        let a = svc.record(&health_event(farm, HealthStatus::Sick));
        let b = svc.record(&health_event(farm, HealthStatus::Sick));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_feed_expiry_uses_literal_expiry_instant() {
        let svc = service();
        let farm = FarmId::new();
        let expires_at = Utc::now() + Duration::days(2);

        let n = svc.record(&FarmEvent::FeedExpiring(FeedExpiring {
            farm_id: farm,
            feed_id: FeedId::new(),
            name: "Silage".to_string(),
            expires_at,
            days_until_expiry: 2,
        }));
        assert_eq!(n.expires_at, Some(expires_at));
        assert_eq!(n.severity, Severity::High);
        assert!(n.action_required);
    }

    #[test]
    fn test_veterinary_expiry_is_appointment_time() {
        let svc = service();
        let farm = FarmId::new();
        let scheduled_at = Utc::now() + Duration::hours(48);

        let n = svc.record(&FarmEvent::VeterinaryReminder(VeterinaryReminder {
            farm_id: farm,
            record_id: VeterinaryRecordId::new(),
            animal_id: AnimalId::new(),
            description: "Vaccination".to_string(),
            scheduled_at,
            hours_until: 48.0,
        }));
        assert_eq!(n.expires_at, Some(scheduled_at));
        assert_eq!(n.severity, Severity::Low);
        assert!(!n.action_required);
    }

    #[test]
    fn test_breeding_severity_and_kind() {
        let svc = service();
        let farm = FarmId::new();

        let n = svc.record(&FarmEvent::Breeding(BreedingEvent {
            farm_id: farm,
            record_id: BreedingRecordId::new(),
            animal_id: AnimalId::new(),
            kind: BreedingEventKind::BirthExpected,
            notes: None,
        }));
        assert_eq!(n.kind, NotificationKind::BreedingUpdate);
        assert_eq!(n.severity, Severity::High);
        assert!(n.action_required);
        assert!(n.id.starts_with("breeding_"));
    }

    #[test]
    fn test_mark_read_and_clear_sentinels() {
        let svc = service();
        let farm = FarmId::new();
        let n = svc.record(&health_event(farm, HealthStatus::Monitoring));

        assert!(svc.mark_read(&n.id));
        assert!(svc.mark_read(&n.id));
        assert!(!svc.mark_read("nope"));
        assert_eq!(svc.unread_count(farm), 0);

        assert!(svc.clear(&n.id));
        assert!(!svc.clear(&n.id));
        assert!(svc.list_for_farm(farm, None).is_empty());
    }
}
