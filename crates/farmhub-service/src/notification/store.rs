//! In-memory notification store with TTL-based pruning.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use tracing::{debug, warn};

use farmhub_core::config::realtime::NotificationStoreConfig;
use farmhub_core::types::id::FarmId;
use farmhub_entity::Notification;

/// A stored notification tagged with its insertion sequence.
#[derive(Debug, Clone)]
struct StoredEntry {
    /// The notification record.
    notification: Notification,
    /// Monotonic insertion sequence, used to break timestamp ties.
    seq: u64,
}

/// Thread-safe in-memory collection of notification records.
///
/// Owned exclusively by [`super::service::NotificationService`]; nothing
/// else mutates it. Writes are atomic per key (last write to an id wins).
/// Expired entries are removed opportunistically on every insert; a hard
/// capacity cap bounds memory when no writes arrive for long stretches.
#[derive(Debug)]
pub struct NotificationStore {
    /// Notification id → entry.
    entries: DashMap<String, StoredEntry>,
    /// Monotonic counter for insertion order and id disambiguation.
    seq: AtomicU64,
    /// Hard cap on stored entries across all farms.
    max_entries: usize,
}

impl NotificationStore {
    /// Creates a new empty store.
    pub fn new(config: &NotificationStoreConfig) -> Self {
        Self {
            entries: DashMap::new(),
            seq: AtomicU64::new(0),
            max_entries: config.max_entries,
        }
    }

    /// Allocates the next monotonic sequence number.
    ///
    /// The same counter feeds notification id generation, so two events in
    /// the same millisecond still get distinct ids.
    pub fn allocate_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Inserts a notification under the given sequence number.
    ///
    /// Runs the opportunistic prune first (all expired entries across all
    /// farms are removed), then enforces the capacity cap by evicting the
    /// oldest entries.
    pub fn insert(&self, notification: Notification, seq: u64) {
        self.prune_expired();

        while self.entries.len() >= self.max_entries {
            if !self.evict_oldest() {
                break;
            }
        }

        self.entries
            .insert(notification.id.clone(), StoredEntry { notification, seq });
    }

    /// Removes every entry whose expiry has passed. Returns how many were
    /// removed.
    pub fn prune_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| !entry.notification.is_expired_at(now));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(removed, "Pruned expired notifications");
        }
        removed
    }

    /// Evicts the single oldest entry by insertion order. Returns whether
    /// anything was evicted.
    fn evict_oldest(&self) -> bool {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().seq)
            .map(|entry| entry.key().clone());

        match oldest {
            Some(id) => {
                warn!(id = %id, "Store at capacity, evicting oldest notification");
                self.entries.remove(&id).is_some()
            }
            None => false,
        }
    }

    /// Returns notifications for a farm, newest first.
    ///
    /// Sorted by timestamp descending; entries created in the same
    /// millisecond are ordered later-insertion-first.
    pub fn list_for_farm(&self, farm_id: FarmId, limit: Option<usize>) -> Vec<Notification> {
        let mut matching: Vec<StoredEntry> = self
            .entries
            .iter()
            .filter(|entry| entry.value().notification.farm_id == farm_id)
            .map(|entry| entry.value().clone())
            .collect();

        matching.sort_by(|a, b| {
            b.notification
                .timestamp
                .cmp(&a.notification.timestamp)
                .then(b.seq.cmp(&a.seq))
        });

        if let Some(limit) = limit {
            matching.truncate(limit);
        }

        matching.into_iter().map(|e| e.notification).collect()
    }

    /// Sets the read flag on a notification.
    ///
    /// Returns `false` when the id is unknown; re-marking an already read
    /// notification is a no-op that still returns `true`.
    pub fn mark_read(&self, id: &str) -> bool {
        match self.entries.get_mut(id) {
            Some(mut entry) => {
                entry.notification.mark_read();
                true
            }
            None => false,
        }
    }

    /// Removes a notification. Returns `false` when the id is unknown.
    pub fn clear(&self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    /// Counts unread notifications for a farm.
    pub fn unread_count(&self, farm_id: FarmId) -> usize {
        self.entries
            .iter()
            .filter(|entry| {
                let n = &entry.value().notification;
                n.farm_id == farm_id && n.is_unread()
            })
            .count()
    }

    /// Total number of stored entries across all farms.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
