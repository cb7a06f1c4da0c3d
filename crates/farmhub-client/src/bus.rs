//! Local publish/subscribe bus.
//!
//! Decouples application code from the transport library: every inbound
//! server event is re-emitted here under its wire name. Handlers are
//! addressed by the id returned from [`EventBus::on`], so removing one
//! never depends on function identity.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde_json::Value;

/// Identifier returned by [`EventBus::on`], used to unregister handlers.
pub type HandlerId = u64;

/// Boxed event handler.
type Handler = Arc<dyn Fn(&Value) + Send + Sync>;

/// Topic-keyed handler registry.
#[derive(Default)]
pub struct EventBus {
    /// Event name → registered handlers.
    handlers: DashMap<String, Vec<(HandlerId, Handler)>>,
    /// Next handler id.
    next_id: AtomicU64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("topics", &self.handlers.len())
            .finish()
    }
}

impl EventBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers a handler for an event name. Returns the id used to
    /// remove it later.
    pub fn on(&self, event: &str, handler: impl Fn(&Value) + Send + Sync + 'static) -> HandlerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers
            .entry(event.to_string())
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Removes one handler by id. Returns whether it was registered.
    pub fn off(&self, event: &str, id: HandlerId) -> bool {
        let Some(mut entry) = self.handlers.get_mut(event) else {
            return false;
        };
        let before = entry.len();
        entry.retain(|(handler_id, _)| *handler_id != id);
        entry.len() < before
    }

    /// Removes every handler for an event name.
    pub fn off_all(&self, event: &str) {
        self.handlers.remove(event);
    }

    /// Emits an event to every registered handler.
    pub fn emit(&self, event: &str, payload: &Value) {
        // Snapshot the handlers first so one of them can call on/off
        // without deadlocking the map.
        let snapshot: Vec<Handler> = self
            .handlers
            .get(event)
            .map(|entry| entry.iter().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default();

        for handler in snapshot {
            handler(payload);
        }
    }

    /// Number of handlers registered for an event.
    pub fn handler_count(&self, event: &str) -> usize {
        self.handlers.get(event).map(|e| e.len()).unwrap_or(0)
    }

    /// Removes every handler for every event.
    pub fn clear(&self) {
        self.handlers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_on_emit_off() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_clone = hits.clone();
        let id = bus.on("notification:new", move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit("notification:new", &Value::Null);
        bus.emit("other", &Value::Null);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        assert!(bus.off("notification:new", id));
        assert!(!bus.off("notification:new", id));
        bus.emit("notification:new", &Value::Null);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handlers_receive_payload() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(None));

        let seen_clone = seen.clone();
        bus.on("pong", move |payload| {
            *seen_clone.lock().unwrap() = Some(payload.clone());
        });

        bus.emit("pong", &serde_json::json!({"timestamp": 42}));
        let got = seen.lock().unwrap().clone().expect("payload delivered");
        assert_eq!(got["timestamp"], 42);
    }

    #[test]
    fn test_clear_removes_everything() {
        let bus = EventBus::new();
        bus.on("a", |_| {});
        bus.on("a", |_| {});
        bus.on("b", |_| {});
        assert_eq!(bus.handler_count("a"), 2);

        bus.clear();
        assert_eq!(bus.handler_count("a"), 0);
        assert_eq!(bus.handler_count("b"), 0);
    }

    #[test]
    fn test_handler_may_unregister_during_emit() {
        let bus = Arc::new(EventBus::new());
        let bus_clone = bus.clone();
        let id_cell = Arc::new(Mutex::new(0));

        let id_cell_clone = id_cell.clone();
        let id = bus.on("once", move |_| {
            bus_clone.off("once", *id_cell_clone.lock().unwrap());
        });
        *id_cell.lock().unwrap() = id;

        bus.emit("once", &Value::Null);
        assert_eq!(bus.handler_count("once"), 0);
    }
}
