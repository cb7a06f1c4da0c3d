//! Individual WebSocket connection handle.

use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use farmhub_core::types::id::{ConnectionId, FarmId, UserId};

/// A handle to a single WebSocket connection.
///
/// An explicit value type constructed at handshake time: holds the sender
/// half of the outbound queue plus metadata about the connected user and
/// the farm the connection is currently scoped to.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID.
    pub id: ConnectionId,
    /// User who owns this connection.
    pub user_id: UserId,
    /// Display name (cached for diagnostics).
    pub name: String,
    /// The farm this connection is currently scoped to — at most one at
    /// a time. Written only by the manager's join-farm path.
    farm: RwLock<Option<FarmId>>,
    /// Sender for serialized outbound frames.
    sender: mpsc::Sender<String>,
    /// When the connection was established.
    pub connected_at: DateTime<Utc>,
    /// Last inbound activity.
    last_seen: RwLock<DateTime<Utc>>,
    /// Whether the connection is still alive.
    alive: AtomicBool,
}

impl ConnectionHandle {
    /// Creates a new connection handle.
    pub fn new(user_id: UserId, name: String, sender: mpsc::Sender<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ConnectionId::new(),
            user_id,
            name,
            farm: RwLock::new(None),
            sender,
            connected_at: now,
            last_seen: RwLock::new(now),
            alive: AtomicBool::new(true),
        }
    }

    /// Queues a serialized frame for this connection.
    ///
    /// Fire-and-forget: a full buffer drops the frame, a closed receiver
    /// marks the connection dead. Returns whether the frame was queued.
    pub fn send(&self, frame: String) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.sender.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %self.id, "Send buffer full, dropping frame");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                false
            }
        }
    }

    /// Returns the farm this connection is currently scoped to.
    pub fn current_farm(&self) -> Option<FarmId> {
        *self.farm.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Updates the current farm scope.
    pub fn set_farm(&self, farm_id: Option<FarmId>) {
        *self.farm.write().unwrap_or_else(|e| e.into_inner()) = farm_id;
    }

    /// Checks if the connection is alive.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Marks the connection as dead.
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Updates the last-seen timestamp.
    pub fn touch(&self) {
        *self.last_seen.write().unwrap_or_else(|e| e.into_inner()) = Utc::now();
    }

    /// Returns the last inbound activity timestamp.
    pub fn last_seen(&self) -> DateTime<Utc> {
        *self.last_seen.read().unwrap_or_else(|e| e.into_inner())
    }
}
