//! Shared test doubles: a scriptable connector and an in-memory API.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Map;
use tokio::sync::mpsc;
use uuid::Uuid;

use farmhub_client::api::NotificationApi;
use farmhub_client::connector::{Connector, WireConnection};
use farmhub_core::error::AppError;
use farmhub_core::result::AppResult;
use farmhub_core::types::id::FarmId;
use farmhub_core::types::pagination::{PageRequest, PageResponse};
use farmhub_entity::{Notification, NotificationKind, Severity};

/// The far (server) end of a mock connection.
pub struct MockSession {
    /// Frames pushed here arrive at the client as inbound frames.
    pub to_client: mpsc::Sender<String>,
    /// Frames the client sent.
    pub from_client: mpsc::Receiver<String>,
}

/// Connector double: counts attempts, can be switched between failing and
/// succeeding, and hands the server end of each session to the test.
pub struct MockConnector {
    sessions: mpsc::Sender<MockSession>,
    attempts: AtomicU32,
    failing: AtomicBool,
}

impl MockConnector {
    /// Creates a connector and the receiver yielding each new session.
    pub fn new(failing: bool) -> (Arc<Self>, mpsc::Receiver<MockSession>) {
        let (tx, rx) = mpsc::channel(8);
        (
            Arc::new(Self {
                sessions: tx,
                attempts: AtomicU32::new(0),
                failing: AtomicBool::new(failing),
            }),
            rx,
        )
    }

    /// Total connection attempts made so far.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Switches between refusing and accepting connections.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, _url: &str) -> AppResult<WireConnection> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::transport("connection refused"));
        }

        let (outbound_tx, outbound_rx) = mpsc::channel(16);
        let (inbound_tx, inbound_rx) = mpsc::channel(16);
        let _ = self.sessions.try_send(MockSession {
            to_client: inbound_tx,
            from_client: outbound_rx,
        });

        Ok(WireConnection {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}

/// Builds a notification record for tests.
pub fn notification(farm_id: FarmId, read: bool) -> Notification {
    let now = Utc::now();
    let mut metadata = Map::new();
    if read {
        metadata.insert("read".to_string(), serde_json::Value::Bool(true));
    }
    Notification {
        id: Notification::make_id(NotificationKind::SystemAlert, Uuid::new_v4(), now, rand::random()),
        kind: NotificationKind::SystemAlert,
        title: "Alert".to_string(),
        message: "Test".to_string(),
        severity: Severity::Medium,
        farm_id,
        entity_id: None,
        entity_type: None,
        action_required: false,
        action_url: None,
        metadata,
        timestamp: now,
        expires_at: None,
    }
}

/// In-memory [`NotificationApi`] recording every mutation call.
#[derive(Default)]
pub struct MockApi {
    /// Backing collection, newest first.
    pub notifications: Mutex<Vec<Notification>>,
    /// Ids passed to `mark_read`.
    pub read_calls: Mutex<Vec<String>>,
    /// Ids passed to `delete`.
    pub delete_calls: Mutex<Vec<String>>,
}

impl MockApi {
    pub fn with_notifications(notifications: Vec<Notification>) -> Arc<Self> {
        Arc::new(Self {
            notifications: Mutex::new(notifications),
            ..Self::default()
        })
    }
}

#[async_trait]
impl NotificationApi for MockApi {
    async fn fetch_page(&self, page: PageRequest) -> AppResult<PageResponse<Notification>> {
        let all = self.notifications.lock().unwrap().clone();
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok(PageResponse::new(items, page.page, page.page_size, total))
    }

    async fn unread_count(&self) -> AppResult<u64> {
        Ok(self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.is_unread())
            .count() as u64)
    }

    async fn mark_read(&self, id: &str) -> AppResult<bool> {
        self.read_calls.lock().unwrap().push(id.to_string());
        let mut all = self.notifications.lock().unwrap();
        match all.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.mark_read();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        self.delete_calls.lock().unwrap().push(id.to_string());
        let mut all = self.notifications.lock().unwrap();
        let before = all.len();
        all.retain(|n| n.id != id);
        Ok(all.len() < before)
    }
}
