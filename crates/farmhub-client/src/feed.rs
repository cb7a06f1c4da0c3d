//! Live notification feed: one reconciled view over the paginated REST
//! snapshot and the pushed events.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{debug, warn};

use farmhub_core::result::AppResult;
use farmhub_core::types::pagination::{PageRequest, PageResponse};
use farmhub_entity::Notification;

use crate::api::NotificationApi;
use crate::bus::HandlerId;
use crate::transport::{
    ClientTransport, EVENT_CONNECT, EVENT_DISCONNECT, EVENT_RECONNECT_FAILED,
};

/// Wire event carrying a freshly recorded notification.
const EVENT_NOTIFICATION_NEW: &str = "notification:new";

/// Pagination position of the last REST snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    /// Current page (1-based).
    pub page: u64,
    /// Page size.
    pub page_size: u64,
    /// Total items across all pages.
    pub total_items: u64,
    /// Total pages.
    pub total_pages: u64,
}

/// Observable feed state, exposed to the UI layer.
#[derive(Debug, Clone, Default)]
pub struct FeedState {
    /// Notifications, newest first.
    pub notifications: Vec<Notification>,
    /// Unread counter.
    pub unread_count: u64,
    /// Pagination of the last snapshot, once one was fetched.
    pub pagination: Option<PageInfo>,
    /// Mirror of the transport's connected state.
    pub is_connected: bool,
}

/// Merges a paged REST snapshot with live pushes into one state.
///
/// Mounting registers bus handlers (and optionally auto-connects);
/// [`close`] removes every handler and disconnects, so nothing leaks
/// across unmounts.
///
/// [`close`]: NotificationFeed::close
pub struct NotificationFeed {
    /// REST collaborator.
    api: Arc<dyn NotificationApi>,
    /// Realtime transport.
    transport: Arc<ClientTransport>,
    /// Shared observable state.
    state: Arc<Mutex<FeedState>>,
    /// Registered bus handlers, removed on close.
    handlers: Vec<(&'static str, HandlerId)>,
}

impl std::fmt::Debug for NotificationFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationFeed").finish()
    }
}

impl NotificationFeed {
    /// Mounts the feed: registers push handlers, optionally connects the
    /// transport, and fetches the initial snapshot.
    pub async fn mount(
        api: Arc<dyn NotificationApi>,
        transport: Arc<ClientTransport>,
        auto_connect: bool,
    ) -> AppResult<Self> {
        let state = Arc::new(Mutex::new(FeedState::default()));
        let mut handlers = Vec::new();

        let push_state = state.clone();
        handlers.push((
            EVENT_NOTIFICATION_NEW,
            transport.on(EVENT_NOTIFICATION_NEW, move |payload| {
                on_push(&push_state, payload);
            }),
        ));

        let connect_state = state.clone();
        handlers.push((
            EVENT_CONNECT,
            transport.on(EVENT_CONNECT, move |_| {
                lock(&connect_state).is_connected = true;
            }),
        ));

        let disconnect_state = state.clone();
        handlers.push((
            EVENT_DISCONNECT,
            transport.on(EVENT_DISCONNECT, move |_| {
                lock(&disconnect_state).is_connected = false;
            }),
        ));

        let failed_state = state.clone();
        handlers.push((
            EVENT_RECONNECT_FAILED,
            transport.on(EVENT_RECONNECT_FAILED, move |_| {
                // Real-time updates are unavailable, but the REST-backed
                // list keeps working.
                lock(&failed_state).is_connected = false;
            }),
        ));

        if auto_connect {
            transport.connect();
        }

        let feed = Self {
            api,
            transport,
            state,
            handlers,
        };
        feed.refresh().await?;
        Ok(feed)
    }

    /// Re-fetches the REST snapshot, replacing the list, counter, and
    /// pagination.
    pub async fn refresh(&self) -> AppResult<()> {
        self.fetch_page(PageRequest::default()).await
    }

    /// Fetches a specific page of the REST snapshot.
    pub async fn fetch_page(&self, page: PageRequest) -> AppResult<()> {
        let response: PageResponse<Notification> = self.api.fetch_page(page).await?;
        let unread = self.api.unread_count().await?;

        let mut state = lock(&self.state);
        state.pagination = Some(PageInfo {
            page: response.page,
            page_size: response.page_size,
            total_items: response.total_items,
            total_pages: response.total_pages,
        });
        state.notifications = response.items;
        state.unread_count = unread;
        Ok(())
    }

    /// Marks a notification as read: the local state first, then the
    /// remote call.
    pub async fn mark_as_read(&self, id: &str) -> AppResult<()> {
        {
            let mut state = lock(&self.state);
            if let Some(n) = state.notifications.iter_mut().find(|n| n.id == id) {
                if n.is_unread() {
                    n.mark_read();
                    state.unread_count = state.unread_count.saturating_sub(1);
                }
            }
        }

        self.api.mark_read(id).await.map(|known| {
            if !known {
                debug!(id, "Remote mark-read: id unknown");
            }
        })
    }

    /// Deletes a notification: removed locally first, then remotely.
    ///
    /// Deleting an unread item decrements the counter exactly once.
    pub async fn delete_notification(&self, id: &str) -> AppResult<()> {
        {
            let mut state = lock(&self.state);
            if let Some(index) = state.notifications.iter().position(|n| n.id == id) {
                let removed = state.notifications.remove(index);
                if removed.is_unread() {
                    state.unread_count = state.unread_count.saturating_sub(1);
                }
            }
        }

        self.api.delete(id).await.map(|known| {
            if !known {
                debug!(id, "Remote delete: id unknown");
            }
        })
    }

    /// Clones the current state for rendering.
    pub fn snapshot(&self) -> FeedState {
        lock(&self.state).clone()
    }

    /// Unmounts the feed: removes every registered handler and
    /// disconnects the transport.
    pub fn close(&self) {
        for (event, id) in &self.handlers {
            self.transport.off(event, *id);
        }
        self.transport.disconnect();
    }
}

/// Applies a pushed `notification:new` payload to the state.
fn on_push(state: &Arc<Mutex<FeedState>>, payload: &Value) {
    let notification: Notification = match serde_json::from_value(payload.clone()) {
        Ok(n) => n,
        Err(e) => {
            warn!(error = %e, "Dropping malformed notification push");
            return;
        }
    };

    let mut state = lock(state);

    // A push can race the snapshot fetch; never double-count an id.
    if state.notifications.iter().any(|n| n.id == notification.id) {
        return;
    }

    if notification.is_unread() {
        state.unread_count += 1;
    }
    state.notifications.insert(0, notification);
}

fn lock(state: &Arc<Mutex<FeedState>>) -> std::sync::MutexGuard<'_, FeedState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}
