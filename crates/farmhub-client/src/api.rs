//! REST collaborator surface consumed by the notification feed.
//!
//! The controllers themselves live in the backend application; the feed
//! only needs this trait. A reqwest-backed implementation is provided for
//! the production client.

use async_trait::async_trait;

use farmhub_core::error::AppError;
use farmhub_core::result::AppResult;
use farmhub_core::types::pagination::{PageRequest, PageResponse};
use farmhub_entity::Notification;

/// Paginated notification access plus the two mutations the feed needs.
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// Fetches one page of notifications, newest first.
    async fn fetch_page(&self, page: PageRequest) -> AppResult<PageResponse<Notification>>;

    /// Fetches the unread count.
    async fn unread_count(&self) -> AppResult<u64>;

    /// Marks one notification as read. Returns whether the id was known.
    async fn mark_read(&self, id: &str) -> AppResult<bool>;

    /// Deletes one notification. Returns whether the id was known.
    async fn delete(&self, id: &str) -> AppResult<bool>;
}

/// HTTP implementation of [`NotificationApi`].
#[derive(Debug, Clone)]
pub struct RestNotificationApi {
    /// Shared HTTP client.
    client: reqwest::Client,
    /// API base URL, e.g. `https://api.example.com/api`.
    base_url: String,
    /// Bearer token.
    token: String,
}

impl RestNotificationApi {
    /// Creates a new REST client.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl NotificationApi for RestNotificationApi {
    async fn fetch_page(&self, page: PageRequest) -> AppResult<PageResponse<Notification>> {
        self.client
            .get(self.url("/notifications"))
            .bearer_auth(&self.token)
            .query(&[("page", page.page), ("pageSize", page.page_size)])
            .send()
            .await
            .map_err(|e| AppError::transport(format!("Notification fetch failed: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::transport(format!("Notification fetch rejected: {e}")))?
            .json()
            .await
            .map_err(|e| AppError::transport(format!("Notification page decode failed: {e}")))
    }

    async fn unread_count(&self) -> AppResult<u64> {
        #[derive(serde::Deserialize)]
        struct CountBody {
            count: u64,
        }

        let body: CountBody = self
            .client
            .get(self.url("/notifications/unread-count"))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| AppError::transport(format!("Unread count fetch failed: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::transport(format!("Unread count rejected: {e}")))?
            .json()
            .await
            .map_err(|e| AppError::transport(format!("Unread count decode failed: {e}")))?;

        Ok(body.count)
    }

    async fn mark_read(&self, id: &str) -> AppResult<bool> {
        let response = self
            .client
            .patch(self.url(&format!("/notifications/{id}/read")))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| AppError::transport(format!("Mark-read failed: {e}")))?;

        Ok(response.status().is_success())
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let response = self
            .client
            .delete(self.url(&format!("/notifications/{id}")))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| AppError::transport(format!("Delete failed: {e}")))?;

        Ok(response.status().is_success())
    }
}
