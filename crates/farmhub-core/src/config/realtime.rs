//! Real-time engine configuration.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Per-connection outbound buffer size. Messages are dropped when the
    /// buffer is full (fan-out is fire-and-forget).
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Maximum entity subscriptions per connection.
    #[serde(default = "default_max_subscriptions")]
    pub max_subscriptions_per_connection: usize,
    /// Notification store settings.
    #[serde(default)]
    pub store: NotificationStoreConfig,
}

/// In-memory notification store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationStoreConfig {
    /// Hard cap on stored notifications across all farms. When the cap is
    /// reached, expired entries are pruned first, then the oldest entries
    /// are evicted.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: default_channel_buffer(),
            max_subscriptions_per_connection: default_max_subscriptions(),
            store: NotificationStoreConfig::default(),
        }
    }
}

impl Default for NotificationStoreConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
        }
    }
}

fn default_channel_buffer() -> usize {
    256
}

fn default_max_subscriptions() -> usize {
    50
}

fn default_max_entries() -> usize {
    10_000
}
