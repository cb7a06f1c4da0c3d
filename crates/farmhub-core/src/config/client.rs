//! Client transport configuration.

use serde::{Deserialize, Serialize};

/// Client-side transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// WebSocket endpoint URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Reconnection behavior.
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

/// Bounded exponential backoff settings for reconnection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Maximum automatic reconnection attempts before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Initial delay before the first retry, in milliseconds.
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,
    /// Upper bound on the retry delay, in milliseconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

fn default_endpoint() -> String {
    "ws://localhost:8080/ws".to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_delay() -> u64 {
    1_000
}

fn default_max_delay() -> u64 {
    30_000
}
