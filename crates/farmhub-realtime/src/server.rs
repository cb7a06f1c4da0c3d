//! Top-level real-time engine that ties together all subsystems.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use farmhub_auth::JwtDecoder;
use farmhub_core::config::realtime::RealtimeConfig;
use farmhub_service::NotificationService;

use crate::bridge::event_bridge::EventBridge;
use crate::channel::registry::ChannelRegistry;
use crate::connection::authenticator::WsAuthenticator;
use crate::connection::manager::ConnectionManager;
use crate::ws;

/// Central real-time engine that coordinates all WebSocket subsystems.
///
/// Explicitly constructed and dependency-injected — no global state, so
/// tests can run engines in parallel.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Connection manager (the registry).
    pub connections: Arc<ConnectionManager>,
    /// Channel registry.
    pub channels: Arc<ChannelRegistry>,
    /// Notification service owning the in-memory store.
    pub notifications: Arc<NotificationService>,
    /// Domain event bridge.
    pub bridge: Arc<EventBridge>,
    /// Handshake authenticator.
    pub authenticator: WsAuthenticator,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine").finish()
    }
}

impl RealtimeEngine {
    /// Creates a new real-time engine with all subsystems.
    pub fn new(config: &RealtimeConfig, decoder: Arc<JwtDecoder>) -> Self {
        let channels = Arc::new(ChannelRegistry::new());
        let connections = Arc::new(ConnectionManager::new(config.clone(), channels.clone()));
        let notifications = Arc::new(NotificationService::new(&config.store));
        let bridge = Arc::new(EventBridge::new(connections.clone(), notifications.clone()));
        let authenticator = WsAuthenticator::new(decoder);

        info!("Real-time engine initialized");

        Self {
            connections,
            channels,
            notifications,
            bridge,
            authenticator,
        }
    }

    /// Builds the axum router exposing the WebSocket endpoint.
    pub fn router(self: &Arc<Self>) -> Router {
        Router::new()
            .route("/ws", get(ws::ws_handler))
            .with_state(self.clone())
    }

    /// Shuts the engine down, closing every connection.
    pub fn shutdown(&self) {
        info!("Shutting down real-time engine");
        self.connections.close_all();
    }
}
