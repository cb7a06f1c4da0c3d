//! Connection manager — the registry of connections, farm channels, and
//! entity subscriptions, plus the fan-out primitives.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use farmhub_core::config::realtime::RealtimeConfig;
use farmhub_core::types::id::{AnimalId, ConnectionId, FarmId, UserId};

use crate::channel::registry::ChannelRegistry;
use crate::channel::types::ChannelType;
use crate::message::types::{InboundMessage, OutboundMessage};

use super::authenticator::AuthenticatedConnection;
use super::handle::ConnectionHandle;
use super::pool::ConnectionPool;

/// Manages all active WebSocket connections.
///
/// Owns the membership maps exclusively. All fan-out primitives are pure
/// broadcasts: no acknowledgment, no retry, no ordering guarantee across
/// different primitives.
#[derive(Debug)]
pub struct ConnectionManager {
    /// Connection pool.
    pool: Arc<ConnectionPool>,
    /// Channel registry.
    channels: Arc<ChannelRegistry>,
    /// Configuration.
    config: RealtimeConfig,
}

impl ConnectionManager {
    /// Creates a new connection manager.
    pub fn new(config: RealtimeConfig, channels: Arc<ChannelRegistry>) -> Self {
        Self {
            pool: Arc::new(ConnectionPool::new()),
            channels,
            config,
        }
    }

    /// Registers a new authenticated connection.
    ///
    /// Subscribes the connection to its personal user channel and, when
    /// the handshake carried a farm scope, to that farm's channel.
    /// Returns the connection handle and the receiver for outbound frames.
    pub fn register(
        &self,
        auth: &AuthenticatedConnection,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(self.config.channel_buffer_size);

        let handle = Arc::new(ConnectionHandle::new(
            auth.user_id,
            auth.name.clone(),
            tx,
        ));

        self.pool.add(handle.clone());
        self.channels
            .subscribe(ChannelType::User(auth.user_id).to_channel_name(), handle.id);

        if let Some(farm_id) = auth.farm_id {
            self.join_farm(&handle.id, farm_id);
        }

        info!(
            conn_id = %handle.id,
            user_id = %auth.user_id,
            farm_id = ?auth.farm_id,
            "WebSocket connection registered"
        );

        (handle, rx)
    }

    /// Unregisters a connection and cleans up every membership it holds.
    ///
    /// Safe to call twice: disconnect can race with explicit teardown, and
    /// the second call finds nothing to remove.
    pub fn unregister(&self, conn_id: &ConnectionId) {
        if let Some(handle) = self.pool.remove(conn_id) {
            handle.mark_dead();
            self.channels.unsubscribe_all(*conn_id);

            info!(
                conn_id = %conn_id,
                user_id = %handle.user_id,
                "WebSocket connection unregistered"
            );
        }
    }

    /// Moves a connection to a farm channel.
    ///
    /// Idempotent. A connection belongs to at most one farm: joining a new
    /// farm first leaves the old one, keeping the forward and reverse
    /// membership views consistent.
    pub fn join_farm(&self, conn_id: &ConnectionId, farm_id: FarmId) {
        let Some(handle) = self.pool.get(conn_id) else {
            warn!(conn_id = %conn_id, "join_farm for unknown connection");
            return;
        };

        match handle.current_farm() {
            Some(current) if current == farm_id => return,
            Some(current) => {
                self.channels
                    .unsubscribe(&ChannelType::Farm(current).to_channel_name(), *conn_id);
            }
            None => {}
        }

        self.channels
            .subscribe(ChannelType::Farm(farm_id).to_channel_name(), *conn_id);
        handle.set_farm(Some(farm_id));

        debug!(conn_id = %conn_id, farm_id = %farm_id, "Joined farm channel");
    }

    /// Removes a connection from its farm channel without joining another.
    ///
    /// A no-op when the connection is not currently scoped to `farm_id`.
    pub fn leave_farm(&self, conn_id: &ConnectionId, farm_id: FarmId) {
        let Some(handle) = self.pool.get(conn_id) else {
            return;
        };

        if handle.current_farm() == Some(farm_id) {
            self.channels
                .unsubscribe(&ChannelType::Farm(farm_id).to_channel_name(), *conn_id);
            handle.set_farm(None);
            debug!(conn_id = %conn_id, farm_id = %farm_id, "Left farm channel");
        }
    }

    /// Subscribes a connection to one animal's events, independent of its
    /// farm membership.
    pub fn subscribe_entity(&self, conn_id: &ConnectionId, animal_id: AnimalId) {
        let Some(handle) = self.pool.get(conn_id) else {
            return;
        };

        if self.channels.subscription_count(*conn_id)
            >= self.config.max_subscriptions_per_connection
        {
            handle.send(
                serde_json::to_string(&OutboundMessage::Error {
                    code: "MAX_SUBSCRIPTIONS".to_string(),
                    message: format!(
                        "Maximum subscriptions ({}) reached",
                        self.config.max_subscriptions_per_connection
                    ),
                })
                .unwrap_or_default(),
            );
            return;
        }

        self.channels
            .subscribe(ChannelType::Animal(animal_id).to_channel_name(), *conn_id);
        debug!(conn_id = %conn_id, animal_id = %animal_id, "Subscribed to animal");
    }

    /// Removes a connection's subscription to one animal.
    pub fn unsubscribe_entity(&self, conn_id: &ConnectionId, animal_id: AnimalId) {
        self.channels
            .unsubscribe(&ChannelType::Animal(animal_id).to_channel_name(), *conn_id);
        debug!(conn_id = %conn_id, animal_id = %animal_id, "Unsubscribed from animal");
    }

    /// Processes an inbound frame from a client.
    ///
    /// Malformed payloads are logged and answered with an error frame;
    /// they never bring the connection (or the registry) down.
    pub fn handle_inbound(&self, conn_id: &ConnectionId, raw_frame: &str) {
        let Some(handle) = self.pool.get(conn_id) else {
            warn!(conn_id = %conn_id, "Frame from unknown connection");
            return;
        };

        handle.touch();

        let msg: InboundMessage = match serde_json::from_str(raw_frame) {
            Ok(m) => m,
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "Dropping malformed frame");
                handle.send(
                    serde_json::to_string(&OutboundMessage::Error {
                        code: "INVALID_MESSAGE".to_string(),
                        message: format!("Failed to parse message: {e}"),
                    })
                    .unwrap_or_default(),
                );
                return;
            }
        };

        match msg {
            InboundMessage::SwitchFarm { farm_id } => {
                self.join_farm(conn_id, farm_id);
            }
            InboundMessage::LeaveFarm { farm_id } => {
                self.leave_farm(conn_id, farm_id);
            }
            InboundMessage::SubscribeAnimal { animal_id } => {
                self.subscribe_entity(conn_id, animal_id);
            }
            InboundMessage::UnsubscribeAnimal { animal_id } => {
                self.unsubscribe_entity(conn_id, animal_id);
            }
            InboundMessage::UpdateAnimalHealth { animal_id, data }
            | InboundMessage::UpdateAnimalLocation { animal_id, data } => {
                self.rebroadcast_animal_update(&handle, animal_id, data);
            }
            InboundMessage::Ping => {
                handle.send(
                    serde_json::to_string(&OutboundMessage::Pong {
                        timestamp: chrono::Utc::now(),
                    })
                    .unwrap_or_default(),
                );
            }
        }
    }

    /// Rebroadcasts a locally-originated animal update to the sender's
    /// farm as a `data:update` event.
    ///
    /// Connections without a farm scope have no audience; the push is
    /// dropped.
    fn rebroadcast_animal_update(
        &self,
        handle: &ConnectionHandle,
        animal_id: AnimalId,
        data: serde_json::Value,
    ) {
        let Some(farm_id) = handle.current_farm() else {
            debug!(conn_id = %handle.id, "Animal update from farm-less connection dropped");
            return;
        };

        let change = farmhub_core::events::RecordChange::new(
            farmhub_core::events::ChangeKind::Update,
            "animal",
            animal_id.into_uuid(),
            farm_id,
            data,
            Some(handle.user_id),
        );
        self.emit_to_farm(farm_id, &OutboundMessage::DataUpdate(change));
    }

    /// Broadcasts a message to every connection in a farm channel.
    pub fn emit_to_farm(&self, farm_id: FarmId, message: &OutboundMessage) {
        self.emit_to_channel(&ChannelType::Farm(farm_id).to_channel_name(), message);
    }

    /// Broadcasts a message to every connection watching an animal.
    pub fn emit_to_entity(&self, animal_id: AnimalId, message: &OutboundMessage) {
        self.emit_to_channel(&ChannelType::Animal(animal_id).to_channel_name(), message);
    }

    /// Sends a message to all of a user's connections.
    pub fn emit_to_user(&self, user_id: UserId, message: &OutboundMessage) {
        let frame = match serde_json::to_string(message) {
            Ok(f) => f,
            Err(e) => {
                warn!(error = %e, "Failed to serialize outbound message");
                return;
            }
        };
        for conn in self.pool.get_user_connections(&user_id) {
            conn.send(frame.clone());
        }
    }

    /// Broadcasts a message to every connected client.
    pub fn emit_to_all(&self, message: &OutboundMessage) {
        let frame = match serde_json::to_string(message) {
            Ok(f) => f,
            Err(e) => {
                warn!(error = %e, "Failed to serialize outbound message");
                return;
            }
        };
        for conn in self.pool.all_connections() {
            conn.send(frame.clone());
        }
    }

    /// Serializes once and fans a message out to a channel's subscribers.
    fn emit_to_channel(&self, channel: &str, message: &OutboundMessage) {
        let subscriber_ids = self.channels.get_subscribers(channel);
        if subscriber_ids.is_empty() {
            return;
        }

        let frame = match serde_json::to_string(message) {
            Ok(f) => f,
            Err(e) => {
                warn!(error = %e, "Failed to serialize outbound message");
                return;
            }
        };

        let mut sent = 0usize;
        for conn_id in &subscriber_ids {
            if let Some(handle) = self.pool.get(conn_id) {
                if handle.send(frame.clone()) {
                    sent += 1;
                }
            }
        }

        debug!(
            channel = %channel,
            event = message.event_name(),
            sent,
            "Broadcast complete"
        );
    }

    /// Number of connections currently scoped to a farm.
    pub fn farm_connection_count(&self, farm_id: FarmId) -> usize {
        self.channels
            .channel_subscriber_count(&ChannelType::Farm(farm_id).to_channel_name())
    }

    /// Farms that currently have at least one connection.
    pub fn active_farms(&self) -> Vec<FarmId> {
        self.channels
            .channel_names()
            .iter()
            .filter_map(|name| match ChannelType::parse(name) {
                Some(ChannelType::Farm(farm_id)) => Some(farm_id),
                _ => None,
            })
            .collect()
    }

    /// Checks whether a user has at least one live connection.
    pub fn is_user_online(&self, user_id: &UserId) -> bool {
        !self.pool.get_user_connections(user_id).is_empty()
    }

    /// Returns the total connection count.
    pub fn connection_count(&self) -> usize {
        self.pool.connection_count()
    }

    /// Returns the number of unique connected users.
    pub fn user_count(&self) -> usize {
        self.pool.user_count()
    }

    /// Closes all connections (used during shutdown).
    pub fn close_all(&self) {
        let all = self.pool.all_connections();
        for conn in &all {
            conn.mark_dead();
            self.pool.remove(&conn.id);
            self.channels.unsubscribe_all(conn.id);
        }
        info!(count = all.len(), "All connections closed");
    }
}
