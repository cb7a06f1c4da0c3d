//! Client transport: one authenticated connection per session with
//! bounded-backoff reconnection and a local event bus.

use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use farmhub_core::config::client::ReconnectConfig;
use farmhub_core::types::id::{AnimalId, FarmId};

use crate::bus::{EventBus, HandlerId};
use crate::connector::Connector;

/// Bus event emitted when the connection is established.
pub const EVENT_CONNECT: &str = "connect";
/// Bus event emitted when the connection drops.
pub const EVENT_DISCONNECT: &str = "disconnect";
/// Terminal bus event emitted when reconnection attempts are exhausted.
pub const EVENT_RECONNECT_FAILED: &str = "reconnect:failed";

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection and none wanted.
    Disconnected,
    /// First connection attempt in flight.
    Connecting,
    /// Live connection.
    Connected,
    /// Connection lost; backoff retries in progress.
    Reconnecting,
    /// Retry budget exhausted; only an explicit `connect()` resumes.
    Failed,
}

/// Maintains one logical realtime connection per session.
///
/// Application code talks to the [`EventBus`], never to the socket
/// library. All outbound helpers are silent no-ops while not connected.
pub struct ClientTransport {
    /// WebSocket endpoint (without query parameters).
    endpoint: String,
    /// Bearer token presented at handshake time.
    token: String,
    /// Optional farm scope presented at handshake time.
    farm: Option<FarmId>,
    /// Backoff settings.
    reconnect: ReconnectConfig,
    /// Connection opener.
    connector: Arc<dyn Connector>,
    /// Local publish/subscribe bus.
    bus: Arc<EventBus>,
    /// Current lifecycle state.
    state: Arc<RwLock<ConnectionState>>,
    /// Sender half of the live connection, when there is one.
    outbound: Arc<Mutex<Option<mpsc::Sender<String>>>>,
    /// The driver task owning connect/reconnect scheduling.
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for ClientTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientTransport")
            .field("endpoint", &self.endpoint)
            .field("state", &self.state())
            .finish()
    }
}

impl ClientTransport {
    /// Creates a transport. No connection is opened until [`connect`].
    ///
    /// [`connect`]: ClientTransport::connect
    pub fn new(
        endpoint: impl Into<String>,
        token: impl Into<String>,
        farm: Option<FarmId>,
        reconnect: ReconnectConfig,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: token.into(),
            farm,
            reconnect,
            connector,
            bus: Arc::new(EventBus::new()),
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            outbound: Arc::new(Mutex::new(None)),
            driver: Mutex::new(None),
        }
    }

    /// Opens the connection and keeps it alive.
    ///
    /// Starting fresh resets the attempt counter and backoff delay, so an
    /// explicit call after `Failed` resumes reconnection. Calling while a
    /// driver is already running is a no-op.
    pub fn connect(&self) {
        let mut driver = self.driver.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = driver.as_ref() {
            if !handle.is_finished() {
                return;
            }
        }

        self.set_state(ConnectionState::Connecting);

        let url = self.handshake_url();
        let connector = self.connector.clone();
        let bus = self.bus.clone();
        let state = self.state.clone();
        let outbound = self.outbound.clone();
        let reconnect = self.reconnect.clone();

        *driver = Some(tokio::spawn(run_driver(
            url, connector, bus, state, outbound, reconnect,
        )));
    }

    /// Tears the connection down.
    ///
    /// Cancels the driver task (and with it any scheduled reconnect
    /// timer), clears every registered bus handler, and resets state so a
    /// subsequent [`connect`] starts clean.
    ///
    /// [`connect`]: ClientTransport::connect
    pub fn disconnect(&self) {
        if let Some(handle) = self
            .driver
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            handle.abort();
        }

        *self.outbound.lock().unwrap_or_else(|e| e.into_inner()) = None;
        self.bus.clear();
        self.set_state(ConnectionState::Disconnected);
        info!("Realtime transport disconnected");
    }

    /// Registers a bus handler. See [`EventBus::on`].
    pub fn on(&self, event: &str, handler: impl Fn(&Value) + Send + Sync + 'static) -> HandlerId {
        self.bus.on(event, handler)
    }

    /// Removes a bus handler by id. See [`EventBus::off`].
    pub fn off(&self, event: &str, id: HandlerId) -> bool {
        self.bus.off(event, id)
    }

    /// The local event bus.
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether a live connection exists right now.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Asks the server to scope this connection to a farm.
    pub fn join_farm_room(&self, farm_id: FarmId) {
        self.send_event("switch-farm", Some(json!({ "farmId": farm_id })));
    }

    /// Asks the server to drop this connection's farm scope.
    pub fn leave_farm_room(&self, farm_id: FarmId) {
        self.send_event("leave-farm", Some(json!({ "farmId": farm_id })));
    }

    /// Starts watching one animal's events.
    pub fn subscribe_to_animal(&self, animal_id: AnimalId) {
        self.send_event("subscribe-animal", Some(json!({ "animalId": animal_id })));
    }

    /// Stops watching an animal.
    pub fn unsubscribe_from_animal(&self, animal_id: AnimalId) {
        self.send_event("unsubscribe-animal", Some(json!({ "animalId": animal_id })));
    }

    /// Pushes a locally-originated health update.
    pub fn send_health_update(&self, animal_id: AnimalId, data: Value) {
        self.send_event(
            "update-animal-health",
            Some(json!({ "animalId": animal_id, "data": data })),
        );
    }

    /// Pushes a locally-originated location update.
    pub fn send_location_update(&self, animal_id: AnimalId, data: Value) {
        self.send_event(
            "update-animal-location",
            Some(json!({ "animalId": animal_id, "data": data })),
        );
    }

    /// Sends a liveness probe.
    pub fn ping(&self) {
        self.send_event("ping", None);
    }

    /// Queues a frame on the live connection; a no-op (never an error)
    /// while not connected.
    fn send_event(&self, event: &str, data: Option<Value>) -> bool {
        let guard = self.outbound.lock().unwrap_or_else(|e| e.into_inner());
        let Some(tx) = guard.as_ref() else {
            debug!(event, "Not connected, dropping outbound event");
            return false;
        };

        let frame = match data {
            Some(data) => json!({ "event": event, "data": data }),
            None => json!({ "event": event }),
        };
        tx.try_send(frame.to_string()).is_ok()
    }

    /// Builds the handshake URL with token and optional farm scope.
    fn handshake_url(&self) -> String {
        match self.farm {
            Some(farm) => format!("{}?token={}&farm={}", self.endpoint, self.token, farm),
            None => format!("{}?token={}", self.endpoint, self.token),
        }
    }

    fn set_state(&self, next: ConnectionState) {
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = next;
    }
}

impl Drop for ClientTransport {
    fn drop(&mut self) {
        // The driver must not outlive the transport and fire its timer
        // into nothing.
        if let Some(handle) = self
            .driver
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            handle.abort();
        }
    }
}

/// Connection driver: owns the connect/read/reconnect loop.
///
/// A successful connection resets the attempt counter and delay; every
/// failed attempt or dropped connection schedules a retry with doubled,
/// capped, lightly jittered delay until the attempt budget is spent.
async fn run_driver(
    url: String,
    connector: Arc<dyn Connector>,
    bus: Arc<EventBus>,
    state: Arc<RwLock<ConnectionState>>,
    outbound: Arc<Mutex<Option<mpsc::Sender<String>>>>,
    reconnect: ReconnectConfig,
) {
    let mut attempts: u32 = 0;
    let mut delay_ms = reconnect.initial_delay_ms;

    loop {
        match connector.connect(&url).await {
            Ok(mut wire) => {
                attempts = 0;
                delay_ms = reconnect.initial_delay_ms;

                *outbound.lock().unwrap_or_else(|e| e.into_inner()) = Some(wire.outbound.clone());
                set_state(&state, ConnectionState::Connected);
                bus.emit(EVENT_CONNECT, &Value::Null);
                info!("Realtime connection established");

                while let Some(frame) = wire.inbound.recv().await {
                    dispatch_frame(&bus, &frame);
                }

                *outbound.lock().unwrap_or_else(|e| e.into_inner()) = None;
                set_state(&state, ConnectionState::Reconnecting);
                bus.emit(EVENT_DISCONNECT, &Value::Null);
                warn!("Realtime connection lost");
            }
            Err(e) => {
                debug!(error = %e, "Connection attempt failed");
            }
        }

        attempts += 1;
        if attempts > reconnect.max_attempts {
            set_state(&state, ConnectionState::Failed);
            bus.emit(
                EVENT_RECONNECT_FAILED,
                &json!({ "message": "Maximum reconnection attempts reached" }),
            );
            warn!(
                max_attempts = reconnect.max_attempts,
                "Giving up on reconnection"
            );
            return;
        }

        set_state(&state, ConnectionState::Reconnecting);
        let jitter = rand::random_range(-0.1..=0.1);
        let sleep_ms = (delay_ms as f64 * (1.0 + jitter)) as u64;
        debug!(attempt = attempts, delay_ms = sleep_ms, "Backing off before reconnect");
        tokio::time::sleep(Duration::from_millis(sleep_ms)).await;
        delay_ms = (delay_ms * 2).min(reconnect.max_delay_ms);
    }
}

/// Re-emits an inbound wire frame onto the local bus under its event name.
fn dispatch_frame(bus: &EventBus, frame: &str) {
    let parsed: Value = match serde_json::from_str(frame) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "Dropping unparseable inbound frame");
            return;
        }
    };

    let Some(event) = parsed.get("event").and_then(Value::as_str) else {
        debug!("Dropping inbound frame without event name");
        return;
    };

    let payload = parsed.get("data").cloned().unwrap_or(Value::Null);
    bus.emit(event, &payload);
}

fn set_state(state: &RwLock<ConnectionState>, next: ConnectionState) {
    *state.write().unwrap_or_else(|e| e.into_inner()) = next;
}
