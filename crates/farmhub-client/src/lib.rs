//! # farmhub-client
//!
//! Client-side real-time plumbing for FarmHub: one authenticated
//! WebSocket connection per session with reconnect-with-backoff, a local
//! publish/subscribe bus that keeps application code off the transport
//! library, and a live notification feed that reconciles paginated REST
//! snapshots with pushed events.

pub mod api;
pub mod bus;
pub mod connector;
pub mod feed;
pub mod transport;

pub use api::NotificationApi;
pub use bus::EventBus;
pub use feed::NotificationFeed;
pub use transport::{ClientTransport, ConnectionState};
