//! # farmhub-realtime
//!
//! Real-time WebSocket engine for FarmHub. Provides:
//!
//! - WebSocket connection management with JWT authentication
//! - Farm channels and per-entity subscriptions
//! - Notification fan-out driven by farm domain events
//! - CRUD change broadcasts (`data:update`, `animal:*`)

pub mod bridge;
pub mod channel;
pub mod connection;
pub mod message;
pub mod server;
pub mod ws;

pub use bridge::event_bridge::EventBridge;
pub use channel::registry::ChannelRegistry;
pub use connection::manager::ConnectionManager;
pub use server::RealtimeEngine;
