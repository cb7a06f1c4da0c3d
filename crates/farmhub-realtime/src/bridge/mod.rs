//! Domain event → real-time fan-out bridging.

pub mod event_bridge;
