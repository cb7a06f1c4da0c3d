//! # farmhub-service
//!
//! Domain services for FarmHub's notification core: the in-memory
//! notification store with TTL pruning and the service that derives
//! severity/urgency from farm events.

pub mod notification;

pub use notification::service::NotificationService;
pub use notification::store::NotificationStore;
