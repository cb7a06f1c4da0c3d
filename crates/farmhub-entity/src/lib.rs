//! # farmhub-entity
//!
//! Entity models shared between the FarmHub server and client: the
//! notification record and its classification enums.

pub mod notification;

pub use notification::{EntityKind, Notification, NotificationKind, Severity};
