//! Feed inventory domain events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::id::{FarmId, FeedId};

/// A feed item dropped to or below its reorder point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedStockLow {
    /// The owning farm.
    pub farm_id: FarmId,
    /// The feed inventory item.
    pub feed_id: FeedId,
    /// Display name of the feed.
    pub name: String,
    /// Current stock level.
    pub current_stock: f64,
    /// Configured reorder point.
    pub reorder_point: f64,
    /// Measurement unit ("kg", "bales", ...).
    pub unit: String,
}

/// A feed item approaches its expiry date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedExpiring {
    /// The owning farm.
    pub farm_id: FarmId,
    /// The feed inventory item.
    pub feed_id: FeedId,
    /// Display name of the feed.
    pub name: String,
    /// The expiry instant.
    pub expires_at: DateTime<Utc>,
    /// Whole days remaining until expiry.
    pub days_until_expiry: i64,
}
