//! System-level alert events.

use serde::{Deserialize, Serialize};

use crate::types::id::FarmId;
use crate::types::severity::Severity;

/// A generic system alert addressed to a farm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemAlert {
    /// The addressed farm.
    pub farm_id: FarmId,
    /// Alert title.
    pub title: String,
    /// Alert body.
    pub message: String,
    /// Requested severity; defaults to medium when absent.
    pub severity: Option<Severity>,
    /// Optional deep link for the alert.
    pub action_url: Option<String>,
}
