//! Notification severity levels.

use serde::{Deserialize, Serialize};

/// Derived urgency classification for notifications.
///
/// Severity is always computed from domain thresholds; callers never set
/// it directly (the one exception is a system alert, where the caller
/// supplies a requested level that still passes through the derivation
/// rules).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Background information.
    Low,
    /// Standard events.
    Medium,
    /// Important events needing attention soon.
    High,
    /// Requires immediate attention.
    Critical,
}

impl Severity {
    /// Parse from string, defaulting to `Medium` for unknown values.
    pub fn from_str_value(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            "critical" => Self::Critical,
            _ => Self::Medium,
        }
    }

    /// Convert to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Whether this level demands user action by default.
    pub fn demands_action(&self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
