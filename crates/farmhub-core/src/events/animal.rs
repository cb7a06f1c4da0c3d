//! Animal-related domain events.

use serde::{Deserialize, Serialize};

use crate::types::id::{AnimalId, FarmId};

/// Health status of an animal as recorded by the livestock module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// No known issues.
    Healthy,
    /// Under observation.
    Monitoring,
    /// Receiving treatment.
    Treatment,
    /// Diagnosed sick.
    Sick,
    /// Physically injured.
    Injured,
    /// Critical condition.
    Critical,
    /// Emergency — veterinarian required immediately.
    Emergency,
    /// Recovering after treatment.
    Recovering,
}

impl HealthStatus {
    /// String form matching the wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Monitoring => "monitoring",
            Self::Treatment => "treatment",
            Self::Sick => "sick",
            Self::Injured => "injured",
            Self::Critical => "critical",
            Self::Emergency => "emergency",
            Self::Recovering => "recovering",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An animal's health status changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimalHealthChange {
    /// The owning farm.
    pub farm_id: FarmId,
    /// The animal whose status changed.
    pub animal_id: AnimalId,
    /// Ear-tag or display name of the animal.
    pub tag: String,
    /// Status before the change.
    pub previous: HealthStatus,
    /// Status after the change.
    pub current: HealthStatus,
}
