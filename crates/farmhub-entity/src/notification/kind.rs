//! Notification kind and entity back-reference enumerations.

use serde::{Deserialize, Serialize};

/// Kind of a notification, for filtering and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// An animal's health status changed.
    AnimalHealth,
    /// Feed stock or feed expiry alert.
    FeedAlert,
    /// Upcoming veterinary appointment.
    VeterinaryReminder,
    /// Breeding lifecycle update.
    BreedingUpdate,
    /// Generic system alert.
    SystemAlert,
}

impl NotificationKind {
    /// Return the kind as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AnimalHealth => "animal_health",
            Self::FeedAlert => "feed_alert",
            Self::VeterinaryReminder => "veterinary_reminder",
            Self::BreedingUpdate => "breeding_update",
            Self::SystemAlert => "system_alert",
        }
    }

    /// Short prefix used when forming notification ids.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::AnimalHealth => "health",
            Self::FeedAlert => "feed",
            Self::VeterinaryReminder => "vet",
            Self::BreedingUpdate => "breeding",
            Self::SystemAlert => "system",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of entity a notification refers back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A tracked animal.
    Animal,
    /// A feed inventory item.
    Feed,
    /// A veterinary record.
    Veterinary,
    /// A breeding record.
    Breeding,
}

impl EntityKind {
    /// Return the entity kind as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Animal => "animal",
            Self::Feed => "feed",
            Self::Veterinary => "veterinary",
            Self::Breeding => "breeding",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
