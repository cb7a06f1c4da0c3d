//! Domain events emitted by farm operations.
//!
//! Events are produced by the CRUD/controller layer (outside this core)
//! and consumed by the notification system and real-time engine.

pub mod animal;
pub mod breeding;
pub mod feed;
pub mod record;
pub mod system;
pub mod veterinary;

use serde::{Deserialize, Serialize};

use crate::types::id::FarmId;

pub use animal::{AnimalHealthChange, HealthStatus};
pub use breeding::{BreedingEvent, BreedingEventKind};
pub use feed::{FeedExpiring, FeedStockLow};
pub use record::{ChangeKind, RecordChange};
pub use system::SystemAlert;
pub use veterinary::VeterinaryReminder;

/// Union of all farm domain events that produce notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FarmEvent {
    /// An animal's health status changed.
    AnimalHealth(AnimalHealthChange),
    /// A feed item dropped below its reorder point.
    FeedStockLow(FeedStockLow),
    /// A feed item approaches its expiry date.
    FeedExpiring(FeedExpiring),
    /// An upcoming veterinary appointment.
    VeterinaryReminder(VeterinaryReminder),
    /// A breeding lifecycle event.
    Breeding(BreedingEvent),
    /// A generic system alert.
    SystemAlert(SystemAlert),
}

impl FarmEvent {
    /// The farm this event belongs to.
    pub fn farm_id(&self) -> FarmId {
        match self {
            Self::AnimalHealth(e) => e.farm_id,
            Self::FeedStockLow(e) => e.farm_id,
            Self::FeedExpiring(e) => e.farm_id,
            Self::VeterinaryReminder(e) => e.farm_id,
            Self::Breeding(e) => e.farm_id,
            Self::SystemAlert(e) => e.farm_id,
        }
    }
}
