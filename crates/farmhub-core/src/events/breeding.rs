//! Breeding lifecycle domain events.

use serde::{Deserialize, Serialize};

use crate::types::id::{AnimalId, BreedingRecordId, FarmId};

/// Kind of breeding lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreedingEventKind {
    /// Heat cycle detected.
    HeatDetected,
    /// Insemination performed.
    InseminationPerformed,
    /// Pregnancy confirmed.
    PregnancyConfirmed,
    /// Birth expected within the monitoring window.
    BirthExpected,
    /// Birth occurred.
    BirthOccurred,
    /// Weaning is due.
    WeaningDue,
}

impl BreedingEventKind {
    /// String form matching the wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HeatDetected => "heat_detected",
            Self::InseminationPerformed => "insemination_performed",
            Self::PregnancyConfirmed => "pregnancy_confirmed",
            Self::BirthExpected => "birth_expected",
            Self::BirthOccurred => "birth_occurred",
            Self::WeaningDue => "weaning_due",
        }
    }
}

/// A breeding lifecycle event for a tracked animal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreedingEvent {
    /// The owning farm.
    pub farm_id: FarmId,
    /// The breeding record.
    pub record_id: BreedingRecordId,
    /// The dam.
    pub animal_id: AnimalId,
    /// What happened.
    pub kind: BreedingEventKind,
    /// Free-form notes.
    pub notes: Option<String>,
}
