//! Veterinary appointment domain events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::id::{AnimalId, FarmId, VeterinaryRecordId};

/// Reminder for an upcoming veterinary appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VeterinaryReminder {
    /// The owning farm.
    pub farm_id: FarmId,
    /// The veterinary record.
    pub record_id: VeterinaryRecordId,
    /// The animal concerned.
    pub animal_id: AnimalId,
    /// Appointment description ("vaccination", "checkup", ...).
    pub description: String,
    /// Scheduled appointment time.
    pub scheduled_at: DateTime<Utc>,
    /// Hours remaining until the appointment.
    pub hours_until: f64,
}
