use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// One bookable (dentist, date, time) tuple from the availability table.
/// Rows are produced by the external slot-generation procedure; the core
/// only reads them and flips availability through the reservation RPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub id: Uuid,
    pub dentist_id: Uuid,
    pub slot_date: NaiveDate,
    pub slot_time: NaiveTime,
    pub is_available: bool,
    pub emergency_only: bool,
}

#[derive(Debug, Error)]
pub enum SlotStoreError {
    /// The reservation lost a race: expected, recoverable contention.
    #[error("slot no longer available")]
    SlotUnavailable,

    #[error("database error: {0}")]
    Database(String),
}
