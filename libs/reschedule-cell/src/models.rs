use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use availability_cell::SlotStoreError;

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

/// Parameters for a reschedule search. This mirrors, but is deliberately not
/// merged with, recall slot suggestion: a forced reschedule searches an
/// explicit window with a score threshold instead of a fixed 3-slot cap.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RescheduleOptionsRequest {
    /// Free-text reason, recorded with the analytics event.
    pub reason: Option<String>,
    /// Days ahead to search; defaults to 14.
    pub search_days: Option<i64>,
    /// Restrict candidates to the original practitioner; defaults to true.
    pub same_dentist: Option<bool>,
    /// Candidates scoring below this are excluded entirely; defaults to 40.
    pub min_score: Option<u8>,
}

/// A ranked alternative presented to the patient. `reasons` is user-facing
/// explanation, not just a sort key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleSuggestion {
    pub rank: u32,
    pub date: NaiveDate,
    pub dentist_id: Uuid,
    pub slot: ScoredSlot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredSlot {
    pub time: NaiveTime,
    pub score: u8,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptRescheduleRequest {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

/// Outcome of a reschedule commit. Returned as a value rather than an error
/// so the UI can tell recoverable contention (`slot_taken`) apart from
/// system failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleCommitResult {
    pub success: bool,
    pub slot_taken: bool,
    pub error: Option<String>,
}

impl RescheduleCommitResult {
    pub fn ok() -> Self {
        Self { success: true, slot_taken: false, error: None }
    }

    pub fn taken() -> Self {
        Self {
            success: false,
            slot_taken: true,
            error: Some("slot no longer available".to_string()),
        }
    }

    pub fn failed(message: &str) -> Self {
        Self {
            success: false,
            slot_taken: false,
            error: Some(message.to_string()),
        }
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RescheduleError {
    #[error("appointment not found")]
    AppointmentNotFound,

    #[error("database error: {0}")]
    Database(String),

    #[error("external service error: {0}")]
    ExternalService(String),
}

impl From<SlotStoreError> for RescheduleError {
    fn from(e: SlotStoreError) -> Self {
        match e {
            SlotStoreError::SlotUnavailable => {
                RescheduleError::Database("slot no longer available".to_string())
            }
            SlotStoreError::Database(msg) => RescheduleError::Database(msg),
        }
    }
}
