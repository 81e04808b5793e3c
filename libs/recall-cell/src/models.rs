use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use availability_cell::SlotStoreError;

// ==============================================================================
// CORE RECALL MODELS
// ==============================================================================

/// A reminder that a patient is due for a specific follow-up treatment by a
/// given date. Recalls are never deleted, only transitioned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecallRecord {
    pub id: Uuid,
    /// Clinical event that triggered the recall, when there was one.
    pub source_appointment_id: Option<Uuid>,
    pub patient_id: Uuid,
    pub dentist_id: Uuid,
    pub treatment_key: TreatmentKey,
    pub treatment_label: String,
    pub due_date: NaiveDate,
    pub suggested_slots: Vec<RecallSlot>,
    pub booked_appointment_id: Option<Uuid>,
    pub status: RecallStatus,
    pub snooze_until: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A candidate (date, time) pair. Equality is by value; slots have no
/// identity of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecallSlot {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecallStatus {
    Suggested,
    Snoozed,
    Declined,
    Booked,
    Expired,
}

impl RecallStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RecallStatus::Booked | RecallStatus::Declined)
    }
}

impl fmt::Display for RecallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecallStatus::Suggested => write!(f, "suggested"),
            RecallStatus::Snoozed => write!(f, "snoozed"),
            RecallStatus::Declined => write!(f, "declined"),
            RecallStatus::Booked => write!(f, "booked"),
            RecallStatus::Expired => write!(f, "expired"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentKey {
    Cleaning,
    FillingFollowUp,
    RootCanalCheck,
    ImplantReviewShort,
    ImplantReviewLong,
    OrthoAdjust,
    ExtractionFollowUp,
    GeneralExam,
}

impl TreatmentKey {
    /// Fixed policy intervals, in days.
    pub fn base_interval_days(&self) -> i64 {
        match self {
            TreatmentKey::Cleaning => 182,
            TreatmentKey::FillingFollowUp => 14,
            TreatmentKey::RootCanalCheck => 21,
            TreatmentKey::ImplantReviewShort => 14,
            TreatmentKey::ImplantReviewLong => 90,
            TreatmentKey::OrthoAdjust => 35,
            TreatmentKey::ExtractionFollowUp => 9,
            TreatmentKey::GeneralExam => 365,
        }
    }

    /// Patient-facing label, also used as the appointment reason on booking.
    pub fn label(&self) -> &'static str {
        match self {
            TreatmentKey::Cleaning => "Routine cleaning",
            TreatmentKey::FillingFollowUp => "Filling follow-up",
            TreatmentKey::RootCanalCheck => "Root canal check",
            TreatmentKey::ImplantReviewShort => "Early implant review",
            TreatmentKey::ImplantReviewLong => "Implant review",
            TreatmentKey::OrthoAdjust => "Orthodontic adjustment",
            TreatmentKey::ExtractionFollowUp => "Extraction follow-up",
            TreatmentKey::GeneralExam => "General examination",
        }
    }
}

impl fmt::Display for TreatmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreatmentKey::Cleaning => write!(f, "cleaning"),
            TreatmentKey::FillingFollowUp => write!(f, "filling_follow_up"),
            TreatmentKey::RootCanalCheck => write!(f, "root_canal_check"),
            TreatmentKey::ImplantReviewShort => write!(f, "implant_review_short"),
            TreatmentKey::ImplantReviewLong => write!(f, "implant_review_long"),
            TreatmentKey::OrthoAdjust => write!(f, "ortho_adjust"),
            TreatmentKey::ExtractionFollowUp => write!(f, "extraction_follow_up"),
            TreatmentKey::GeneralExam => write!(f, "general_exam"),
        }
    }
}

// ==============================================================================
// PATIENT MODIFIERS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PerioRisk {
    #[default]
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBand {
    Morning,
    Afternoon,
    Evening,
}

impl TimeBand {
    /// Band boundaries: before noon is morning, noon to 17:00 is afternoon,
    /// the rest of the day is evening.
    pub fn of_time(time: NaiveTime) -> Self {
        match time.hour() {
            0..=11 => TimeBand::Morning,
            12..=16 => TimeBand::Afternoon,
            _ => TimeBand::Evening,
        }
    }
}

/// Risk and preference flags supplied by the caller at recall creation or
/// slot regeneration. Persisted on the patient profile by an external
/// component, never by this cell.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PatientModifiers {
    #[serde(default)]
    pub is_smoker: bool,
    #[serde(default)]
    pub perio_risk: PerioRisk,
    #[serde(default)]
    pub is_pediatric: bool,
    /// Preferred weekdays, 0 = Sunday. Empty means no preference.
    #[serde(default)]
    pub preferred_days: Vec<u32>,
    /// Empty means no preference.
    #[serde(default)]
    pub preferred_time_bands: Vec<TimeBand>,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRecallRequest {
    pub patient_id: Uuid,
    pub dentist_id: Uuid,
    pub source_appointment_id: Option<Uuid>,
    pub treatment_key: TreatmentKey,
    /// Date the triggering treatment happened; defaults to clinic-today.
    pub base_date: Option<NaiveDate>,
    #[serde(default)]
    pub modifiers: PatientModifiers,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSlotRequest {
    pub slot: RecallSlot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnoozeRecallRequest {
    pub days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RegenerateSlotsRequest {
    #[serde(default)]
    pub modifiers: PatientModifiers,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RecallError {
    #[error("recall not found")]
    NotFound,

    /// The chosen slot was claimed by a concurrent booking. Expected and
    /// recoverable: callers re-fetch suggestions and pick another slot.
    #[error("slot no longer available")]
    SlotUnavailable,

    #[error("recall cannot be modified in status {0}")]
    InvalidTransition(RecallStatus),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("external service error: {0}")]
    ExternalService(String),
}

impl From<SlotStoreError> for RecallError {
    fn from(e: SlotStoreError) -> Self {
        match e {
            SlotStoreError::SlotUnavailable => RecallError::SlotUnavailable,
            SlotStoreError::Database(msg) => RecallError::Database(msg),
        }
    }
}
