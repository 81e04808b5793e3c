#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use mockall::mock;
use uuid::Uuid;

use appointment_cell::{
    Appointment, AppointmentStatus, AppointmentStore, AppointmentStoreError, InsertAppointment,
    Urgency,
};
use availability_cell::{AvailabilitySlot, SlotStore, SlotStoreError};
use clinic_time::ClinicClock;
use notification_cell::{
    AnalyticsEvent, AnalyticsSink, NotificationError, NotificationRequest, Notify,
};
use patient_cell::{PatientDirectory, PatientDirectoryError};
use recall_cell::store::{NewRecall, RecallStore, RecallUpdate};
use recall_cell::{RecallError, RecallRecord, RecallSlot, RecallStatus, TreatmentKey};

mock! {
    pub Slots {}

    #[async_trait]
    impl SlotStore for Slots {
        async fn generate_daily_slots(
            &self,
            dentist_id: Uuid,
            date: NaiveDate,
            auth_token: &str,
        ) -> Result<(), SlotStoreError>;

        async fn query_slots(
            &self,
            dentist_id: Option<Uuid>,
            from: NaiveDate,
            to: NaiveDate,
            auth_token: &str,
        ) -> Result<Vec<AvailabilitySlot>, SlotStoreError>;

        async fn reserve_slot(
            &self,
            dentist_id: Uuid,
            date: NaiveDate,
            time: NaiveTime,
            appointment_id: Uuid,
            auth_token: &str,
        ) -> Result<(), SlotStoreError>;

        async fn release_slot(
            &self,
            appointment_id: Uuid,
            auth_token: &str,
        ) -> Result<(), SlotStoreError>;
    }
}

mock! {
    pub Recalls {}

    #[async_trait]
    impl RecallStore for Recalls {
        async fn insert_recall(
            &self,
            new: NewRecall,
            auth_token: &str,
        ) -> Result<RecallRecord, RecallError>;

        async fn get_recall(&self, id: Uuid, auth_token: &str) -> Result<RecallRecord, RecallError>;

        async fn update_recall(
            &self,
            id: Uuid,
            update: RecallUpdate,
            auth_token: &str,
        ) -> Result<RecallRecord, RecallError>;
    }
}

mock! {
    pub Appointments {}

    #[async_trait]
    impl AppointmentStore for Appointments {
        async fn insert_appointment(
            &self,
            request: InsertAppointment,
            auth_token: &str,
        ) -> Result<Appointment, AppointmentStoreError>;

        async fn update_appointment_time(
            &self,
            appointment_id: Uuid,
            new_datetime: DateTime<Utc>,
            auth_token: &str,
        ) -> Result<Appointment, AppointmentStoreError>;

        async fn get_appointment(
            &self,
            appointment_id: Uuid,
            auth_token: &str,
        ) -> Result<Appointment, AppointmentStoreError>;
    }
}

/// Directory stub resolving every patient to the same user account.
pub struct StaticPatients(pub Option<Uuid>);

#[async_trait]
impl PatientDirectory for StaticPatients {
    async fn lookup_patient_user_id(
        &self,
        _patient_id: Uuid,
        _auth_token: &str,
    ) -> Result<Option<Uuid>, PatientDirectoryError> {
        Ok(self.0)
    }
}

pub struct OkNotifier;

#[async_trait]
impl Notify for OkNotifier {
    async fn send_notification(
        &self,
        _request: NotificationRequest,
        _auth_token: &str,
    ) -> Result<(), NotificationError> {
        Ok(())
    }
}

pub struct FailingNotifier;

#[async_trait]
impl Notify for FailingNotifier {
    async fn send_notification(
        &self,
        _request: NotificationRequest,
        _auth_token: &str,
    ) -> Result<(), NotificationError> {
        Err(NotificationError::Database("notification channel down".to_string()))
    }
}

pub struct NullAnalytics;

impl AnalyticsSink for NullAnalytics {
    fn emit(&self, _event: AnalyticsEvent) {}
}

pub fn clock() -> ClinicClock {
    ClinicClock::new(chrono_tz::Europe::Brussels)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn availability(
    dentist_id: Uuid,
    slot_date: NaiveDate,
    slot_time: NaiveTime,
    is_available: bool,
    emergency_only: bool,
) -> AvailabilitySlot {
    AvailabilitySlot {
        id: Uuid::new_v4(),
        dentist_id,
        slot_date,
        slot_time,
        is_available,
        emergency_only,
    }
}

pub fn recall_in_status(
    patient_id: Uuid,
    dentist_id: Uuid,
    status: RecallStatus,
) -> RecallRecord {
    RecallRecord {
        id: Uuid::new_v4(),
        source_appointment_id: None,
        patient_id,
        dentist_id,
        treatment_key: TreatmentKey::Cleaning,
        treatment_label: "Routine cleaning".to_string(),
        due_date: date(2024, 7, 10),
        suggested_slots: vec![
            RecallSlot { date: date(2024, 7, 9), time: time(10, 0) },
            RecallSlot { date: date(2024, 7, 11), time: time(14, 0) },
        ],
        booked_appointment_id: None,
        status,
        snooze_until: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn confirmed_appointment(
    id: Uuid,
    patient_id: Uuid,
    dentist_id: Uuid,
    datetime: DateTime<Utc>,
) -> Appointment {
    Appointment {
        id,
        patient_id,
        dentist_id,
        appointment_datetime: datetime,
        reason: "Routine cleaning".to_string(),
        status: AppointmentStatus::Confirmed,
        urgency: Urgency::Low,
        duration_minutes: 30,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
