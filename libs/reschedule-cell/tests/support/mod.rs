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
use notification_cell::{AnalyticsEvent, AnalyticsSink};

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

pub struct NullAnalytics;

impl AnalyticsSink for NullAnalytics {
    fn emit(&self, _event: AnalyticsEvent) {}
}

pub fn clock() -> ClinicClock {
    ClinicClock::new(chrono_tz::Europe::Brussels)
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

/// A confirmed appointment at 10:00 clinic time on the given date.
pub fn appointment_at(
    id: Uuid,
    dentist_id: Uuid,
    date: NaiveDate,
) -> Appointment {
    let datetime = clock().to_utc(date.and_time(time(10, 0)));
    Appointment {
        id,
        patient_id: Uuid::new_v4(),
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
