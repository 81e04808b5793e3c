use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::{AvailabilitySlot, SlotStoreError};

/// Narrow interface over the availability table and its reservation
/// primitives. The atomic reserve/release procedure is the only mutation
/// path; the core never read-modify-writes slot rows.
#[async_trait]
pub trait SlotStore: Send + Sync {
    /// Idempotent: ensures slot rows exist for the dentist/date.
    async fn generate_daily_slots(
        &self,
        dentist_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<(), SlotStoreError>;

    /// All slot rows in the date range, for one dentist or for the whole
    /// practice when `dentist_id` is `None`.
    async fn query_slots(
        &self,
        dentist_id: Option<Uuid>,
        from: NaiveDate,
        to: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<AvailabilitySlot>, SlotStoreError>;

    /// Atomically claim a slot for an appointment id. Calling again with the
    /// same slot rebinds the owner, which is how a placeholder reservation
    /// is finalized to the real appointment id.
    async fn reserve_slot(
        &self,
        dentist_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<(), SlotStoreError>;

    /// Idempotent compensating action: frees any slot held by the id.
    async fn release_slot(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<(), SlotStoreError>;
}

pub struct SupabaseSlotStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseSlotStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl SlotStore for SupabaseSlotStore {
    async fn generate_daily_slots(
        &self,
        dentist_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<(), SlotStoreError> {
        debug!("Ensuring slots exist for dentist {} on {}", dentist_id, date);

        let params = json!({
            "dentist_id": dentist_id,
            "slot_date": date,
        });

        let _: Value = self
            .supabase
            .rpc("generate_daily_slots", params, Some(auth_token))
            .await
            .map_err(|e| SlotStoreError::Database(e.to_string()))?;

        Ok(())
    }

    async fn query_slots(
        &self,
        dentist_id: Option<Uuid>,
        from: NaiveDate,
        to: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<AvailabilitySlot>, SlotStoreError> {
        let mut path = format!(
            "/rest/v1/availability_slots?slot_date=gte.{}&slot_date=lte.{}&order=slot_date.asc,slot_time.asc",
            from, to
        );
        if let Some(dentist_id) = dentist_id {
            path.push_str(&format!("&dentist_id=eq.{}", dentist_id));
        }

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| SlotStoreError::Database(e.to_string()))?;

        let slots: Vec<AvailabilitySlot> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<AvailabilitySlot>, _>>()
            .map_err(|e| SlotStoreError::Database(format!("Failed to parse slots: {}", e)))?;

        debug!("Fetched {} availability slots", slots.len());
        Ok(slots)
    }

    async fn reserve_slot(
        &self,
        dentist_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<(), SlotStoreError> {
        debug!(
            "Reserving slot {} {} for dentist {} (appointment {})",
            date, time, dentist_id, appointment_id
        );

        let params = json!({
            "dentist_id": dentist_id,
            "slot_date": date,
            "slot_time": time.format("%H:%M:%S").to_string(),
            "appointment_id": appointment_id,
        });

        let reserved: bool = self
            .supabase
            .rpc("reserve_slot", params, Some(auth_token))
            .await
            .map_err(|e| SlotStoreError::Database(e.to_string()))?;

        if !reserved {
            warn!(
                "Reservation lost for dentist {} at {} {}",
                dentist_id, date, time
            );
            return Err(SlotStoreError::SlotUnavailable);
        }

        Ok(())
    }

    async fn release_slot(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<(), SlotStoreError> {
        debug!("Releasing slot held by appointment {}", appointment_id);

        let params = json!({ "appointment_id": appointment_id });

        let _: Value = self
            .supabase
            .rpc("release_slot", params, Some(auth_token))
            .await
            .map_err(|e| SlotStoreError::Database(e.to_string()))?;

        Ok(())
    }
}
