use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::{Appointment, AppointmentStoreError, InsertAppointment};

#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn insert_appointment(
        &self,
        request: InsertAppointment,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentStoreError>;

    /// Move an existing appointment to a new instant, leaving every other
    /// field untouched.
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

pub struct SupabaseAppointmentStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAppointmentStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn insert_appointment(
        &self,
        request: InsertAppointment,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentStoreError> {
        let now = Utc::now();

        let appointment_data = json!({
            "patient_id": request.patient_id,
            "dentist_id": request.dentist_id,
            "appointment_datetime": request.appointment_datetime.to_rfc3339(),
            "reason": request.reason,
            "status": request.status.to_string(),
            "urgency": request.urgency.to_string(),
            "duration_minutes": request.duration_minutes,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(auth_token),
                Some(appointment_data),
                Some(headers),
            )
            .await
            .map_err(|e| AppointmentStoreError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentStoreError::Database(
                "Failed to create appointment".to_string(),
            ));
        }

        let appointment: Appointment = serde_json::from_value(result[0].clone())
            .map_err(|e| {
                AppointmentStoreError::Database(format!("Failed to parse created appointment: {}", e))
            })?;

        info!("Appointment {} created", appointment.id);
        Ok(appointment)
    }

    async fn update_appointment_time(
        &self,
        appointment_id: Uuid,
        new_datetime: DateTime<Utc>,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentStoreError> {
        debug!("Moving appointment {} to {}", appointment_id, new_datetime);

        let update_data = json!({
            "appointment_datetime": new_datetime.to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(update_data),
                Some(headers),
            )
            .await
            .map_err(|e| AppointmentStoreError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentStoreError::NotFound);
        }

        let appointment: Appointment = serde_json::from_value(result[0].clone())
            .map_err(|e| {
                AppointmentStoreError::Database(format!("Failed to parse updated appointment: {}", e))
            })?;

        Ok(appointment)
    }

    async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentStoreError> {
        debug!("Fetching appointment: {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentStoreError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentStoreError::NotFound);
        }

        let appointment: Appointment = serde_json::from_value(result[0].clone())
            .map_err(|e| {
                AppointmentStoreError::Database(format!("Failed to parse appointment: {}", e))
            })?;

        Ok(appointment)
    }
}
