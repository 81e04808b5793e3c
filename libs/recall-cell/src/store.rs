use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::{RecallError, RecallRecord, RecallSlot, RecallStatus, TreatmentKey};

#[derive(Debug, Clone)]
pub struct NewRecall {
    pub source_appointment_id: Option<Uuid>,
    pub patient_id: Uuid,
    pub dentist_id: Uuid,
    pub treatment_key: TreatmentKey,
    pub treatment_label: String,
    pub due_date: NaiveDate,
    pub suggested_slots: Vec<RecallSlot>,
}

#[derive(Debug, Clone, Default)]
pub struct RecallUpdate {
    pub status: Option<RecallStatus>,
    pub suggested_slots: Option<Vec<RecallSlot>>,
    pub booked_appointment_id: Option<Uuid>,
    pub snooze_until: Option<NaiveDate>,
    pub clear_snooze: bool,
}

#[async_trait]
pub trait RecallStore: Send + Sync {
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

pub struct SupabaseRecallStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseRecallStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl RecallStore for SupabaseRecallStore {
    async fn insert_recall(
        &self,
        new: NewRecall,
        auth_token: &str,
    ) -> Result<RecallRecord, RecallError> {
        let now = Utc::now();

        let recall_data = json!({
            "source_appointment_id": new.source_appointment_id,
            "patient_id": new.patient_id,
            "dentist_id": new.dentist_id,
            "treatment_key": new.treatment_key.to_string(),
            "treatment_label": new.treatment_label,
            "due_date": new.due_date,
            "suggested_slots": new.suggested_slots,
            "status": RecallStatus::Suggested.to_string(),
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
                "/rest/v1/recalls",
                Some(auth_token),
                Some(recall_data),
                Some(headers),
            )
            .await
            .map_err(|e| RecallError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(RecallError::Database("Failed to create recall".to_string()));
        }

        let recall: RecallRecord = serde_json::from_value(result[0].clone())
            .map_err(|e| RecallError::Database(format!("Failed to parse created recall: {}", e)))?;

        debug!("Recall {} created for patient {}", recall.id, recall.patient_id);
        Ok(recall)
    }

    async fn get_recall(&self, id: Uuid, auth_token: &str) -> Result<RecallRecord, RecallError> {
        debug!("Fetching recall: {}", id);

        let path = format!("/rest/v1/recalls?id=eq.{}", id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| RecallError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(RecallError::NotFound);
        }

        let recall: RecallRecord = serde_json::from_value(result[0].clone())
            .map_err(|e| RecallError::Database(format!("Failed to parse recall: {}", e)))?;

        Ok(recall)
    }

    async fn update_recall(
        &self,
        id: Uuid,
        update: RecallUpdate,
        auth_token: &str,
    ) -> Result<RecallRecord, RecallError> {
        let mut update_data = serde_json::Map::new();

        if let Some(status) = update.status {
            update_data.insert("status".to_string(), json!(status.to_string()));
        }
        if let Some(slots) = update.suggested_slots {
            update_data.insert("suggested_slots".to_string(), json!(slots));
        }
        if let Some(appointment_id) = update.booked_appointment_id {
            update_data.insert("booked_appointment_id".to_string(), json!(appointment_id));
        }
        if let Some(snooze_until) = update.snooze_until {
            update_data.insert("snooze_until".to_string(), json!(snooze_until));
        } else if update.clear_snooze {
            update_data.insert("snooze_until".to_string(), Value::Null);
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/recalls?id=eq.{}", id);
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
                Some(Value::Object(update_data)),
                Some(headers),
            )
            .await
            .map_err(|e| RecallError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(RecallError::NotFound);
        }

        let recall: RecallRecord = serde_json::from_value(result[0].clone())
            .map_err(|e| RecallError::Database(format!("Failed to parse updated recall: {}", e)))?;

        Ok(recall)
    }
}
