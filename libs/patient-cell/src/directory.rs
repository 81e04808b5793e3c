use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

#[derive(Debug, Error)]
pub enum PatientDirectoryError {
    #[error("database error: {0}")]
    Database(String),
}

/// Resolves a patient record to the user account that receives
/// notifications. Patients imported from practice software may not have an
/// account yet, so a missing mapping is not an error.
#[async_trait]
pub trait PatientDirectory: Send + Sync {
    async fn lookup_patient_user_id(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Option<Uuid>, PatientDirectoryError>;
}

pub struct SupabasePatientDirectory {
    supabase: Arc<SupabaseClient>,
}

impl SupabasePatientDirectory {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl PatientDirectory for SupabasePatientDirectory {
    async fn lookup_patient_user_id(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Option<Uuid>, PatientDirectoryError> {
        debug!("Looking up user account for patient {}", patient_id);

        let path = format!("/rest/v1/patients?id=eq.{}&select=user_id", patient_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| PatientDirectoryError::Database(e.to_string()))?;

        let user_id = result
            .first()
            .and_then(|row| row["user_id"].as_str())
            .and_then(|raw| Uuid::parse_str(raw).ok());

        Ok(user_id)
    }
}
