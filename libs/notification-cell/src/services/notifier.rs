use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_database::supabase::SupabaseClient;

use crate::models::{NotificationError, NotificationRequest};

/// Outbound patient notification channel. Callers on booking paths treat
/// failures as best-effort: logged, never propagated into the booking result.
#[async_trait]
pub trait Notify: Send + Sync {
    async fn send_notification(
        &self,
        request: NotificationRequest,
        auth_token: &str,
    ) -> Result<(), NotificationError>;
}

pub struct SupabaseNotifier {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseNotifier {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl Notify for SupabaseNotifier {
    async fn send_notification(
        &self,
        request: NotificationRequest,
        auth_token: &str,
    ) -> Result<(), NotificationError> {
        debug!(
            "Sending {} notification to user {}",
            request.category, request.user_id
        );

        let notification_data = json!({
            "user_id": request.user_id,
            "title": request.title,
            "body": request.body,
            "category": request.category.to_string(),
            "severity": request.severity.to_string(),
            "deep_link": request.deep_link,
            "metadata": request.metadata,
            "read": false,
            "created_at": Utc::now().to_rfc3339()
        });

        let _: Value = self
            .supabase
            .request(
                Method::POST,
                "/rest/v1/notifications",
                Some(auth_token),
                Some(notification_data),
            )
            .await
            .map_err(|e| NotificationError::Database(e.to_string()))?;

        Ok(())
    }
}
