use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
    pub category: NotificationCategory,
    pub severity: NotificationSeverity,
    /// In-app destination opened by tapping the notification.
    pub deep_link: Option<String>,
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    Recall,
    Appointment,
    System,
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationCategory::Recall => write!(f, "recall"),
            NotificationCategory::Appointment => write!(f, "appointment"),
            NotificationCategory::System => write!(f, "system"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationSeverity {
    Info,
    Action,
    Urgent,
}

impl fmt::Display for NotificationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationSeverity::Info => write!(f, "info"),
            NotificationSeverity::Action => write!(f, "action"),
            NotificationSeverity::Urgent => write!(f, "urgent"),
        }
    }
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("database error: {0}")]
    Database(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub event_name: String,
    pub dentist_id: Option<Uuid>,
    pub payload: Value,
    pub occurred_at: DateTime<Utc>,
}

impl AnalyticsEvent {
    pub fn new(event_name: &str, dentist_id: Option<Uuid>, payload: Value) -> Self {
        Self {
            event_name: event_name.to_string(),
            dentist_id,
            payload,
            occurred_at: Utc::now(),
        }
    }
}
