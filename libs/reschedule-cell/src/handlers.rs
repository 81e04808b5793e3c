use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{AcceptRescheduleRequest, RescheduleError, RescheduleOptionsRequest};
use crate::services::ranking::RescheduleAssistant;

pub struct RescheduleCellState {
    pub assistant: Arc<RescheduleAssistant>,
}

#[derive(Debug, Deserialize)]
pub struct RescheduleOptionsQuery {
    pub reason: Option<String>,
    pub search_days: Option<i64>,
    pub same_dentist: Option<bool>,
    pub min_score: Option<u8>,
}

fn map_reschedule_error(e: RescheduleError) -> AppError {
    match e {
        RescheduleError::AppointmentNotFound => {
            AppError::NotFound("Appointment not found".to_string())
        }
        RescheduleError::Database(msg) => AppError::Database(msg),
        RescheduleError::ExternalService(msg) => AppError::ExternalService(msg),
    }
}

#[axum::debug_handler]
pub async fn find_reschedule_options(
    State(state): State<Arc<RescheduleCellState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(appointment_id): Path<Uuid>,
    Query(query): Query<RescheduleOptionsQuery>,
) -> Result<Json<Value>, AppError> {
    let request = RescheduleOptionsRequest {
        reason: query.reason,
        search_days: query.search_days,
        same_dentist: query.same_dentist,
        min_score: query.min_score,
    };

    let suggestions = state
        .assistant
        .find_reschedule_options(appointment_id, request, auth.token())
        .await
        .map_err(map_reschedule_error)?;

    Ok(Json(json!({
        "appointment_id": appointment_id,
        "suggestions": suggestions
    })))
}

/// Always answers 200 with a result object: "slot taken" is an expected
/// outcome the UI resolves by offering another slot, not an HTTP failure.
#[axum::debug_handler]
pub async fn accept_reschedule(
    State(state): State<Arc<RescheduleCellState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<AcceptRescheduleRequest>,
) -> Json<Value> {
    let result = state
        .assistant
        .accept_reschedule(appointment_id, request.date, request.time, auth.token())
        .await;

    Json(json!(result))
}
