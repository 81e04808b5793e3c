use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{
    BookSlotRequest, CreateRecallRequest, RecallError, RegenerateSlotsRequest, SnoozeRecallRequest,
};
use crate::services::lifecycle::RecallLifecycleService;

/// Shared state for the recall routes. The lifecycle service is constructed
/// once at process start with its injected collaborators.
pub struct RecallCellState {
    pub lifecycle: Arc<RecallLifecycleService>,
}

fn map_recall_error(e: RecallError) -> AppError {
    match e {
        RecallError::NotFound => AppError::NotFound("Recall not found".to_string()),
        RecallError::SlotUnavailable => AppError::Conflict(
            "Selected slot is no longer available, please pick another".to_string(),
        ),
        RecallError::InvalidTransition(status) => {
            AppError::BadRequest(format!("Recall cannot be modified in status {}", status))
        }
        RecallError::Validation(msg) => AppError::ValidationError(msg),
        RecallError::Database(msg) => AppError::Database(msg),
        RecallError::ExternalService(msg) => AppError::ExternalService(msg),
    }
}

#[axum::debug_handler]
pub async fn create_recall(
    State(state): State<Arc<RecallCellState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreateRecallRequest>,
) -> Result<Json<Value>, AppError> {
    let recall = state
        .lifecycle
        .create_recall(request, auth.token())
        .await
        .map_err(map_recall_error)?;

    Ok(Json(json!({
        "success": true,
        "recall": recall
    })))
}

#[axum::debug_handler]
pub async fn get_recall(
    State(state): State<Arc<RecallCellState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(recall_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let recall = state
        .lifecycle
        .get_recall(recall_id, auth.token())
        .await
        .map_err(map_recall_error)?;

    Ok(Json(json!({ "recall": recall })))
}

#[axum::debug_handler]
pub async fn book_slot(
    State(state): State<Arc<RecallCellState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(recall_id): Path<Uuid>,
    Json(request): Json<BookSlotRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment_id = state
        .lifecycle
        .book_suggested_slot(recall_id, request.slot, auth.token())
        .await
        .map_err(map_recall_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment_id": appointment_id,
        "message": "Appointment booked"
    })))
}

#[axum::debug_handler]
pub async fn snooze_recall(
    State(state): State<Arc<RecallCellState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(recall_id): Path<Uuid>,
    Json(request): Json<SnoozeRecallRequest>,
) -> Result<Json<Value>, AppError> {
    let recall = state
        .lifecycle
        .snooze_recall(recall_id, request.days, auth.token())
        .await
        .map_err(map_recall_error)?;

    Ok(Json(json!({
        "success": true,
        "recall": recall
    })))
}

#[axum::debug_handler]
pub async fn decline_recall(
    State(state): State<Arc<RecallCellState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(recall_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let recall = state
        .lifecycle
        .decline_recall(recall_id, auth.token())
        .await
        .map_err(map_recall_error)?;

    Ok(Json(json!({
        "success": true,
        "recall": recall
    })))
}

#[axum::debug_handler]
pub async fn regenerate_slots(
    State(state): State<Arc<RecallCellState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(recall_id): Path<Uuid>,
    Json(request): Json<RegenerateSlotsRequest>,
) -> Result<Json<Value>, AppError> {
    let recall = state
        .lifecycle
        .regenerate_slots(recall_id, request.modifiers, auth.token())
        .await
        .map_err(map_recall_error)?;

    Ok(Json(json!({
        "success": true,
        "recall": recall
    })))
}
