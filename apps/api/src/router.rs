use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use recall_cell::{recall_routes, RecallCellState};
use reschedule_cell::{reschedule_routes, RescheduleCellState};

pub fn create_router(
    recall_state: Arc<RecallCellState>,
    reschedule_state: Arc<RescheduleCellState>,
) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/recalls", recall_routes(recall_state))
        .nest("/appointments", reschedule_routes(reschedule_state))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "meridian-dental-api"
    }))
}
