use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{self, RecallCellState};

pub fn recall_routes(state: Arc<RecallCellState>) -> Router {
    Router::new()
        .route("/", post(handlers::create_recall))
        .route("/{recall_id}", get(handlers::get_recall))
        .route("/{recall_id}/book", post(handlers::book_slot))
        .route("/{recall_id}/snooze", post(handlers::snooze_recall))
        .route("/{recall_id}/decline", post(handlers::decline_recall))
        .route("/{recall_id}/slots/regenerate", post(handlers::regenerate_slots))
        .with_state(state)
}
