use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{self, RescheduleCellState};

pub fn reschedule_routes(state: Arc<RescheduleCellState>) -> Router {
    Router::new()
        .route(
            "/{appointment_id}/reschedule-options",
            get(handlers::find_reschedule_options),
        )
        .route(
            "/{appointment_id}/reschedule",
            post(handlers::accept_reschedule),
        )
        .with_state(state)
}
