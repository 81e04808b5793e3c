pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use handlers::RescheduleCellState;
pub use models::{
    RescheduleCommitResult, RescheduleError, RescheduleOptionsRequest, RescheduleSuggestion,
    ScoredSlot,
};
pub use router::reschedule_routes;
pub use services::ranking::RescheduleAssistant;
