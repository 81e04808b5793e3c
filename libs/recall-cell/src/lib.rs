pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod store;

pub use handlers::RecallCellState;
pub use models::{
    CreateRecallRequest, PatientModifiers, PerioRisk, RecallError, RecallRecord, RecallSlot,
    RecallStatus, TimeBand, TreatmentKey,
};
pub use router::recall_routes;
pub use services::due_date::DueDateCalculator;
pub use services::lifecycle::RecallLifecycleService;
pub use services::slot_selector::SuggestedSlotSelector;
pub use store::{NewRecall, RecallStore, RecallUpdate, SupabaseRecallStore};
