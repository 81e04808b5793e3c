pub mod models;
pub mod store;

pub use models::{AvailabilitySlot, SlotStoreError};
pub use store::{SlotStore, SupabaseSlotStore};
