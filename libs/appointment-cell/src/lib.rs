pub mod models;
pub mod store;

pub use models::{
    Appointment, AppointmentStatus, AppointmentStoreError, InsertAppointment, Urgency,
};
pub use store::{AppointmentStore, SupabaseAppointmentStore};
