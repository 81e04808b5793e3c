pub mod directory;

pub use directory::{PatientDirectory, PatientDirectoryError, SupabasePatientDirectory};
