pub mod analytics;
pub mod notifier;
