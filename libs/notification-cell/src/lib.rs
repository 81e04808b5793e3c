pub mod models;
pub mod services;

pub use models::{
    AnalyticsEvent, NotificationCategory, NotificationError, NotificationRequest,
    NotificationSeverity,
};
pub use services::analytics::{AnalyticsDispatcher, AnalyticsSink};
pub use services::notifier::{Notify, SupabaseNotifier};
