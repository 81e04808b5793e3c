use std::net::SocketAddr;
use std::sync::Arc;

use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use appointment_cell::SupabaseAppointmentStore;
use availability_cell::SupabaseSlotStore;
use clinic_time::ClinicClock;
use notification_cell::{AnalyticsDispatcher, SupabaseNotifier};
use patient_cell::SupabasePatientDirectory;
use recall_cell::{RecallCellState, RecallLifecycleService, SupabaseRecallStore};
use reschedule_cell::{RescheduleAssistant, RescheduleCellState};
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

#[tokio::main]
async fn main() {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Meridian Dental API server");

    // Load configuration
    let config = AppConfig::from_env();

    let clock = match ClinicClock::from_name(&config.clinic_timezone) {
        Ok(clock) => clock,
        Err(e) => {
            warn!("{}, falling back to Europe/Brussels", e);
            ClinicClock::new(chrono_tz::Europe::Brussels)
        }
    };

    // Shared storage client and collaborator services
    let supabase = Arc::new(SupabaseClient::new(&config));
    let slot_store: Arc<dyn availability_cell::SlotStore> =
        Arc::new(SupabaseSlotStore::new(Arc::clone(&supabase)));
    let appointment_store: Arc<dyn appointment_cell::AppointmentStore> =
        Arc::new(SupabaseAppointmentStore::new(Arc::clone(&supabase)));
    let recall_store = Arc::new(SupabaseRecallStore::new(Arc::clone(&supabase)));
    let patient_directory = Arc::new(SupabasePatientDirectory::new(Arc::clone(&supabase)));
    let notifier = Arc::new(SupabaseNotifier::new(Arc::clone(&supabase)));

    // One analytics outbox for the whole process, flushed on shutdown.
    let analytics = AnalyticsDispatcher::start(Arc::clone(&supabase), config.analytics_queue_depth);
    let analytics_sink: Arc<dyn notification_cell::AnalyticsSink> = analytics.clone();

    let lifecycle = Arc::new(RecallLifecycleService::new(
        recall_store,
        Arc::clone(&slot_store),
        Arc::clone(&appointment_store),
        patient_directory,
        notifier,
        Arc::clone(&analytics_sink),
        clock,
    ));
    let assistant = Arc::new(RescheduleAssistant::new(
        slot_store,
        appointment_store,
        Arc::clone(&analytics_sink),
        clock,
    ));

    let recall_state = Arc::new(RecallCellState { lifecycle });
    let reschedule_state = Arc::new(RescheduleCellState { assistant });

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(recall_state, reschedule_state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    analytics.shutdown().await;
    info!("Server stopped");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    info!("Shutdown signal received");
}
