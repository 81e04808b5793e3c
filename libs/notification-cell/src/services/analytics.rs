use std::sync::{Arc, Mutex};

use reqwest::Method;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use shared_database::supabase::SupabaseClient;

use crate::models::AnalyticsEvent;

/// Fire-and-forget event sink. `emit` must never block or fail a caller.
pub trait AnalyticsSink: Send + Sync {
    fn emit(&self, event: AnalyticsEvent);
}

enum Outbound {
    Event(AnalyticsEvent),
    Shutdown,
}

/// Best-effort analytics outbox. Constructed once at process start; events
/// are queued and drained by a background task, and dropped with a warning
/// when the queue is full. `shutdown` flushes whatever is still queued.
pub struct AnalyticsDispatcher {
    tx: mpsc::Sender<Outbound>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AnalyticsDispatcher {
    pub fn start(supabase: Arc<SupabaseClient>, queue_depth: usize) -> Arc<Self> {
        let (tx, mut rx) = mpsc::channel(queue_depth.max(1));

        let worker = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                match message {
                    Outbound::Event(event) => Self::deliver(&supabase, event).await,
                    Outbound::Shutdown => break,
                }
            }
            debug!("Analytics dispatcher drained");
        });

        Arc::new(Self {
            tx,
            worker: Mutex::new(Some(worker)),
        })
    }

    async fn deliver(supabase: &SupabaseClient, event: AnalyticsEvent) {
        let event_data = json!({
            "event_name": event.event_name,
            "dentist_id": event.dentist_id,
            "payload": event.payload,
            "occurred_at": event.occurred_at.to_rfc3339()
        });

        let result: Result<Value, _> = supabase
            .request(Method::POST, "/rest/v1/analytics_events", None, Some(event_data))
            .await;

        if let Err(e) = result {
            warn!("Failed to deliver analytics event {}: {}", event.event_name, e);
        }
    }

    /// Flush queued events and stop the background task.
    pub async fn shutdown(&self) {
        info!("Shutting down analytics dispatcher");

        if self.tx.send(Outbound::Shutdown).await.is_err() {
            return;
        }

        let worker = self.worker.lock().unwrap().take();
        if let Some(worker) = worker {
            let _ = worker.await;
        }
    }
}

impl AnalyticsSink for AnalyticsDispatcher {
    fn emit(&self, event: AnalyticsEvent) {
        if self.tx.try_send(Outbound::Event(event)).is_err() {
            warn!("Analytics queue full or closed, dropping event");
        }
    }
}
