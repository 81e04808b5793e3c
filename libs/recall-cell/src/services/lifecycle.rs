use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use appointment_cell::{AppointmentStatus, AppointmentStore, InsertAppointment, Urgency};
use availability_cell::SlotStore;
use clinic_time::ClinicClock;
use notification_cell::{
    AnalyticsEvent, AnalyticsSink, NotificationCategory, NotificationRequest,
    NotificationSeverity, Notify,
};
use patient_cell::PatientDirectory;

use crate::models::{
    CreateRecallRequest, PatientModifiers, RecallError, RecallRecord, RecallSlot, RecallStatus,
};
use crate::services::due_date::DueDateCalculator;
use crate::services::slot_selector::SuggestedSlotSelector;
use crate::store::{NewRecall, RecallStore, RecallUpdate};

pub const DEFAULT_APPOINTMENT_MINUTES: i32 = 30;

/// Owns the recall state machine and its side effects: slot reservation,
/// appointment creation, patient notification, analytics.
pub struct RecallLifecycleService {
    recall_store: Arc<dyn RecallStore>,
    slot_store: Arc<dyn SlotStore>,
    appointment_store: Arc<dyn AppointmentStore>,
    patient_directory: Arc<dyn PatientDirectory>,
    notifier: Arc<dyn Notify>,
    analytics: Arc<dyn AnalyticsSink>,
    selector: SuggestedSlotSelector,
    calculator: DueDateCalculator,
    clock: ClinicClock,
}

impl RecallLifecycleService {
    pub fn new(
        recall_store: Arc<dyn RecallStore>,
        slot_store: Arc<dyn SlotStore>,
        appointment_store: Arc<dyn AppointmentStore>,
        patient_directory: Arc<dyn PatientDirectory>,
        notifier: Arc<dyn Notify>,
        analytics: Arc<dyn AnalyticsSink>,
        clock: ClinicClock,
    ) -> Self {
        let selector = SuggestedSlotSelector::new(Arc::clone(&slot_store), clock);

        Self {
            recall_store,
            slot_store,
            appointment_store,
            patient_directory,
            notifier,
            analytics,
            selector,
            calculator: DueDateCalculator::new(),
            clock,
        }
    }

    /// Valid next statuses. Reactivating a snoozed recall and expiring an
    /// overdue one belong to external scheduled sweeps, not this service.
    pub fn valid_transitions(&self, current: RecallStatus) -> Vec<RecallStatus> {
        match current {
            RecallStatus::Suggested => vec![
                RecallStatus::Booked,
                RecallStatus::Snoozed,
                RecallStatus::Declined,
            ],
            RecallStatus::Snoozed => vec![],
            RecallStatus::Expired => vec![],
            // Terminal states
            RecallStatus::Booked => vec![],
            RecallStatus::Declined => vec![],
        }
    }

    fn validate_transition(
        &self,
        current: RecallStatus,
        next: RecallStatus,
    ) -> Result<(), RecallError> {
        if !self.valid_transitions(current).contains(&next) {
            warn!("Invalid recall transition attempted: {} -> {}", current, next);
            return Err(RecallError::InvalidTransition(current));
        }
        Ok(())
    }

    pub async fn get_recall(
        &self,
        recall_id: Uuid,
        auth_token: &str,
    ) -> Result<RecallRecord, RecallError> {
        self.recall_store.get_recall(recall_id, auth_token).await
    }

    pub async fn create_recall(
        &self,
        request: CreateRecallRequest,
        auth_token: &str,
    ) -> Result<RecallRecord, RecallError> {
        info!(
            "Creating {} recall for patient {} with dentist {}",
            request.treatment_key, request.patient_id, request.dentist_id
        );

        let base_date = request
            .base_date
            .unwrap_or_else(|| self.clock.today(Utc::now()));
        let due_date =
            self.calculator
                .compute_due_date(base_date, request.treatment_key, &request.modifiers);

        let suggested_slots = self
            .selector
            .suggest_slots_around(request.dentist_id, due_date, &request.modifiers, auth_token)
            .await?;

        let recall = self
            .recall_store
            .insert_recall(
                NewRecall {
                    source_appointment_id: request.source_appointment_id,
                    patient_id: request.patient_id,
                    dentist_id: request.dentist_id,
                    treatment_key: request.treatment_key,
                    treatment_label: request.treatment_key.label().to_string(),
                    due_date,
                    suggested_slots,
                },
                auth_token,
            )
            .await?;

        self.notify_recall_created(&recall, auth_token).await;
        self.analytics.emit(AnalyticsEvent::new(
            "recall_created",
            Some(recall.dentist_id),
            json!({
                "recall_id": recall.id,
                "treatment_key": recall.treatment_key.to_string(),
                "due_date": recall.due_date,
                "suggested_slot_count": recall.suggested_slots.len(),
            }),
        ));

        info!("Recall {} created, due {}", recall.id, recall.due_date);
        Ok(recall)
    }

    /// The reservation protocol. Reserve under a placeholder id, create the
    /// appointment, then rebind the reservation to the real appointment id.
    /// The slot store's atomic reservation is the only concurrency control;
    /// a reservation must never be left dangling when a later step fails.
    pub async fn book_suggested_slot(
        &self,
        recall_id: Uuid,
        slot: RecallSlot,
        auth_token: &str,
    ) -> Result<Uuid, RecallError> {
        let recall = self.recall_store.get_recall(recall_id, auth_token).await?;
        self.validate_transition(recall.status, RecallStatus::Booked)?;

        // Unique per call: a shared placeholder would let one booking's
        // compensation release another booking's pending reservation.
        let placeholder_id = Uuid::new_v4();

        self.slot_store
            .reserve_slot(
                recall.dentist_id,
                slot.date,
                slot.time,
                placeholder_id,
                auth_token,
            )
            .await?;

        let appointment_datetime = self.clock.to_utc(slot.date.and_time(slot.time));

        let appointment = match self
            .appointment_store
            .insert_appointment(
                InsertAppointment {
                    patient_id: recall.patient_id,
                    dentist_id: recall.dentist_id,
                    appointment_datetime,
                    reason: recall.treatment_label.clone(),
                    status: AppointmentStatus::Confirmed,
                    urgency: Urgency::Low,
                    duration_minutes: DEFAULT_APPOINTMENT_MINUTES,
                },
                auth_token,
            )
            .await
        {
            Ok(appointment) => appointment,
            Err(e) => {
                // Compensate, then surface the insert failure. A failing
                // release is logged but never masks the original error.
                if let Err(release_err) = self
                    .slot_store
                    .release_slot(placeholder_id, auth_token)
                    .await
                {
                    error!(
                        "Failed to release reservation {} after appointment insert failure: {}",
                        placeholder_id, release_err
                    );
                }
                return Err(RecallError::Database(e.to_string()));
            }
        };

        // Rebind the reservation from the placeholder to the real owner.
        if let Err(e) = self
            .slot_store
            .reserve_slot(
                recall.dentist_id,
                slot.date,
                slot.time,
                appointment.id,
                auth_token,
            )
            .await
        {
            if let Err(release_err) = self
                .slot_store
                .release_slot(placeholder_id, auth_token)
                .await
            {
                error!(
                    "Failed to release reservation {} after rebind failure: {}",
                    placeholder_id, release_err
                );
            }
            return Err(e.into());
        }

        self.recall_store
            .update_recall(
                recall_id,
                RecallUpdate {
                    status: Some(RecallStatus::Booked),
                    booked_appointment_id: Some(appointment.id),
                    ..Default::default()
                },
                auth_token,
            )
            .await?;

        self.notify_booking_confirmed(&recall, &slot, auth_token).await;
        self.analytics.emit(AnalyticsEvent::new(
            "recall_booked",
            Some(recall.dentist_id),
            json!({
                "recall_id": recall.id,
                "appointment_id": appointment.id,
                "slot_date": slot.date,
            }),
        ));

        info!(
            "Recall {} booked as appointment {} on {} {}",
            recall_id, appointment.id, slot.date, slot.time
        );
        Ok(appointment.id)
    }

    pub async fn snooze_recall(
        &self,
        recall_id: Uuid,
        days: i64,
        auth_token: &str,
    ) -> Result<RecallRecord, RecallError> {
        if days < 1 {
            return Err(RecallError::Validation(
                "snooze must be at least one day".to_string(),
            ));
        }

        let recall = self.recall_store.get_recall(recall_id, auth_token).await?;
        self.validate_transition(recall.status, RecallStatus::Snoozed)?;

        let snooze_until = self.clock.today(Utc::now()) + Duration::days(days);

        let updated = self
            .recall_store
            .update_recall(
                recall_id,
                RecallUpdate {
                    status: Some(RecallStatus::Snoozed),
                    snooze_until: Some(snooze_until),
                    ..Default::default()
                },
                auth_token,
            )
            .await?;

        self.analytics.emit(AnalyticsEvent::new(
            "recall_snoozed",
            Some(recall.dentist_id),
            json!({ "recall_id": recall_id, "snooze_until": snooze_until }),
        ));

        Ok(updated)
    }

    pub async fn decline_recall(
        &self,
        recall_id: Uuid,
        auth_token: &str,
    ) -> Result<RecallRecord, RecallError> {
        let recall = self.recall_store.get_recall(recall_id, auth_token).await?;
        self.validate_transition(recall.status, RecallStatus::Declined)?;

        let updated = self
            .recall_store
            .update_recall(
                recall_id,
                RecallUpdate {
                    status: Some(RecallStatus::Declined),
                    ..Default::default()
                },
                auth_token,
            )
            .await?;

        self.analytics.emit(AnalyticsEvent::new(
            "recall_declined",
            Some(recall.dentist_id),
            json!({ "recall_id": recall_id }),
        ));

        Ok(updated)
    }

    /// Refresh the suggested slots of any non-terminal recall without
    /// touching its status.
    pub async fn regenerate_slots(
        &self,
        recall_id: Uuid,
        modifiers: PatientModifiers,
        auth_token: &str,
    ) -> Result<RecallRecord, RecallError> {
        let recall = self.recall_store.get_recall(recall_id, auth_token).await?;

        if recall.status.is_terminal() {
            return Err(RecallError::InvalidTransition(recall.status));
        }

        let suggested_slots = self
            .selector
            .suggest_slots_around(recall.dentist_id, recall.due_date, &modifiers, auth_token)
            .await?;

        let updated = self
            .recall_store
            .update_recall(
                recall_id,
                RecallUpdate {
                    suggested_slots: Some(suggested_slots),
                    ..Default::default()
                },
                auth_token,
            )
            .await?;

        self.analytics.emit(AnalyticsEvent::new(
            "recall_slots_regenerated",
            Some(recall.dentist_id),
            json!({
                "recall_id": recall_id,
                "suggested_slot_count": updated.suggested_slots.len(),
            }),
        ));

        Ok(updated)
    }

    // ==============================================================================
    // BEST-EFFORT SIDE CHANNELS
    // ==============================================================================

    async fn notify_recall_created(&self, recall: &RecallRecord, auth_token: &str) {
        let Some(user_id) = self.resolve_patient_user(recall, auth_token).await else {
            return;
        };

        let due = recall.due_date.format("%d/%m/%Y");
        let (body, deep_link) = match recall.suggested_slots.first() {
            Some(slot) => (
                format!(
                    "Your {} is due by {}. Tap to book {} at {}.",
                    recall.treatment_label.to_lowercase(),
                    due,
                    slot.date.format("%d/%m/%Y"),
                    slot.time.format("%H:%M"),
                ),
                Some(format!(
                    "/recalls/{}/book?date={}&time={}",
                    recall.id,
                    slot.date,
                    slot.time.format("%H:%M"),
                )),
            ),
            None => (
                format!(
                    "Your {} is due by {}. Contact the practice to find a time.",
                    recall.treatment_label.to_lowercase(),
                    due,
                ),
                None,
            ),
        };

        let request = NotificationRequest {
            user_id,
            title: "Time to book your next visit".to_string(),
            body,
            category: NotificationCategory::Recall,
            severity: NotificationSeverity::Action,
            deep_link,
            metadata: Some(json!({ "recall_id": recall.id })),
        };

        if let Err(e) = self.notifier.send_notification(request, auth_token).await {
            warn!("Failed to send recall notification for {}: {}", recall.id, e);
        }
    }

    async fn notify_booking_confirmed(
        &self,
        recall: &RecallRecord,
        slot: &RecallSlot,
        auth_token: &str,
    ) {
        let Some(user_id) = self.resolve_patient_user(recall, auth_token).await else {
            return;
        };

        let request = NotificationRequest {
            user_id,
            title: "Appointment confirmed".to_string(),
            body: format!(
                "Your {} is booked for {} at {}.",
                recall.treatment_label.to_lowercase(),
                slot.date.format("%d/%m/%Y"),
                slot.time.format("%H:%M"),
            ),
            category: NotificationCategory::Appointment,
            severity: NotificationSeverity::Info,
            deep_link: Some(format!("/recalls/{}", recall.id)),
            metadata: Some(json!({ "recall_id": recall.id })),
        };

        if let Err(e) = self.notifier.send_notification(request, auth_token).await {
            warn!(
                "Failed to send booking confirmation for recall {}: {}",
                recall.id, e
            );
        }
    }

    async fn resolve_patient_user(&self, recall: &RecallRecord, auth_token: &str) -> Option<Uuid> {
        match self
            .patient_directory
            .lookup_patient_user_id(recall.patient_id, auth_token)
            .await
        {
            Ok(Some(user_id)) => Some(user_id),
            Ok(None) => {
                debug!(
                    "Patient {} has no user account, skipping notification",
                    recall.patient_id
                );
                None
            }
            Err(e) => {
                warn!("Patient lookup failed for recall {}: {}", recall.id, e);
                None
            }
        }
    }
}
