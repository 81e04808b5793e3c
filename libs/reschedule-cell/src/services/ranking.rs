use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use appointment_cell::{AppointmentStore, AppointmentStoreError};
use availability_cell::{AvailabilitySlot, SlotStore, SlotStoreError};
use clinic_time::ClinicClock;
use notification_cell::{AnalyticsEvent, AnalyticsSink};

use crate::models::{
    RescheduleCommitResult, RescheduleError, RescheduleOptionsRequest, RescheduleSuggestion,
    ScoredSlot,
};

pub const DEFAULT_SEARCH_DAYS: i64 = 14;
pub const DEFAULT_MIN_SCORE: u8 = 40;
const MAX_SEARCH_DAYS: i64 = 60;

const BASE_SCORE: i64 = 25;
const SAME_DENTIST_BONUS: i64 = 20;
const CLOSE_TIME_BONUS: i64 = 30;
const NEAR_TIME_BONUS: i64 = 15;
const SOON_BONUS: i64 = 25;
const WITHIN_WEEK_BONUS: i64 = 10;

const CLOSE_TIME_MINUTES: i64 = 30;
const NEAR_TIME_MINUTES: i64 = 120;
const SOON_DAYS: i64 = 3;
const WITHIN_WEEK_DAYS: i64 = 7;

const COMMIT_FAILED_MESSAGE: &str = "failed to reschedule appointment";

/// Finds and ranks alternative slots when a booked appointment has to move,
/// and commits the patient's pick with the same reserve-then-write
/// discipline as recall booking.
pub struct RescheduleAssistant {
    slot_store: Arc<dyn SlotStore>,
    appointment_store: Arc<dyn AppointmentStore>,
    analytics: Arc<dyn AnalyticsSink>,
    clock: ClinicClock,
}

impl RescheduleAssistant {
    pub fn new(
        slot_store: Arc<dyn SlotStore>,
        appointment_store: Arc<dyn AppointmentStore>,
        analytics: Arc<dyn AnalyticsSink>,
        clock: ClinicClock,
    ) -> Self {
        Self {
            slot_store,
            appointment_store,
            analytics,
            clock,
        }
    }

    pub async fn find_reschedule_options(
        &self,
        appointment_id: Uuid,
        request: RescheduleOptionsRequest,
        auth_token: &str,
    ) -> Result<Vec<RescheduleSuggestion>, RescheduleError> {
        let appointment = self
            .appointment_store
            .get_appointment(appointment_id, auth_token)
            .await
            .map_err(|e| match e {
                AppointmentStoreError::NotFound => RescheduleError::AppointmentNotFound,
                AppointmentStoreError::Database(msg) => RescheduleError::Database(msg),
            })?;

        let search_days = request
            .search_days
            .unwrap_or(DEFAULT_SEARCH_DAYS)
            .clamp(1, MAX_SEARCH_DAYS);
        let same_dentist = request.same_dentist.unwrap_or(true);
        let min_score = request.min_score.unwrap_or(DEFAULT_MIN_SCORE);

        let today = self.clock.today(Utc::now());
        let window_start = today + Duration::days(1);
        let window_end = today + Duration::days(search_days);

        debug!(
            "Searching reschedule options for appointment {} in {}..={} (same dentist: {})",
            appointment_id, window_start, window_end, same_dentist
        );

        // The original practitioner's days are always populated; a
        // cross-practice search additionally picks up whatever the other
        // dentists' own flows have generated.
        let mut date = window_start;
        while date <= window_end {
            self.slot_store
                .generate_daily_slots(appointment.dentist_id, date, auth_token)
                .await?;
            date += Duration::days(1);
        }

        let candidates = self
            .slot_store
            .query_slots(
                same_dentist.then_some(appointment.dentist_id),
                window_start,
                window_end,
                auth_token,
            )
            .await?;

        let original_local = self.clock.to_clinic(appointment.appointment_datetime);

        let mut scored: Vec<(NaiveDate, NaiveTime, Uuid, u8, Vec<String>)> = candidates
            .into_iter()
            .filter(|slot| slot.is_available && !slot.emergency_only)
            .map(|slot| {
                let (score, reasons) =
                    self.score_slot(&slot, original_local, appointment.dentist_id, today);
                (slot.slot_date, slot.slot_time, slot.dentist_id, score, reasons)
            })
            .filter(|(_, _, _, score, _)| *score >= min_score)
            .collect();

        // Best score first; equal scores break toward the soonest slot.
        scored.sort_by(|a, b| b.3.cmp(&a.3).then(a.0.cmp(&b.0)).then(a.1.cmp(&b.1)));

        let suggestions: Vec<RescheduleSuggestion> = scored
            .into_iter()
            .enumerate()
            .map(|(index, (date, time, dentist_id, score, reasons))| RescheduleSuggestion {
                rank: index as u32 + 1,
                date,
                dentist_id,
                slot: ScoredSlot { time, score, reasons },
            })
            .collect();

        self.analytics.emit(AnalyticsEvent::new(
            "reschedule_options_generated",
            Some(appointment.dentist_id),
            json!({
                "appointment_id": appointment_id,
                "reason": request.reason,
                "suggestion_count": suggestions.len(),
            }),
        ));

        info!(
            "Found {} reschedule options for appointment {}",
            suggestions.len(),
            appointment_id
        );
        Ok(suggestions)
    }

    fn score_slot(
        &self,
        slot: &AvailabilitySlot,
        original_local: NaiveDateTime,
        original_dentist_id: Uuid,
        today: NaiveDate,
    ) -> (u8, Vec<String>) {
        let mut score = BASE_SCORE;
        let mut reasons = Vec::new();

        if slot.dentist_id == original_dentist_id {
            score += SAME_DENTIST_BONUS;
            reasons.push("Same dentist".to_string());
        }

        let minutes_off = (slot.slot_time - original_local.time()).num_minutes().abs();
        if minutes_off <= CLOSE_TIME_MINUTES {
            score += CLOSE_TIME_BONUS;
            reasons.push("Similar time of day".to_string());
        } else if minutes_off <= NEAR_TIME_MINUTES {
            score += NEAR_TIME_BONUS;
            reasons.push("Close to your usual time".to_string());
        }

        let days_until = (slot.slot_date - today).num_days();
        if days_until <= SOON_DAYS {
            score += SOON_BONUS;
            reasons.push("Available soon".to_string());
        } else if days_until <= WITHIN_WEEK_DAYS {
            score += WITHIN_WEEK_BONUS;
            reasons.push("Within a week".to_string());
        }

        (score.clamp(0, 100) as u8, reasons)
    }

    /// Move the appointment to the chosen slot: reserve under a unique
    /// placeholder, update the stored datetime, rebind the reservation to
    /// the appointment id. Failures come back as a result value so the UI
    /// can distinguish "slot taken, pick another" from a system error.
    pub async fn accept_reschedule(
        &self,
        appointment_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        auth_token: &str,
    ) -> RescheduleCommitResult {
        let appointment = match self
            .appointment_store
            .get_appointment(appointment_id, auth_token)
            .await
        {
            Ok(appointment) => appointment,
            Err(AppointmentStoreError::NotFound) => {
                return RescheduleCommitResult::failed("appointment not found");
            }
            Err(e) => {
                warn!("Appointment lookup failed for reschedule: {}", e);
                return RescheduleCommitResult::failed(COMMIT_FAILED_MESSAGE);
            }
        };

        let placeholder_id = Uuid::new_v4();

        match self
            .slot_store
            .reserve_slot(appointment.dentist_id, date, time, placeholder_id, auth_token)
            .await
        {
            Ok(()) => {}
            Err(SlotStoreError::SlotUnavailable) => {
                info!(
                    "Reschedule target {} {} already taken for appointment {}",
                    date, time, appointment_id
                );
                return RescheduleCommitResult::taken();
            }
            Err(e) => {
                warn!("Reservation failed during reschedule: {}", e);
                return RescheduleCommitResult::failed(COMMIT_FAILED_MESSAGE);
            }
        }

        let new_datetime = self.clock.to_utc(date.and_time(time));

        if let Err(e) = self
            .appointment_store
            .update_appointment_time(appointment_id, new_datetime, auth_token)
            .await
        {
            error!(
                "Failed to move appointment {} to {}: {}",
                appointment_id, new_datetime, e
            );
            // Compensate; a failing release is logged and never masks the
            // update failure.
            if let Err(release_err) = self
                .slot_store
                .release_slot(placeholder_id, auth_token)
                .await
            {
                error!(
                    "Failed to release reservation {} after update failure: {}",
                    placeholder_id, release_err
                );
            }
            return RescheduleCommitResult::failed(COMMIT_FAILED_MESSAGE);
        }

        if let Err(e) = self
            .slot_store
            .reserve_slot(appointment.dentist_id, date, time, appointment_id, auth_token)
            .await
        {
            error!(
                "Failed to finalize reservation for appointment {}: {}",
                appointment_id, e
            );
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
            return RescheduleCommitResult::failed(COMMIT_FAILED_MESSAGE);
        }

        self.analytics.emit(AnalyticsEvent::new(
            "appointment_rescheduled",
            Some(appointment.dentist_id),
            json!({
                "appointment_id": appointment_id,
                "new_date": date,
                "new_time": time.format("%H:%M").to_string(),
            }),
        ));

        info!(
            "Appointment {} rescheduled to {} {}",
            appointment_id, date, time
        );
        RescheduleCommitResult::ok()
    }
}
