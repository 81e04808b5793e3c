use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Datelike, Utc};
use tracing::debug;
use uuid::Uuid;

use availability_cell::SlotStore;
use clinic_time::ClinicClock;

use crate::models::{PatientModifiers, RecallError, RecallSlot, TimeBand};

/// Search window around the due date, biased toward slightly early over very
/// late: not-overdue care beats convenience.
pub const WINDOW_DAYS_BEFORE: i64 = 3;
pub const WINDOW_DAYS_AFTER: i64 = 7;
pub const MAX_SUGGESTIONS: usize = 3;

/// Produces up to three candidate slots for a dentist around a due date,
/// honoring patient preferences and ordered by closeness to the due date.
pub struct SuggestedSlotSelector {
    slot_store: Arc<dyn SlotStore>,
    clock: ClinicClock,
}

impl SuggestedSlotSelector {
    pub fn new(slot_store: Arc<dyn SlotStore>, clock: ClinicClock) -> Self {
        Self { slot_store, clock }
    }

    pub async fn suggest_slots_around(
        &self,
        dentist_id: Uuid,
        due_date: NaiveDate,
        modifiers: &PatientModifiers,
        auth_token: &str,
    ) -> Result<Vec<RecallSlot>, RecallError> {
        let window_start = due_date - Duration::days(WINDOW_DAYS_BEFORE);
        let window_end = due_date + Duration::days(WINDOW_DAYS_AFTER);

        debug!(
            "Suggesting slots for dentist {} in {}..={}",
            dentist_id, window_start, window_end
        );

        // The generation procedure is idempotent, so populating days that
        // already have rows is safe.
        let mut date = window_start;
        while date <= window_end {
            self.slot_store
                .generate_daily_slots(dentist_id, date, auth_token)
                .await?;
            date += Duration::days(1);
        }

        let slots = self
            .slot_store
            .query_slots(Some(dentist_id), window_start, window_end, auth_token)
            .await?;

        let due_noon = self
            .clock
            .to_utc(due_date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap()));

        let mut candidates: Vec<(i64, DateTime<Utc>, RecallSlot)> = slots
            .into_iter()
            // Recall bookings never consume emergency-reserved capacity.
            .filter(|slot| slot.is_available && !slot.emergency_only)
            .filter(|slot| self.matches_day_preference(slot.slot_date, modifiers))
            .filter(|slot| self.matches_band_preference(slot.slot_time, modifiers))
            .map(|slot| {
                let instant = self.clock.to_utc(slot.slot_date.and_time(slot.slot_time));
                let distance = (instant - due_noon).num_seconds().abs();
                (
                    distance,
                    instant,
                    RecallSlot {
                        date: slot.slot_date,
                        time: slot.slot_time,
                    },
                )
            })
            .collect();

        // Closest to the due date first; equidistant slots break earlier-first.
        candidates.sort_by_key(|(distance, instant, _)| (*distance, *instant));
        candidates.truncate(MAX_SUGGESTIONS);

        debug!("Selected {} suggested slots", candidates.len());
        Ok(candidates.into_iter().map(|(_, _, slot)| slot).collect())
    }

    fn matches_day_preference(&self, date: NaiveDate, modifiers: &PatientModifiers) -> bool {
        if modifiers.preferred_days.is_empty() {
            return true;
        }
        modifiers
            .preferred_days
            .contains(&date.weekday().num_days_from_sunday())
    }

    fn matches_band_preference(&self, time: NaiveTime, modifiers: &PatientModifiers) -> bool {
        let band = TimeBand::of_time(time);

        // Children's appointments avoid early morning.
        if modifiers.is_pediatric && band == TimeBand::Morning {
            return false;
        }

        if modifiers.preferred_time_bands.is_empty() {
            return true;
        }
        modifiers.preferred_time_bands.contains(&band)
    }
}
