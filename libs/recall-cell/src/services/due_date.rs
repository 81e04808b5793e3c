use chrono::{Duration, NaiveDate};

use crate::models::{PatientModifiers, PerioRisk, TreatmentKey};

/// Intervals never shrink below one week, whatever the risk profile.
pub const MIN_INTERVAL_DAYS: i64 = 7;

const HIGH_RISK_FACTOR: f64 = 0.8;
const MEDIUM_RISK_FACTOR: f64 = 0.9;

/// Turns "what treatment just happened" plus "who is this patient" into
/// "when is the next visit due". Weekend/holiday adjustment is deliberately
/// left to slot selection.
#[derive(Debug, Default)]
pub struct DueDateCalculator;

impl DueDateCalculator {
    pub fn new() -> Self {
        Self
    }

    pub fn compute_due_date(
        &self,
        base_date: NaiveDate,
        treatment: TreatmentKey,
        modifiers: &PatientModifiers,
    ) -> NaiveDate {
        let interval = self.adjusted_interval_days(treatment.base_interval_days(), modifiers);
        base_date + Duration::days(interval)
    }

    /// The first matching risk tier wins; the reduction is applied once no
    /// matter how many risk flags are set.
    pub fn adjusted_interval_days(&self, base_days: i64, modifiers: &PatientModifiers) -> i64 {
        if modifiers.is_smoker || modifiers.perio_risk == PerioRisk::High {
            let reduced = (base_days as f64 * HIGH_RISK_FACTOR).round() as i64;
            reduced.max(MIN_INTERVAL_DAYS)
        } else if modifiers.perio_risk == PerioRisk::Medium {
            (base_days as f64 * MEDIUM_RISK_FACTOR).round() as i64
        } else {
            base_days
        }
    }
}
