use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use chrono_tz::Tz;
use thiserror::Error;
use tracing::warn;

/// First bookable time of day, clinic-local.
pub const OPENING_HOUR: u32 = 7;
/// Last bookable boundary of the day, clinic-local.
pub const CLOSING_HOUR: u32 = 17;
/// Slot granularity.
pub const SLOT_STEP_MINUTES: u32 = 30;
/// Minimum lead time for same-day bookings.
pub const SAME_DAY_LEAD_MINUTES: i64 = 60;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClinicTimeError {
    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),
}

/// Single source of truth for "what time is it at the clinic", independent of
/// the server's local timezone and correct across DST transitions.
#[derive(Debug, Clone, Copy)]
pub struct ClinicClock {
    tz: Tz,
}

impl ClinicClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn from_name(name: &str) -> Result<Self, ClinicTimeError> {
        let tz: Tz = name
            .parse()
            .map_err(|_| ClinicTimeError::UnknownTimezone(name.to_string()))?;
        Ok(Self { tz })
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Convert a clinic-local civil time to its UTC instant.
    ///
    /// The autumn overlap maps to the earliest of the two instants; a time
    /// inside the spring-forward gap lands in the hour after the gap.
    pub fn to_utc(&self, local: NaiveDateTime) -> DateTime<Utc> {
        match self.tz.from_local_datetime(&local) {
            LocalResult::Single(dt) => dt.with_timezone(&Utc),
            LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
            LocalResult::None => {
                let shifted = local + Duration::hours(1);
                match self.tz.from_local_datetime(&shifted) {
                    LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                        dt.with_timezone(&Utc)
                    }
                    LocalResult::None => {
                        warn!("unresolvable local time {}, treating as UTC", local);
                        Utc.from_utc_datetime(&local)
                    }
                }
            }
        }
    }

    /// Convert a UTC instant to the clinic's civil calendar.
    pub fn to_clinic(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.tz).naive_local()
    }

    /// The current calendar date at the clinic.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.to_clinic(now).date()
    }

    /// Parse a clinic-local date/time string into a UTC instant.
    pub fn parse_clinic_datetime(&self, raw: &str) -> Result<DateTime<Utc>, ClinicTimeError> {
        const FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

        for format in FORMATS {
            if let Ok(local) = NaiveDateTime::parse_from_str(raw, format) {
                return Ok(self.to_utc(local));
            }
        }

        Err(ClinicTimeError::InvalidDate(raw.to_string()))
    }

    /// Parse an RFC 3339 instant and convert it to the clinic's civil
    /// calendar.
    pub fn parse_utc_instant(&self, raw: &str) -> Result<NaiveDateTime, ClinicTimeError> {
        DateTime::parse_from_rfc3339(raw)
            .map(|instant| self.to_clinic(instant.with_timezone(&Utc)))
            .map_err(|_| ClinicTimeError::InvalidDate(raw.to_string()))
    }

    /// Format an RFC 3339 instant as clinic-local time. Used directly in UI
    /// contexts, so unparseable input yields the literal `"Invalid date"`
    /// instead of an error.
    pub fn format_clinic_time(&self, raw: &str, pattern: &str) -> String {
        match DateTime::parse_from_rfc3339(raw) {
            Ok(instant) => instant.with_timezone(&self.tz).format(pattern).to_string(),
            Err(_) => "Invalid date".to_string(),
        }
    }

    pub fn format_instant(&self, instant: DateTime<Utc>, pattern: &str) -> String {
        instant.with_timezone(&self.tz).format(pattern).to_string()
    }

    /// Compose a calendar date and an "HH:MM" time-of-day into a UTC instant.
    pub fn appointment_datetime(
        &self,
        date: NaiveDate,
        time: &str,
    ) -> Result<DateTime<Utc>, ClinicTimeError> {
        let parsed = NaiveTime::parse_from_str(time, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
            .map_err(|_| ClinicTimeError::InvalidDate(time.to_string()))?;

        Ok(self.to_utc(date.and_time(parsed)))
    }

    /// Bookable "HH:MM" boundaries for a calendar date, on 30-minute steps
    /// from 07:00 through 17:00. For the clinic's current date, slots closer
    /// than the same-day lead time are dropped.
    pub fn clinic_time_slots(&self, date: NaiveDate, now: DateTime<Utc>) -> Vec<String> {
        let is_today = date == self.today(now);
        let earliest = now + Duration::minutes(SAME_DAY_LEAD_MINUTES);

        let mut slots = Vec::new();
        let mut time = NaiveTime::from_hms_opt(OPENING_HOUR, 0, 0).unwrap();
        let closing = NaiveTime::from_hms_opt(CLOSING_HOUR, 0, 0).unwrap();

        loop {
            if !is_today || self.to_utc(date.and_time(time)) >= earliest {
                slots.push(time.format("%H:%M").to_string());
            }
            if time == closing {
                break;
            }
            time = time + Duration::minutes(SLOT_STEP_MINUTES as i64);
        }

        slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Europe::Brussels;

    fn clock() -> ClinicClock {
        ClinicClock::new(Brussels)
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    #[test]
    fn utc_round_trip_across_dst_boundaries() {
        // Brussels leaves CET at 2024-03-31 01:00 UTC and re-enters it at
        // 2024-10-27 01:00 UTC. Instants inside the autumn overlap hour are
        // deliberately excluded: those are not invertible by design.
        let instants = [
            utc(2024, 3, 30, 22, 0, 0),
            utc(2024, 3, 31, 0, 15, 0),
            utc(2024, 3, 31, 0, 59, 30),
            utc(2024, 3, 31, 1, 0, 0),
            utc(2024, 3, 31, 1, 30, 0),
            utc(2024, 3, 31, 15, 0, 0),
            utc(2024, 10, 26, 23, 30, 0),
            utc(2024, 10, 27, 0, 30, 0),
            utc(2024, 10, 27, 2, 30, 0),
            utc(2024, 10, 27, 22, 45, 0),
        ];

        for instant in instants {
            let round_tripped = clock().to_utc(clock().to_clinic(instant));
            let drift = (round_tripped - instant).num_seconds().abs();
            assert!(drift <= 1, "instant {} drifted by {}s", instant, drift);
        }
    }

    #[test]
    fn clinic_round_trip_for_unambiguous_times() {
        let civil = local(2024, 7, 10, 14, 30);
        assert_eq!(clock().to_clinic(clock().to_utc(civil)), civil);
    }

    #[test]
    fn spring_gap_shifts_forward() {
        // 02:30 does not exist on 2024-03-31 in Brussels; the conversion
        // lands in the hour after the gap.
        let gap = local(2024, 3, 31, 2, 30);
        assert_eq!(clock().to_utc(gap), utc(2024, 3, 31, 1, 30, 0));
    }

    #[test]
    fn autumn_overlap_takes_earliest_instant() {
        let ambiguous = local(2024, 10, 27, 2, 30);
        // Earliest mapping is still CEST (UTC+2).
        assert_eq!(clock().to_utc(ambiguous), utc(2024, 10, 27, 0, 30, 0));
    }

    #[test]
    fn appointment_datetime_composes_in_clinic_zone() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 10).unwrap();
        let instant = clock().appointment_datetime(date, "14:30").unwrap();
        assert_eq!(instant, utc(2024, 7, 10, 12, 30, 0));
    }

    #[test]
    fn appointment_datetime_rejects_garbage() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 10).unwrap();
        assert!(matches!(
            clock().appointment_datetime(date, "half past two"),
            Err(ClinicTimeError::InvalidDate(_))
        ));
    }

    #[test]
    fn parse_clinic_datetime_accepts_common_shapes() {
        let expected = utc(2024, 7, 10, 12, 30, 0);
        assert_eq!(
            clock().parse_clinic_datetime("2024-07-10 14:30").unwrap(),
            expected
        );
        assert_eq!(
            clock().parse_clinic_datetime("2024-07-10T14:30:00").unwrap(),
            expected
        );
        assert!(clock().parse_clinic_datetime("not a date").is_err());
    }

    #[test]
    fn parse_utc_instant_converts_or_rejects() {
        let civil = clock().parse_utc_instant("2024-07-10T12:30:00Z").unwrap();
        assert_eq!(civil, local(2024, 7, 10, 14, 30));
        assert!(matches!(
            clock().parse_utc_instant("yesterday-ish"),
            Err(ClinicTimeError::InvalidDate(_))
        ));
    }

    #[test]
    fn format_clinic_time_is_permissive() {
        let formatted = clock().format_clinic_time("2024-07-10T12:30:00Z", "%H:%M");
        assert_eq!(formatted, "14:30");
        assert_eq!(clock().format_clinic_time("garbage", "%H:%M"), "Invalid date");
    }

    #[test]
    fn full_day_has_twenty_one_slots() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 10).unwrap();
        let now = utc(2024, 6, 1, 9, 0, 0);

        let slots = clock().clinic_time_slots(date, now);
        assert_eq!(slots.len(), 21);
        assert_eq!(slots.first().unwrap(), "07:00");
        assert_eq!(slots.last().unwrap(), "17:00");
    }

    #[test]
    fn same_day_slots_respect_lead_time() {
        // 08:00 UTC is 10:00 in Brussels in July; with a 60-minute lead the
        // first bookable slot is 11:00.
        let date = NaiveDate::from_ymd_opt(2024, 7, 10).unwrap();
        let now = utc(2024, 7, 10, 8, 0, 0);

        let slots = clock().clinic_time_slots(date, now);
        assert_eq!(slots.first().unwrap(), "11:00");
        assert_eq!(slots.len(), 13);
    }
}
