// libs/shared/utils/src/calendar.rs
//! Date and time helpers shared by the availability, booking and reporting
//! cells. Everything here is a pure function of its inputs; the current
//! instant is supplied by a [`crate::clock::Clock`].

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use chrono_tz::Tz;
use thiserror::Error;

pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";
pub const SLOT_FORMAT: &str = "%H:%M";
pub const LONG_DATE_FORMAT: &str = "%A, %B %d, %Y";
pub const APPOINTMENT_TIME_FORMAT: &str = "%A, %B %d, %Y at %I:%M %p";

const NAIVE_DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid date/time '{0}', expected ISO 8601 such as 2026-02-17T10:00:00")]
    InvalidDateTime(String),

    #[error("'{time}' is not a slot start, appointments start every {width_minutes} minutes (e.g. 10:00, 10:30)")]
    OffSlotGrid { time: String, width_minutes: i64 },
}

/// Shift `today` by `offset_days` and render it as `YYYY-MM-DD`.
pub fn resolve_relative_date(today: NaiveDate, offset_days: i64) -> String {
    relative_date(today, offset_days).format(ISO_DATE_FORMAT).to_string()
}

pub fn relative_date(today: NaiveDate, offset_days: i64) -> NaiveDate {
    today + Duration::days(offset_days)
}

pub fn parse_iso_date(raw: &str) -> Result<NaiveDate, CalendarError> {
    NaiveDate::parse_from_str(raw.trim(), ISO_DATE_FORMAT)
        .map_err(|_| CalendarError::InvalidDate(raw.to_string()))
}

/// Parse an appointment timestamp into clinic-local wall time at minute precision.
///
/// Naive timestamps are taken as already being in the clinic zone. Timestamps
/// carrying an offset are converted into `tz`.
pub fn parse_appointment_datetime(raw: &str, tz: Tz) -> Result<NaiveDateTime, CalendarError> {
    let trimmed = raw.trim();

    let parsed = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|with_offset| with_offset.with_timezone(&tz).naive_local())
        })
        .ok_or_else(|| CalendarError::InvalidDateTime(raw.to_string()))?;

    truncate_to_minute(parsed).ok_or_else(|| CalendarError::InvalidDateTime(raw.to_string()))
}

fn truncate_to_minute(value: NaiveDateTime) -> Option<NaiveDateTime> {
    value.with_second(0)?.with_nanosecond(0)
}

/// Weekday index used by availability windows: 0 = Monday ... 6 = Sunday.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_monday() as u8
}

pub fn weekday_name(date: NaiveDate) -> String {
    date.format("%A").to_string()
}

pub fn format_long_date(date: NaiveDate) -> String {
    date.format(LONG_DATE_FORMAT).to_string()
}

pub fn format_appointment_time(value: NaiveDateTime) -> String {
    value.format(APPOINTMENT_TIME_FORMAT).to_string()
}

pub fn format_slot(value: NaiveDateTime) -> String {
    value.format(SLOT_FORMAT).to_string()
}

/// Ensure `value` falls on a slot boundary of a grid starting at midnight.
pub fn require_slot_start(value: NaiveDateTime, width_minutes: i64) -> Result<(), CalendarError> {
    let minutes = i64::from(value.hour()) * 60 + i64::from(value.minute());
    if width_minutes > 0 && minutes % width_minutes == 0 && value.second() == 0 && value.nanosecond() == 0 {
        return Ok(());
    }
    Err(CalendarError::OffSlotGrid {
        time: format_slot(value),
        width_minutes,
    })
}

/// Half-open interval test: `[a_start, a_end)` and `[b_start, b_end)` share time.
pub fn intervals_overlap(
    a_start: NaiveDateTime,
    a_end: NaiveDateTime,
    b_start: NaiveDateTime,
    b_end: NaiveDateTime,
) -> bool {
    !(a_end <= b_start || a_start >= b_end)
}

/// Wall-clock instant in `tz` as naive clinic time.
pub fn local_now(tz: Tz) -> NaiveDateTime {
    tz.from_utc_datetime(&chrono::Utc::now().naive_utc()).naive_local()
}

// ==============================================================================
// SLOT ENUMERATION
// ==============================================================================

/// Fixed-width candidate slots between `start` and `end` on one date.
///
/// The sequence is a value: [`SlotSequence::iter`] can be called any number
/// of times and always restarts from the first slot. A slot is only produced
/// when it ends at or before `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSequence {
    start: NaiveDateTime,
    end: NaiveDateTime,
    width: Duration,
}

impl SlotSequence {
    pub fn new(date: NaiveDate, start: NaiveTime, end: NaiveTime, width_minutes: i64) -> Self {
        Self {
            start: date.and_time(start),
            end: date.and_time(end),
            width: Duration::minutes(width_minutes.max(1)),
        }
    }

    pub fn width(&self) -> Duration {
        self.width
    }

    pub fn iter(&self) -> SlotIter {
        SlotIter {
            next: self.start,
            end: self.end,
            width: self.width,
        }
    }
}

impl IntoIterator for SlotSequence {
    type Item = NaiveDateTime;
    type IntoIter = SlotIter;

    fn into_iter(self) -> SlotIter {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub struct SlotIter {
    next: NaiveDateTime,
    end: NaiveDateTime,
    width: Duration,
}

impl Iterator for SlotIter {
    type Item = NaiveDateTime;

    fn next(&mut self) -> Option<NaiveDateTime> {
        let slot_end = self.next + self.width;
        if slot_end > self.end {
            return None;
        }
        let slot = self.next;
        self.next = slot_end;
        Some(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_relative_dates() {
        let today = date(2026, 2, 28);
        assert_eq!(resolve_relative_date(today, 0), "2026-02-28");
        assert_eq!(resolve_relative_date(today, 1), "2026-03-01");
        assert_eq!(resolve_relative_date(today, -1), "2026-02-27");
    }

    #[test]
    fn test_weekday_index_starts_monday() {
        assert_eq!(weekday_index(date(2026, 2, 16)), 0); // Monday
        assert_eq!(weekday_index(date(2026, 2, 20)), 4); // Friday
        assert_eq!(weekday_index(date(2026, 2, 22)), 6); // Sunday
    }

    #[test]
    fn test_parse_iso_date_rejects_garbage() {
        assert_eq!(parse_iso_date("2026-02-17").unwrap(), date(2026, 2, 17));
        assert!(matches!(parse_iso_date("17/02/2026"), Err(CalendarError::InvalidDate(_))));
        assert!(parse_iso_date("2026-02-30").is_err());
    }

    #[test]
    fn test_parse_appointment_datetime_variants() {
        let tz = chrono_tz::Asia::Kolkata;
        let expected = date(2026, 2, 17).and_time(at(10, 0));

        assert_eq!(parse_appointment_datetime("2026-02-17T10:00:00", tz).unwrap(), expected);
        assert_eq!(parse_appointment_datetime("2026-02-17T10:00", tz).unwrap(), expected);
        assert_eq!(parse_appointment_datetime("2026-02-17 10:00", tz).unwrap(), expected);
        assert_eq!(parse_appointment_datetime("2026-02-17T10:00:45", tz).unwrap(), expected);
        // 04:30 UTC is 10:00 in Kolkata
        assert_eq!(parse_appointment_datetime("2026-02-17T04:30:00Z", tz).unwrap(), expected);
        assert!(matches!(
            parse_appointment_datetime("next tuesday at ten", tz),
            Err(CalendarError::InvalidDateTime(_))
        ));
    }

    #[test]
    fn test_require_slot_start() {
        let d = date(2026, 2, 17);
        assert!(require_slot_start(d.and_time(at(10, 0)), 30).is_ok());
        assert!(require_slot_start(d.and_time(at(10, 30)), 30).is_ok());
        assert_eq!(
            require_slot_start(d.and_time(at(10, 7)), 30),
            Err(CalendarError::OffSlotGrid {
                time: "10:07".to_string(),
                width_minutes: 30
            })
        );
        assert!(require_slot_start(d.and_time(at(10, 15)), 30).is_err());
        assert!(require_slot_start(d.and_time(NaiveTime::from_hms_opt(10, 0, 5).unwrap()), 30).is_err());
    }

    #[test]
    fn test_human_formats() {
        let value = date(2026, 2, 17).and_time(at(14, 30));
        assert_eq!(format_long_date(value.date()), "Tuesday, February 17, 2026");
        assert_eq!(format_appointment_time(value), "Tuesday, February 17, 2026 at 02:30 PM");
        assert_eq!(format_slot(value), "14:30");
        assert_eq!(weekday_name(value.date()), "Tuesday");
    }

    #[test]
    fn test_overlap_is_half_open() {
        let d = date(2026, 2, 16);
        let ten = d.and_time(at(10, 0));
        let half_past = d.and_time(at(10, 30));
        let eleven = d.and_time(at(11, 0));

        assert!(intervals_overlap(ten, half_past, ten, half_past));
        assert!(!intervals_overlap(ten, half_past, half_past, eleven));
        assert!(!intervals_overlap(half_past, eleven, ten, half_past));
        assert!(intervals_overlap(ten, eleven, half_past, eleven));
    }

    #[test]
    fn test_slot_sequence_excludes_overrunning_slot() {
        let d = date(2026, 2, 16);
        let slots: Vec<String> = SlotSequence::new(d, at(9, 0), at(10, 45), 30)
            .iter()
            .map(format_slot)
            .collect();
        assert_eq!(slots, vec!["09:00", "09:30", "10:00"]);
    }

    #[test]
    fn test_slot_sequence_is_restartable() {
        let sequence = SlotSequence::new(date(2026, 2, 16), at(9, 0), at(12, 0), 30);
        let first: Vec<_> = sequence.iter().collect();
        let second: Vec<_> = sequence.into_iter().collect();
        assert_eq!(first.len(), 6);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_window_yields_nothing() {
        let sequence = SlotSequence::new(date(2026, 2, 16), at(17, 0), at(17, 0), 30);
        assert_eq!(sequence.iter().count(), 0);
        let inverted = SlotSequence::new(date(2026, 2, 16), at(17, 0), at(12, 0), 30);
        assert_eq!(inverted.iter().count(), 0);
    }
}
