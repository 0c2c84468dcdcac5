use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use shared_database::DatabaseError;
use shared_utils::calendar::CalendarError;

// ==============================================================================
// TIME PREFERENCE
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimePreference {
    Morning,
    Afternoon,
    Evening,
    #[default]
    Any,
}

impl TimePreference {
    pub fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default()
    }

    pub fn five_pm() -> NaiveTime {
        NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default()
    }

    /// Narrow a working window to this preference. The result never extends
    /// past the original window; it may be empty (`start >= end`).
    pub fn clamp(self, start: NaiveTime, end: NaiveTime) -> (NaiveTime, NaiveTime) {
        match self {
            TimePreference::Morning => (start, end.min(Self::noon())),
            TimePreference::Afternoon => (start.max(Self::noon()), end.min(Self::five_pm())),
            TimePreference::Evening => (start.max(Self::five_pm()), end),
            TimePreference::Any => (start, end),
        }
    }

    /// Missing or unrecognised preferences mean `Any`.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.parse().ok()).unwrap_or_default()
    }
}

impl FromStr for TimePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "morning" => Ok(TimePreference::Morning),
            "afternoon" => Ok(TimePreference::Afternoon),
            "evening" => Ok(TimePreference::Evening),
            "any" | "" => Ok(TimePreference::Any),
            other => Err(format!("unknown time preference '{}'", other)),
        }
    }
}

impl fmt::Display for TimePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimePreference::Morning => write!(f, "morning"),
            TimePreference::Afternoon => write!(f, "afternoon"),
            TimePreference::Evening => write!(f, "evening"),
            TimePreference::Any => write!(f, "any"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityQuery {
    pub doctor_name: String,
    pub date: String,
    pub time_preference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityResult {
    pub available: bool,
    pub doctor: String,
    pub doctor_id: i64,
    /// Human readable, e.g. "Monday, February 16, 2026".
    pub date: String,
    /// Free slot start times as `HH:MM`, ascending.
    pub slots: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum DoctorError {
    #[error("Doctor {0} not found")]
    DoctorNotFound(String),

    #[error(transparent)]
    InvalidDate(#[from] CalendarError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn test_clamp_never_widens_window() {
        assert_eq!(TimePreference::Morning.clamp(at(9), at(17)), (at(9), at(12)));
        assert_eq!(TimePreference::Morning.clamp(at(9), at(11)), (at(9), at(11)));
        assert_eq!(TimePreference::Afternoon.clamp(at(9), at(17)), (at(12), at(17)));
        assert_eq!(TimePreference::Afternoon.clamp(at(13), at(20)), (at(13), at(17)));
        assert_eq!(TimePreference::Evening.clamp(at(9), at(20)), (at(17), at(20)));
        assert_eq!(TimePreference::Any.clamp(at(9), at(17)), (at(9), at(17)));
    }

    #[test]
    fn test_evening_on_day_ending_at_five_is_empty() {
        let (start, end) = TimePreference::Evening.clamp(at(9), at(17));
        assert!(start >= end);
    }

    #[test]
    fn test_parse_lenient() {
        assert_eq!(TimePreference::parse_lenient(Some("Morning")), TimePreference::Morning);
        assert_eq!(TimePreference::parse_lenient(Some(" EVENING ")), TimePreference::Evening);
        assert_eq!(TimePreference::parse_lenient(Some("brunch")), TimePreference::Any);
        assert_eq!(TimePreference::parse_lenient(None), TimePreference::Any);
    }
}
