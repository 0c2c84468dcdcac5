// =====================================================================================
// ANALYTICS MODELS
// =====================================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use doctor_cell::DoctorError;
use shared_database::DatabaseError;
use shared_utils::calendar::CalendarError;

/// Longest span accepted by the date-range report.
pub const MAX_RANGE_DAYS: i64 = 92;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportQuery {
    TodayAppointments,
    TomorrowAppointments,
    YesterdayVisits,
    SummaryReport,
}

impl FromStr for ReportQuery {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "today_appointments" => Ok(ReportQuery::TodayAppointments),
            "tomorrow_appointments" => Ok(ReportQuery::TomorrowAppointments),
            "yesterday_visits" => Ok(ReportQuery::YesterdayVisits),
            "summary_report" => Ok(ReportQuery::SummaryReport),
            other => Err(ReportError::InvalidQuery(other.to_string())),
        }
    }
}

impl fmt::Display for ReportQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportQuery::TodayAppointments => "today_appointments",
            ReportQuery::TomorrowAppointments => "tomorrow_appointments",
            ReportQuery::YesterdayVisits => "yesterday_visits",
            ReportQuery::SummaryReport => "summary_report",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentCount {
    pub date: String,
    pub doctor: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientVisits {
    pub date: String,
    pub doctor: String,
    pub unique_patients: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub doctor: String,
    pub generated_at: String,
    pub report: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeReport {
    pub start_date: String,
    pub end_date: String,
    pub doctor: String,
    pub total_appointments: usize,
    /// Every day of the inclusive range, ascending, zero counts included.
    pub daily_breakdown: Vec<DailyCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Report {
    Count(AppointmentCount),
    Visits(PatientVisits),
    Summary(SummaryReport),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportFilter {
    pub doctor_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RangeQuery {
    pub start_date: String,
    pub end_date: String,
    pub doctor_name: Option<String>,
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Unknown report type '{0}'. Use today_appointments, tomorrow_appointments, yesterday_visits or summary_report")]
    InvalidQuery(String),

    #[error("Doctor {0} not found")]
    DoctorNotFound(String),

    #[error(transparent)]
    InvalidDate(#[from] CalendarError),

    #[error("Invalid date range: {0}")]
    InvalidRange(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<DoctorError> for ReportError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::DoctorNotFound(name) => ReportError::DoctorNotFound(name),
            DoctorError::InvalidDate(e) => ReportError::InvalidDate(e),
            DoctorError::Database(e) => ReportError::Database(e),
        }
    }
}
