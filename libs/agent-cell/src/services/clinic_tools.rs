use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use analytics_cell::{Report, ReportError, ReportQuery, ReportService};
use appointment_cell::{AppointmentError, BookAppointmentRequest, BookingService};
use doctor_cell::{AvailabilityService, DoctorError, TimePreference};
use notification_cell::{NotificationChannel, NotificationDispatcher, NotificationEvent};

use crate::models::ToolErrorKind;
use crate::services::tools::{decode_args, ToolDefinition, ToolError, ToolHandler, ToolRegistry};

pub const CHECK_AVAILABILITY: &str = "check_availability";
pub const BOOK_APPOINTMENT: &str = "book_appointment";
pub const GET_REPORT: &str = "get_report";

const SUMMARY_REPORT_TITLE: &str = "Doctor Summary Report";

/// Registry with the three clinic tools.
pub fn clinic_tool_registry(
    availability: Arc<AvailabilityService>,
    booking: Arc<BookingService>,
    reports: Arc<ReportService>,
    notifications: Arc<NotificationDispatcher>,
) -> ToolRegistry {
    ToolRegistry::new()
        .with(Arc::new(CheckAvailabilityTool::new(availability)))
        .with(Arc::new(BookAppointmentTool::new(booking, Arc::clone(&notifications))))
        .with(Arc::new(GetReportTool::new(reports, notifications)))
}

// ==============================================================================
// ERROR MAPPING
// ==============================================================================

impl From<DoctorError> for ToolError {
    fn from(err: DoctorError) -> Self {
        let kind = match err {
            DoctorError::DoctorNotFound(_) => ToolErrorKind::DoctorNotFound,
            DoctorError::InvalidDate(_) => ToolErrorKind::InvalidDateTime,
            DoctorError::Database(_) => ToolErrorKind::TransportFailure,
        };
        ToolError::new(kind, err.to_string())
    }
}

impl From<AppointmentError> for ToolError {
    fn from(err: AppointmentError) -> Self {
        let kind = match err {
            AppointmentError::DoctorNotFound(_) => ToolErrorKind::DoctorNotFound,
            AppointmentError::InvalidDateTime(_) => ToolErrorKind::InvalidDateTime,
            AppointmentError::SlotUnavailable(_) => ToolErrorKind::SlotUnavailable,
            AppointmentError::ValidationError(_) => ToolErrorKind::ValidationError,
            AppointmentError::Database(_) => ToolErrorKind::TransportFailure,
        };
        ToolError::new(kind, err.to_string())
    }
}

impl From<ReportError> for ToolError {
    fn from(err: ReportError) -> Self {
        let kind = match err {
            ReportError::InvalidQuery(_) => ToolErrorKind::InvalidQuery,
            ReportError::DoctorNotFound(_) => ToolErrorKind::DoctorNotFound,
            ReportError::InvalidDate(_) | ReportError::InvalidRange(_) => ToolErrorKind::InvalidDateTime,
            ReportError::Database(_) => ToolErrorKind::TransportFailure,
        };
        ToolError::new(kind, err.to_string())
    }
}

fn to_payload<T: serde::Serialize>(value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value).map_err(|e| ToolError::new(ToolErrorKind::Internal, e.to_string()))
}

// ==============================================================================
// check_availability
// ==============================================================================

#[derive(Debug, Deserialize)]
struct CheckAvailabilityArgs {
    doctor_name: String,
    date: String,
    #[serde(default)]
    time_preference: Option<String>,
}

pub struct CheckAvailabilityTool {
    availability: Arc<AvailabilityService>,
}

impl CheckAvailabilityTool {
    pub fn new(availability: Arc<AvailabilityService>) -> Self {
        Self { availability }
    }
}

#[async_trait]
impl ToolHandler for CheckAvailabilityTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: CHECK_AVAILABILITY.to_string(),
            description: "Check a doctor's free 30-minute slots on a date".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "doctor_name": { "type": "string", "description": "Doctor name, e.g. Dr. Ahuja" },
                    "date": { "type": "string", "description": "Date as YYYY-MM-DD" },
                    "time_preference": {
                        "type": "string",
                        "enum": ["morning", "afternoon", "evening", "any"]
                    }
                },
                "required": ["doctor_name", "date"]
            }),
        }
    }

    async fn call(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: CheckAvailabilityArgs = decode_args(CHECK_AVAILABILITY, arguments)?;
        let preference = TimePreference::parse_lenient(args.time_preference.as_deref());

        let result = self
            .availability
            .check_availability(&args.doctor_name, &args.date, preference)
            .await?;

        to_payload(&result)
    }
}

// ==============================================================================
// book_appointment
// ==============================================================================

pub struct BookAppointmentTool {
    booking: Arc<BookingService>,
    notifications: Arc<NotificationDispatcher>,
}

impl BookAppointmentTool {
    pub fn new(booking: Arc<BookingService>, notifications: Arc<NotificationDispatcher>) -> Self {
        Self { booking, notifications }
    }
}

#[async_trait]
impl ToolHandler for BookAppointmentTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: BOOK_APPOINTMENT.to_string(),
            description: "Book a 30-minute appointment for a patient".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "doctor_name": { "type": "string" },
                    "patient_name": { "type": "string" },
                    "patient_email": { "type": "string" },
                    "appointment_datetime": {
                        "type": "string",
                        "description": "ISO 8601 start time, e.g. 2026-02-17T10:00:00"
                    }
                },
                "required": ["doctor_name", "patient_name", "patient_email", "appointment_datetime"]
            }),
        }
    }

    async fn call(&self, arguments: Value) -> Result<Value, ToolError> {
        let request: BookAppointmentRequest = decode_args(BOOK_APPOINTMENT, arguments)?;
        let booked = self.booking.book_appointment(&request).await?;

        let delivery = self
            .notifications
            .dispatch(&NotificationEvent::AppointmentBooked {
                doctor: booked.doctor.clone(),
                appointment: booked.appointment.clone(),
            })
            .await;

        let mut payload = to_payload(&booked.confirmation())?;
        if let Some(fields) = payload.as_object_mut() {
            fields.insert(
                "calendar_event_created".to_string(),
                json!(delivery.delivered(NotificationChannel::Calendar)),
            );
            fields.insert(
                "email_sent".to_string(),
                json!(delivery.delivered(NotificationChannel::Email)),
            );
        }

        Ok(payload)
    }
}

// ==============================================================================
// get_report
// ==============================================================================

#[derive(Debug, Deserialize)]
struct GetReportArgs {
    query_type: String,
    #[serde(default)]
    doctor_name: Option<String>,
}

pub struct GetReportTool {
    reports: Arc<ReportService>,
    notifications: Arc<NotificationDispatcher>,
}

impl GetReportTool {
    pub fn new(reports: Arc<ReportService>, notifications: Arc<NotificationDispatcher>) -> Self {
        Self { reports, notifications }
    }
}

#[async_trait]
impl ToolHandler for GetReportTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: GET_REPORT.to_string(),
            description: "Appointment counts, patient visits and summary reports".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query_type": {
                        "type": "string",
                        "enum": ["today_appointments", "tomorrow_appointments", "yesterday_visits", "summary_report"]
                    },
                    "doctor_name": { "type": "string", "description": "Optional doctor filter" }
                },
                "required": ["query_type"]
            }),
        }
    }

    async fn call(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: GetReportArgs = decode_args(GET_REPORT, arguments)?;
        let query: ReportQuery = args.query_type.parse()?;

        match self.reports.report(query, args.doctor_name.as_deref()).await? {
            Report::Summary(summary) => {
                let delivery = self
                    .notifications
                    .dispatch(&NotificationEvent::SummaryReport {
                        title: SUMMARY_REPORT_TITLE.to_string(),
                        body: summary.report.clone(),
                    })
                    .await;
                let sent_to_slack = delivery.delivered(NotificationChannel::Slack);
                info!("Summary report for {} (slack: {})", summary.doctor, sent_to_slack);

                Ok(json!({
                    "report": summary.report,
                    "sent_to_slack": sent_to_slack,
                }))
            }
            other => to_payload(&other),
        }
    }
}
