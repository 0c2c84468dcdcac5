// libs/notification-cell/src/services/calendar.rs
use async_trait::async_trait;
use chrono::Duration;
use chrono_tz::Tz;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_models::{Appointment, Doctor};

use crate::models::{NotificationChannel, NotificationError, NotificationEvent};
use crate::services::{ensure_success, Notifier};

const EVENT_COLOR_ID: &str = "2";
const EMAIL_REMINDER_MINUTES: i64 = 24 * 60;
const POPUP_REMINDER_MINUTES: i64 = 30;

/// Google Calendar v3 `events.insert` with a pre-issued OAuth access token.
pub struct CalendarNotifier {
    client: Client,
    calendar_id: String,
    access_token: String,
    base_url: String,
    timezone: Tz,
}

impl CalendarNotifier {
    pub fn from_config(config: &AppConfig) -> Option<Self> {
        if !config.is_calendar_configured() {
            return None;
        }

        Some(Self {
            client: Client::new(),
            calendar_id: config.google_calendar_id.clone(),
            access_token: config.google_calendar_access_token.clone(),
            base_url: config.google_calendar_base_url.trim_end_matches('/').to_string(),
            timezone: config.clinic_timezone,
        })
    }

    fn event_body(&self, doctor: &Doctor, appointment: &Appointment) -> Value {
        let start = appointment.appointment_time;
        let end = start + Duration::minutes(i64::from(appointment.duration_minutes));
        let zone = self.timezone.name();

        json!({
            "summary": format!("Appointment: {}", appointment.patient_name),
            "description": format!(
                "Medical appointment with {}\n\nPatient Email: {}\nDoctor: {} ({})",
                appointment.patient_name, appointment.patient_email, doctor.name, doctor.email
            ),
            "start": {
                "dateTime": start.format("%Y-%m-%dT%H:%M:%S").to_string(),
                "timeZone": zone,
            },
            "end": {
                "dateTime": end.format("%Y-%m-%dT%H:%M:%S").to_string(),
                "timeZone": zone,
            },
            "reminders": {
                "useDefault": false,
                "overrides": [
                    { "method": "email", "minutes": EMAIL_REMINDER_MINUTES },
                    { "method": "popup", "minutes": POPUP_REMINDER_MINUTES },
                ],
            },
            "colorId": EVENT_COLOR_ID,
        })
    }
}

#[async_trait]
impl Notifier for CalendarNotifier {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Calendar
    }

    fn accepts(&self, event: &NotificationEvent) -> bool {
        matches!(event, NotificationEvent::AppointmentBooked { .. })
    }

    async fn notify(&self, event: &NotificationEvent) -> Result<(), NotificationError> {
        let NotificationEvent::AppointmentBooked { doctor, appointment } = event else {
            return Ok(());
        };

        let url = format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(&self.calendar_id)
        );
        debug!("Creating calendar event for appointment {} at {}", appointment.id, url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&self.event_body(doctor, appointment))
            .send()
            .await?;

        let created: Value = ensure_success(self.channel(), response).await?.json().await?;

        info!(
            "Calendar event {} created for appointment {}",
            created["id"].as_str().unwrap_or("<unknown>"),
            appointment.id
        );
        Ok(())
    }
}
