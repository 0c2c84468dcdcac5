// libs/notification-cell/src/services/email.rs
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_models::{Appointment, Doctor};
use shared_utils::calendar::format_appointment_time;

use crate::models::{NotificationChannel, NotificationError, NotificationEvent};
use crate::services::{ensure_success, Notifier};

const SENDER_NAME: &str = "Clinic Appointments";

/// Patient confirmation mail through the SendGrid v3 `mail/send` API.
pub struct EmailNotifier {
    client: Client,
    api_key: String,
    sender: String,
    base_url: String,
}

impl EmailNotifier {
    pub fn from_config(config: &AppConfig) -> Option<Self> {
        if !config.is_email_configured() {
            return None;
        }

        Some(Self {
            client: Client::new(),
            api_key: config.sendgrid_api_key.clone(),
            sender: config.email_sender.clone(),
            base_url: config.email_api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn message_body(&self, doctor: &Doctor, appointment: &Appointment) -> Value {
        json!({
            "personalizations": [{
                "to": [{
                    "email": appointment.patient_email,
                    "name": appointment.patient_name,
                }],
            }],
            "from": {
                "email": self.sender,
                "name": SENDER_NAME,
            },
            "subject": format!("Appointment Confirmed - {}", doctor.name),
            "content": [{
                "type": "text/plain",
                "value": confirmation_text(doctor, appointment),
            }],
        })
    }
}

pub fn confirmation_text(doctor: &Doctor, appointment: &Appointment) -> String {
    format!(
        "Dear {patient},\n\n\
         Your appointment has been confirmed.\n\n\
         APPOINTMENT DETAILS\n\
         Doctor  : {doctor} ({specialization})\n\
         Patient : {patient}\n\
         Time    : {time}\n\
         Booking : #{id}\n\n\
         Please arrive 10 minutes early and bring any previous medical records and a valid ID.\n\
         If you need to reschedule or cancel, please contact the clinic.\n",
        patient = appointment.patient_name,
        doctor = doctor.name,
        specialization = doctor.specialization,
        time = format_appointment_time(appointment.appointment_time),
        id = appointment.id,
    )
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Email
    }

    fn accepts(&self, event: &NotificationEvent) -> bool {
        matches!(event, NotificationEvent::AppointmentBooked { .. })
    }

    async fn notify(&self, event: &NotificationEvent) -> Result<(), NotificationError> {
        let NotificationEvent::AppointmentBooked { doctor, appointment } = event else {
            return Ok(());
        };

        let url = format!("{}/mail/send", self.base_url);
        debug!("Sending confirmation for appointment {} to {}", appointment.id, appointment.patient_email);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.message_body(doctor, appointment))
            .send()
            .await?;

        ensure_success(self.channel(), response).await?;

        info!("Confirmation email sent to {}", appointment.patient_email);
        Ok(())
    }
}
