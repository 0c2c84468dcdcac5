use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::{Appointment, Doctor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Calendar,
    Email,
    Slack,
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationChannel::Calendar => write!(f, "calendar"),
            NotificationChannel::Email => write!(f, "email"),
            NotificationChannel::Slack => write!(f, "slack"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationEvent {
    AppointmentBooked {
        doctor: Doctor,
        appointment: Appointment,
    },
    SummaryReport {
        title: String,
        body: String,
    },
}

impl NotificationEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationEvent::AppointmentBooked { .. } => "appointment_booked",
            NotificationEvent::SummaryReport { .. } => "summary_report",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryOutcome {
    pub channel: NotificationChannel,
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Per-channel results of one dispatch. Channels that did not accept the
/// event (or are not configured) are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub outcomes: Vec<DeliveryOutcome>,
}

impl DispatchReport {
    pub fn delivered(&self, channel: NotificationChannel) -> bool {
        self.outcomes
            .iter()
            .any(|outcome| outcome.channel == channel && outcome.delivered)
    }

    pub fn attempted(&self, channel: NotificationChannel) -> bool {
        self.outcomes.iter().any(|outcome| outcome.channel == channel)
    }
}

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("{0} notifications are not configured")]
    NotConfigured(NotificationChannel),

    #[error("{channel} API error: HTTP {status}: {message}")]
    Api {
        channel: NotificationChannel,
        status: u16,
        message: String,
    },

    #[error("{channel} rejected the request: {message}")]
    Rejected {
        channel: NotificationChannel,
        message: String,
    },

    #[error("{0} notification timed out")]
    Timeout(NotificationChannel),

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),
}
