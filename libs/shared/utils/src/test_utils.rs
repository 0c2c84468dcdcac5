use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::json;

use shared_config::AppConfig;

use crate::clock::FixedClock;

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub external_base_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
            external_base_url: "http://localhost:54322".to_string(),
        }
    }
}

impl TestConfig {
    /// Point every outbound integration at one mock server.
    pub fn with_mock_server(uri: &str) -> Self {
        Self {
            supabase_url: uri.to_string(),
            supabase_service_key: "test-service-key".to_string(),
            external_base_url: uri.to_string(),
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            openai_api_key: "test-openai-key".to_string(),
            openai_base_url: self.external_base_url.clone(),
            google_calendar_id: "clinic@example.com".to_string(),
            google_calendar_access_token: "test-calendar-token".to_string(),
            google_calendar_base_url: self.external_base_url.clone(),
            sendgrid_api_key: "test-sendgrid-key".to_string(),
            email_sender: "appointments@example.com".to_string(),
            email_api_base_url: self.external_base_url.clone(),
            slack_bot_token: "xoxb-test".to_string(),
            slack_channel_id: "C0REPORTS".to_string(),
            slack_api_base_url: self.external_base_url.clone(),
            ..AppConfig::default()
        }
    }
}

/// Parse `YYYY-MM-DDTHH:MM` test literals.
pub fn clinic_time(raw: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .unwrap_or_else(|e| panic!("bad test timestamp {raw}: {e}"))
}

pub fn clinic_date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap_or_else(|e| panic!("bad test date {raw}: {e}"))
}

pub fn fixed_clock(raw: &str) -> Arc<FixedClock> {
    Arc::new(FixedClock::new(clinic_time(raw)))
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn doctor_response(id: i64, name: &str, specialization: &str, email: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "specialization": specialization,
            "email": email
        })
    }

    pub fn availability_response(doctor_id: i64, day_of_week: u8, start: &str, end: &str) -> serde_json::Value {
        json!({
            "doctor_id": doctor_id,
            "day_of_week": day_of_week,
            "start_time": start,
            "end_time": end
        })
    }

    pub fn appointment_response(id: i64, doctor_id: i64, appointment_time: &str, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "doctor_id": doctor_id,
            "patient_name": "Test Patient",
            "patient_email": "patient@example.com",
            "appointment_time": appointment_time,
            "duration_minutes": 30,
            "status": status
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code,
            "details": null,
            "hint": null
        })
    }
}
