use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use shared_config::AppConfig;
use shared_models::{Appointment, AvailabilityWindow, Doctor, NewAppointment};

use crate::error::DatabaseError;
use crate::store::ClinicStore;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            api_key: config.supabase_service_key.clone(),
        }
    }

    fn get_headers(&self) -> Result<HeaderMap, DatabaseError> {
        let mut headers = HeaderMap::new();

        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|e| DatabaseError::InvalidHeader(e.to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| DatabaseError::InvalidHeader(e.to_string()))?;

        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, DatabaseError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, DatabaseError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        let mut headers = self.get_headers()?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => DatabaseError::Auth(error_text),
                404 => DatabaseError::NotFound(error_text),
                409 => DatabaseError::Conflict(error_text),
                code => DatabaseError::Api {
                    status: code,
                    message: error_text,
                },
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }
}

/// PostgREST-backed store.
///
/// The double-booking guard is the partial unique index on
/// `appointments (doctor_id, appointment_time) WHERE status = 'scheduled'`
/// (see `schema.sql`); PostgREST reports its violation as HTTP 409.
pub struct SupabaseClinicStore {
    supabase: SupabaseClient,
}

impl SupabaseClinicStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }
}

#[async_trait]
impl ClinicStore for SupabaseClinicStore {
    async fn list_doctors(&self) -> Result<Vec<Doctor>, DatabaseError> {
        self.supabase
            .request(Method::GET, "/rest/v1/doctors?order=id.asc", None)
            .await
    }

    async fn availability_windows(&self, doctor_id: i64) -> Result<Vec<AvailabilityWindow>, DatabaseError> {
        let path = format!(
            "/rest/v1/doctor_availability?doctor_id=eq.{}&order=day_of_week.asc",
            doctor_id
        );
        self.supabase.request(Method::GET, &path, None).await
    }

    async fn availability_window(
        &self,
        doctor_id: i64,
        day_of_week: u8,
    ) -> Result<Option<AvailabilityWindow>, DatabaseError> {
        let path = format!(
            "/rest/v1/doctor_availability?doctor_id=eq.{}&day_of_week=eq.{}&limit=1",
            doctor_id, day_of_week
        );
        let windows: Vec<AvailabilityWindow> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(windows.into_iter().next())
    }

    async fn scheduled_appointments_on(
        &self,
        doctor_id: Option<i64>,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, DatabaseError> {
        let day_start = date.and_hms_opt(0, 0, 0).unwrap_or_default();
        let next_day_start = day_start + Duration::days(1);

        let mut path = format!(
            "/rest/v1/appointments?appointment_time=gte.{}&appointment_time=lt.{}&status=eq.scheduled&order=appointment_time.asc",
            day_start.format(TIMESTAMP_FORMAT),
            next_day_start.format(TIMESTAMP_FORMAT),
        );
        if let Some(id) = doctor_id {
            path.push_str(&format!("&doctor_id=eq.{}", id));
        }

        self.supabase.request(Method::GET, &path, None).await
    }

    async fn insert_appointment(&self, appointment: NewAppointment) -> Result<Appointment, DatabaseError> {
        debug!(
            "Inserting appointment for doctor {} at {}",
            appointment.doctor_id, appointment.appointment_time
        );

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let body = serde_json::to_value(&appointment)?;
        let result: Vec<Appointment> = self
            .supabase
            .request_with_headers(Method::POST, "/rest/v1/appointments", Some(body), Some(headers))
            .await
            .map_err(|e| {
                if e.is_conflict() {
                    warn!(
                        "Unique slot constraint rejected doctor {} at {}",
                        appointment.doctor_id, appointment.appointment_time
                    );
                }
                e
            })?;

        result.into_iter().next().ok_or_else(|| DatabaseError::Api {
            status: 201,
            message: "Insert returned no representation".to_string(),
        })
    }
}
