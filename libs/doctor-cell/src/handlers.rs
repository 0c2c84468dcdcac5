use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::error::AppError;

use crate::models::{AvailabilityQuery, AvailabilityResult, DoctorError, TimePreference};
use crate::services::availability::AvailabilityService;

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::DoctorNotFound(_) => AppError::NotFound(err.to_string()),
            DoctorError::InvalidDate(_) => AppError::BadRequest(err.to_string()),
            DoctorError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}

#[axum::debug_handler]
pub async fn check_availability(
    State(service): State<Arc<AvailabilityService>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResult>, AppError> {
    let preference = TimePreference::parse_lenient(query.time_preference.as_deref());

    let result = service
        .check_availability(&query.doctor_name, &query.date, preference)
        .await?;

    Ok(Json(result))
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(service): State<Arc<AvailabilityService>>,
) -> Result<Json<Value>, AppError> {
    let roster = service.doctors().roster().await?;

    Ok(Json(json!({
        "doctors": roster,
        "total": roster.len()
    })))
}
