// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use shared_models::error::AppError;

use crate::models::{AppointmentError, BookAppointmentRequest, BookingConfirmation};
use crate::services::booking::BookingService;

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::DoctorNotFound(_) => AppError::NotFound(err.to_string()),
            AppointmentError::InvalidDateTime(_) => AppError::BadRequest(err.to_string()),
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::SlotUnavailable(_) => AppError::Conflict(err.to_string()),
            AppointmentError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(service): State<Arc<BookingService>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<BookingConfirmation>), AppError> {
    let booked = service.book_appointment(&request).await?;

    Ok((StatusCode::CREATED, Json(booked.confirmation())))
}
