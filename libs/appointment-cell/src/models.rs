// libs/appointment-cell/src/models.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;

use doctor_cell::DoctorError;
use shared_database::DatabaseError;
use shared_models::{Appointment, Doctor};
use shared_utils::calendar::{format_appointment_time, CalendarError};

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_name: String,
    pub patient_name: String,
    pub patient_email: String,
    /// ISO 8601, e.g. `2026-02-17T10:00:00`.
    pub appointment_datetime: String,
}

/// A stored appointment together with the doctor it was booked with.
#[derive(Debug, Clone, PartialEq)]
pub struct BookedAppointment {
    pub doctor: Doctor,
    pub appointment: Appointment,
}

impl BookedAppointment {
    pub fn confirmation(&self) -> BookingConfirmation {
        BookingConfirmation {
            success: true,
            appointment_id: self.appointment.id,
            doctor: self.doctor.name.clone(),
            doctor_email: self.doctor.email.clone(),
            patient: self.appointment.patient_name.clone(),
            patient_email: self.appointment.patient_email.clone(),
            time: self.appointment.appointment_time.format("%Y-%m-%dT%H:%M:%S").to_string(),
            formatted_time: format_appointment_time(self.appointment.appointment_time),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub success: bool,
    pub appointment_id: i64,
    pub doctor: String,
    pub doctor_email: String,
    pub patient: String,
    pub patient_email: String,
    pub time: String,
    pub formatted_time: String,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Doctor {0} not found")]
    DoctorNotFound(String),

    #[error(transparent)]
    InvalidDateTime(#[from] CalendarError),

    #[error("The slot at {0} is already booked. Please choose a different time.")]
    SlotUnavailable(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<DoctorError> for AppointmentError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::DoctorNotFound(name) => AppointmentError::DoctorNotFound(name),
            DoctorError::InvalidDate(e) => AppointmentError::InvalidDateTime(e),
            DoctorError::Database(e) => AppointmentError::Database(e),
        }
    }
}
