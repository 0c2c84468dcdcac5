// libs/shared/models/src/clinic.rs
use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed width of a bookable slot.
pub const SLOT_MINUTES: i64 = 30;

// ==============================================================================
// ROSTER
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub name: String,
    pub specialization: String,
    pub email: String,
}

/// Working hours of one doctor on one weekday (0 = Monday ... 6 = Sunday).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub doctor_id: i64,
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub doctor_id: i64,
    pub patient_name: String,
    pub patient_email: String,
    pub appointment_time: NaiveDateTime,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
}

impl Appointment {
    pub fn end_time(&self) -> NaiveDateTime {
        self.appointment_time + Duration::minutes(self.duration_minutes as i64)
    }

    pub fn is_scheduled(&self) -> bool {
        self.status == AppointmentStatus::Scheduled
    }
}

/// Insert payload; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub doctor_id: i64,
    pub patient_name: String,
    pub patient_email: String,
    pub appointment_time: NaiveDateTime,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
}

impl NewAppointment {
    pub fn scheduled_slot(
        doctor_id: i64,
        patient_name: impl Into<String>,
        patient_email: impl Into<String>,
        appointment_time: NaiveDateTime,
    ) -> Self {
        Self {
            doctor_id,
            patient_name: patient_name.into(),
            patient_email: patient_email.into(),
            appointment_time,
            duration_minutes: SLOT_MINUTES as i32,
            status: AppointmentStatus::Scheduled,
        }
    }

    pub fn end_time(&self) -> NaiveDateTime {
        self.appointment_time + Duration::minutes(self.duration_minutes as i64)
    }

    pub fn into_appointment(self, id: i64) -> Appointment {
        Appointment {
            id,
            doctor_id: self.doctor_id,
            patient_name: self.patient_name,
            patient_email: self.patient_email,
            appointment_time: self.appointment_time,
            duration_minutes: self.duration_minutes,
            status: self.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_scheduled_slot_is_thirty_minutes() {
        let start = NaiveDate::from_ymd_opt(2026, 2, 17).unwrap().and_hms_opt(10, 0, 0).unwrap();
        let new = NewAppointment::scheduled_slot(1, "Asha", "asha@example.com", start);
        assert_eq!(new.duration_minutes, 30);
        assert_eq!(new.end_time(), start + Duration::minutes(30));

        let appointment = new.into_appointment(7);
        assert_eq!(appointment.id, 7);
        assert!(appointment.is_scheduled());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&AppointmentStatus::Cancelled).unwrap(), "\"cancelled\"");
        assert_eq!(AppointmentStatus::Scheduled.to_string(), "scheduled");
    }
}
