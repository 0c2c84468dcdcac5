// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono_tz::Tz;
use tracing::{debug, info, warn};

use doctor_cell::DoctorService;
use shared_database::{ClinicStore, DatabaseError};
use shared_models::{NewAppointment, SLOT_MINUTES};
use shared_utils::calendar::{format_appointment_time, parse_appointment_datetime, require_slot_start};

use crate::models::{AppointmentError, BookAppointmentRequest, BookedAppointment};
use crate::services::conflict::find_conflict;

pub struct BookingService {
    store: Arc<dyn ClinicStore>,
    doctors: DoctorService,
    timezone: Tz,
}

impl BookingService {
    pub fn new(store: Arc<dyn ClinicStore>, timezone: Tz) -> Self {
        Self {
            doctors: DoctorService::new(Arc::clone(&store)),
            store,
            timezone,
        }
    }

    /// Book one 30-minute slot.
    ///
    /// The overlap check here only gives a friendlier early answer. The store's
    /// insert is what serializes concurrent bookings; losing that race surfaces
    /// as [`AppointmentError::SlotUnavailable`] as well.
    pub async fn book_appointment(
        &self,
        request: &BookAppointmentRequest,
    ) -> Result<BookedAppointment, AppointmentError> {
        validate_patient(&request.patient_name, &request.patient_email)?;

        let doctor = self.doctors.resolve_doctor(&request.doctor_name).await?;
        let start = parse_appointment_datetime(&request.appointment_datetime, self.timezone)?;
        // the store's unique start index only excludes overlaps on the slot grid
        require_slot_start(start, SLOT_MINUTES)?;

        info!("Booking appointment with {} at {}", doctor.name, start);

        let new_appointment = NewAppointment::scheduled_slot(
            doctor.id,
            request.patient_name.trim(),
            request.patient_email.trim(),
            start,
        );

        let existing = self.store.scheduled_appointments_on(Some(doctor.id), start.date()).await?;
        if let Some(clash) = find_conflict(&existing, start, new_appointment.end_time()) {
            warn!(
                "Slot {} for {} overlaps appointment {}",
                start, doctor.name, clash.id
            );
            return Err(AppointmentError::SlotUnavailable(format_appointment_time(start)));
        }

        let appointment = match self.store.insert_appointment(new_appointment).await {
            Ok(appointment) => appointment,
            Err(DatabaseError::Conflict(detail)) => {
                warn!("Lost booking race for {} at {}: {}", doctor.name, start, detail);
                return Err(AppointmentError::SlotUnavailable(format_appointment_time(start)));
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            "Appointment {} booked with {} for {}",
            appointment.id, doctor.name, appointment.patient_email
        );

        Ok(BookedAppointment { doctor, appointment })
    }
}

fn validate_patient(name: &str, email: &str) -> Result<(), AppointmentError> {
    if name.trim().is_empty() {
        return Err(AppointmentError::ValidationError("patient_name is required".to_string()));
    }

    let email = email.trim();
    let valid_email = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && !domain.is_empty())
        .unwrap_or(false);

    if !valid_email {
        debug!("Rejecting patient email '{}'", email);
        return Err(AppointmentError::ValidationError(format!(
            "'{}' is not a valid email address",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_validate_patient() {
        assert!(validate_patient("Asha", "asha@example.com").is_ok());
        assert_matches!(validate_patient("  ", "asha@example.com"), Err(AppointmentError::ValidationError(_)));
        assert_matches!(validate_patient("Asha", "asha.example.com"), Err(AppointmentError::ValidationError(_)));
        assert_matches!(validate_patient("Asha", "@example.com"), Err(AppointmentError::ValidationError(_)));
    }
}
