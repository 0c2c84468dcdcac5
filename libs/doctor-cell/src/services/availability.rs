use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{debug, info};

use shared_database::ClinicStore;
use shared_models::{Appointment, SLOT_MINUTES};
use shared_utils::calendar::{
    format_long_date, intervals_overlap, parse_iso_date, weekday_index, weekday_name, SlotSequence,
    SLOT_FORMAT,
};

use crate::models::{AvailabilityResult, DoctorError, TimePreference};
use crate::services::doctor::DoctorService;

pub struct AvailabilityService {
    store: Arc<dyn ClinicStore>,
    doctors: DoctorService,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn ClinicStore>) -> Self {
        Self {
            doctors: DoctorService::new(Arc::clone(&store)),
            store,
        }
    }

    pub fn doctors(&self) -> &DoctorService {
        &self.doctors
    }

    /// Free 30-minute slots for a doctor on one date.
    ///
    /// Read-only. A slot reported free here can still be lost to a concurrent
    /// booking; the booking path enforces uniqueness.
    pub async fn check_availability(
        &self,
        doctor_name: &str,
        date: &str,
        time_preference: TimePreference,
    ) -> Result<AvailabilityResult, DoctorError> {
        let doctor = self.doctors.resolve_doctor(doctor_name).await?;
        let date = parse_iso_date(date)?;
        let weekday = weekday_index(date);

        debug!(
            "Checking availability for {} on {} (weekday {}, preference {})",
            doctor.name, date, weekday, time_preference
        );

        let Some(window) = self.store.availability_window(doctor.id, weekday).await? else {
            info!("{} has no working hours on {}", doctor.name, weekday_name(date));
            return Ok(AvailabilityResult {
                available: false,
                reason: Some(format!("{} is not available on {}", doctor.name, weekday_name(date))),
                doctor: doctor.name,
                doctor_id: doctor.id,
                date: format_long_date(date),
                slots: Vec::new(),
            });
        };

        let (start, end) = time_preference.clamp(window.start_time, window.end_time);
        let booked = self.store.scheduled_appointments_on(Some(doctor.id), date).await?;
        let slots: Vec<String> = free_slots(date, start, end, &booked)
            .into_iter()
            .map(|slot| slot.format(SLOT_FORMAT).to_string())
            .collect();

        debug!("{} has {} free slots on {}", doctor.name, slots.len(), date);

        Ok(AvailabilityResult {
            available: !slots.is_empty(),
            doctor: doctor.name,
            doctor_id: doctor.id,
            date: format_long_date(date),
            slots,
            reason: None,
        })
    }
}

/// Candidate slots in `[start, end)` that overlap none of `booked`.
///
/// An empty or inverted range yields no slots.
pub fn free_slots(
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    booked: &[Appointment],
) -> Vec<NaiveDateTime> {
    let candidates = SlotSequence::new(date, start, end, SLOT_MINUTES);
    let width = candidates.width();

    candidates
        .iter()
        .filter(|slot| {
            !booked.iter().any(|apt| {
                apt.is_scheduled()
                    && intervals_overlap(*slot, *slot + width, apt.appointment_time, apt.end_time())
            })
        })
        .collect()
}
