use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use shared_models::{Appointment, AvailabilityWindow, Doctor, NewAppointment};
use shared_utils::calendar::intervals_overlap;

use crate::error::DatabaseError;
use crate::store::ClinicStore;

#[derive(Debug)]
struct ClinicState {
    doctors: Vec<Doctor>,
    windows: Vec<AvailabilityWindow>,
    appointments: Vec<Appointment>,
    next_id: i64,
}

/// Process-local store. All writes go through one lock, so the
/// check-then-insert in [`ClinicStore::insert_appointment`] is serialized.
pub struct InMemoryClinicStore {
    state: RwLock<ClinicState>,
}

impl InMemoryClinicStore {
    pub fn new(doctors: Vec<Doctor>, windows: Vec<AvailabilityWindow>) -> Self {
        let mut doctors = doctors;
        doctors.sort_by_key(|doctor| doctor.id);

        Self {
            state: RwLock::new(ClinicState {
                doctors,
                windows,
                appointments: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// The clinic's static roster: Dr. Ahuja (Cardiology) Mon-Wed 09-17 and
    /// Fri 09-12, Dr. Sharma (Pediatrics) Mon-Fri 09-17.
    pub fn with_default_roster() -> Self {
        let doctors = vec![
            Doctor {
                id: 1,
                name: "Dr. Ahuja".to_string(),
                specialization: "Cardiology".to_string(),
                email: "ahuja@clinic.example".to_string(),
            },
            Doctor {
                id: 2,
                name: "Dr. Sharma".to_string(),
                specialization: "Pediatrics".to_string(),
                email: "sharma@clinic.example".to_string(),
            },
        ];

        let mut windows = Vec::new();
        for day in [0, 1, 2] {
            windows.push(window(1, day, 9, 17));
        }
        windows.push(window(1, 4, 9, 12));
        for day in 0..5 {
            windows.push(window(2, day, 9, 17));
        }

        Self::new(doctors, windows)
    }

    /// Insert without the overlap guard. Used to load historical or cancelled
    /// rows.
    pub async fn insert_unchecked(&self, appointment: NewAppointment) -> Appointment {
        let mut state = self.state.write().await;
        let id = state.next_id;
        state.next_id += 1;
        let stored = appointment.into_appointment(id);
        state.appointments.push(stored.clone());
        stored
    }

    pub async fn all_appointments(&self) -> Vec<Appointment> {
        self.state.read().await.appointments.clone()
    }
}

fn window(doctor_id: i64, day_of_week: u8, start_hour: u32, end_hour: u32) -> AvailabilityWindow {
    AvailabilityWindow {
        doctor_id,
        day_of_week,
        start_time: NaiveTime::from_hms_opt(start_hour, 0, 0).unwrap_or_default(),
        end_time: NaiveTime::from_hms_opt(end_hour, 0, 0).unwrap_or_default(),
    }
}

#[async_trait]
impl ClinicStore for InMemoryClinicStore {
    async fn list_doctors(&self) -> Result<Vec<Doctor>, DatabaseError> {
        Ok(self.state.read().await.doctors.clone())
    }

    async fn availability_windows(&self, doctor_id: i64) -> Result<Vec<AvailabilityWindow>, DatabaseError> {
        let state = self.state.read().await;
        let mut windows: Vec<AvailabilityWindow> = state
            .windows
            .iter()
            .filter(|window| window.doctor_id == doctor_id)
            .cloned()
            .collect();
        windows.sort_by_key(|window| window.day_of_week);
        Ok(windows)
    }

    async fn scheduled_appointments_on(
        &self,
        doctor_id: Option<i64>,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, DatabaseError> {
        let state = self.state.read().await;
        let mut appointments: Vec<Appointment> = state
            .appointments
            .iter()
            .filter(|apt| apt.is_scheduled())
            .filter(|apt| apt.appointment_time.date() == date)
            .filter(|apt| doctor_id.map_or(true, |id| apt.doctor_id == id))
            .cloned()
            .collect();
        appointments.sort_by_key(|apt| apt.appointment_time);
        Ok(appointments)
    }

    async fn insert_appointment(&self, appointment: NewAppointment) -> Result<Appointment, DatabaseError> {
        let mut state = self.state.write().await;

        if !state.doctors.iter().any(|doctor| doctor.id == appointment.doctor_id) {
            return Err(DatabaseError::NotFound(format!("doctor {}", appointment.doctor_id)));
        }

        let new_end = appointment.end_time();
        let clash = state.appointments.iter().find(|existing| {
            existing.is_scheduled()
                && existing.doctor_id == appointment.doctor_id
                && intervals_overlap(
                    appointment.appointment_time,
                    new_end,
                    existing.appointment_time,
                    existing.end_time(),
                )
        });

        if let Some(existing) = clash {
            warn!(
                "Rejecting appointment for doctor {} at {}: overlaps appointment {}",
                appointment.doctor_id, appointment.appointment_time, existing.id
            );
            return Err(DatabaseError::Conflict(format!(
                "doctor {} already has appointment {} at {}",
                existing.doctor_id, existing.id, existing.appointment_time
            )));
        }

        let id = state.next_id;
        state.next_id += 1;
        let stored = appointment.into_appointment(id);
        state.appointments.push(stored.clone());

        debug!("Stored appointment {} for doctor {}", stored.id, stored.doctor_id);
        Ok(stored)
    }
}
