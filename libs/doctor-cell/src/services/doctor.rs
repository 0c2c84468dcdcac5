use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use shared_database::ClinicStore;
use shared_models::{AvailabilityWindow, Doctor};

use crate::models::DoctorError;

const WEEKDAY_ABBREVIATIONS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// A doctor together with their weekly working hours.
#[derive(Debug, Clone, Serialize)]
pub struct DoctorSchedule {
    pub doctor: Doctor,
    pub windows: Vec<AvailabilityWindow>,
}

impl DoctorSchedule {
    /// One roster line, e.g. `Dr. Ahuja (Cardiology) - Mon 09:00-17:00, Fri 09:00-12:00`.
    pub fn describe(&self) -> String {
        let hours: Vec<String> = self
            .windows
            .iter()
            .map(|window| {
                format!(
                    "{} {}-{}",
                    WEEKDAY_ABBREVIATIONS[(window.day_of_week as usize).min(6)],
                    window.start_time.format("%H:%M"),
                    window.end_time.format("%H:%M"),
                )
            })
            .collect();

        let hours = if hours.is_empty() {
            "no regular hours".to_string()
        } else {
            hours.join(", ")
        };

        format!("{} ({}) - {}", self.doctor.name, self.doctor.specialization, hours)
    }
}

pub struct DoctorService {
    store: Arc<dyn ClinicStore>,
}

impl DoctorService {
    pub fn new(store: Arc<dyn ClinicStore>) -> Self {
        Self { store }
    }

    /// Resolve a free-form doctor name against the roster.
    ///
    /// Case-insensitive substring match, first doctor by id wins. A leading
    /// "Dr"/"Dr." in the query is ignored if the full query matches nobody.
    pub async fn resolve_doctor(&self, doctor_name: &str) -> Result<Doctor, DoctorError> {
        let query = doctor_name.trim().to_lowercase();
        if query.is_empty() {
            return Err(DoctorError::DoctorNotFound(doctor_name.to_string()));
        }

        let doctors = self.store.list_doctors().await?;

        let found = find_by_substring(&doctors, &query).or_else(|| {
            strip_honorific(&query).and_then(|bare| find_by_substring(&doctors, bare))
        });

        match found {
            Some(doctor) => {
                debug!("Resolved '{}' to doctor {}", doctor_name, doctor.id);
                Ok(doctor.clone())
            }
            None => Err(DoctorError::DoctorNotFound(doctor_name.to_string())),
        }
    }

    pub async fn roster(&self) -> Result<Vec<DoctorSchedule>, DoctorError> {
        let doctors = self.store.list_doctors().await?;
        let mut schedules = Vec::with_capacity(doctors.len());

        for doctor in doctors {
            let windows = self.store.availability_windows(doctor.id).await?;
            schedules.push(DoctorSchedule { doctor, windows });
        }

        Ok(schedules)
    }
}

fn find_by_substring<'a>(doctors: &'a [Doctor], query: &str) -> Option<&'a Doctor> {
    doctors
        .iter()
        .find(|doctor| doctor.name.to_lowercase().contains(query))
}

fn strip_honorific(query: &str) -> Option<&str> {
    ["dr.", "dr "]
        .iter()
        .find_map(|prefix| query.strip_prefix(prefix))
        .map(str::trim)
        .filter(|rest| !rest.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_honorific() {
        assert_eq!(strip_honorific("dr. ahuja"), Some("ahuja"));
        assert_eq!(strip_honorific("dr ahuja"), Some("ahuja"));
        assert_eq!(strip_honorific("ahuja"), None);
        assert_eq!(strip_honorific("dr."), None);
    }
}
