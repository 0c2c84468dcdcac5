use async_trait::async_trait;
use chrono::NaiveDate;

use shared_models::{Appointment, AvailabilityWindow, Doctor, NewAppointment};

use crate::error::DatabaseError;

/// Persistence boundary for the roster and the appointment book.
///
/// Implementations must make `insert_appointment` atomic with respect to
/// other inserts: two concurrent calls for the same doctor and start time can
/// never both succeed. The losing call returns [`DatabaseError::Conflict`].
#[async_trait]
pub trait ClinicStore: Send + Sync {
    /// All doctors, ordered by id.
    async fn list_doctors(&self) -> Result<Vec<Doctor>, DatabaseError>;

    /// Weekly working hours of one doctor, ordered by weekday.
    async fn availability_windows(&self, doctor_id: i64) -> Result<Vec<AvailabilityWindow>, DatabaseError>;

    async fn availability_window(
        &self,
        doctor_id: i64,
        day_of_week: u8,
    ) -> Result<Option<AvailabilityWindow>, DatabaseError> {
        Ok(self
            .availability_windows(doctor_id)
            .await?
            .into_iter()
            .find(|window| window.day_of_week == day_of_week))
    }

    /// Scheduled (non-cancelled) appointments starting on `date`, ordered by
    /// start time. `None` means every doctor.
    async fn scheduled_appointments_on(
        &self,
        doctor_id: Option<i64>,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, DatabaseError>;

    async fn insert_appointment(&self, appointment: NewAppointment) -> Result<Appointment, DatabaseError>;
}
