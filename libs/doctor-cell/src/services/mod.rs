pub mod doctor;
pub mod availability;

pub use doctor::{DoctorSchedule, DoctorService};
pub use availability::AvailabilityService;
