use chrono::NaiveDateTime;

use shared_models::Appointment;
use shared_utils::calendar::intervals_overlap;

/// First scheduled appointment whose interval overlaps `[start, end)`.
///
/// Exact start-time equality is the common case since every slot is the same
/// width, but longer or off-grid bookings are caught by the overlap rule too.
pub fn find_conflict(
    existing: &[Appointment],
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Option<&Appointment> {
    existing
        .iter()
        .filter(|apt| apt.is_scheduled())
        .find(|apt| intervals_overlap(start, end, apt.appointment_time, apt.end_time()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use shared_models::{AppointmentStatus, NewAppointment};
    use shared_utils::test_utils::clinic_time;

    fn scheduled(id: i64, raw: &str) -> Appointment {
        NewAppointment::scheduled_slot(1, "Asha", "asha@example.com", clinic_time(raw)).into_appointment(id)
    }

    #[test]
    fn test_exact_and_partial_overlaps_conflict() {
        let existing = vec![scheduled(1, "2026-02-17T10:00")];
        let ten = clinic_time("2026-02-17T10:00");
        let ten_fifteen = clinic_time("2026-02-17T10:15");

        assert_eq!(find_conflict(&existing, ten, ten + Duration::minutes(30)).map(|a| a.id), Some(1));
        assert!(find_conflict(&existing, ten_fifteen, ten_fifteen + Duration::minutes(30)).is_some());
    }

    #[test]
    fn test_adjacent_and_cancelled_do_not_conflict() {
        let mut cancelled = scheduled(2, "2026-02-17T11:00");
        cancelled.status = AppointmentStatus::Cancelled;
        let existing = vec![scheduled(1, "2026-02-17T10:00"), cancelled];

        let half_past = clinic_time("2026-02-17T10:30");
        assert!(find_conflict(&existing, half_past, half_past + Duration::minutes(30)).is_none());

        let eleven = clinic_time("2026-02-17T11:00");
        assert!(find_conflict(&existing, eleven, eleven + Duration::minutes(30)).is_none());
    }
}
