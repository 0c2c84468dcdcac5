use std::sync::Arc;

use assert_matches::assert_matches;
use chrono_tz::Tz;
use futures::future::join_all;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::{AppointmentError, BookAppointmentRequest, BookingService};
use shared_database::{ClinicStore, InMemoryClinicStore, SupabaseClinicStore};
use shared_utils::calendar::CalendarError;
use shared_utils::test_utils::{clinic_date, MockSupabaseResponses, TestConfig};

fn request(doctor: &str, patient: &str, when: &str) -> BookAppointmentRequest {
    BookAppointmentRequest {
        doctor_name: doctor.to_string(),
        patient_name: patient.to_string(),
        patient_email: format!("{}@example.com", patient.to_lowercase()),
        appointment_datetime: when.to_string(),
    }
}

fn service(store: Arc<InMemoryClinicStore>) -> BookingService {
    BookingService::new(store, Tz::Asia__Kolkata)
}

#[tokio::test]
async fn test_booking_returns_full_confirmation() {
    let store = Arc::new(InMemoryClinicStore::with_default_roster());
    let booked = service(Arc::clone(&store))
        .book_appointment(&request("ahuja", "Asha", "2026-02-17T10:00:00"))
        .await
        .unwrap();

    let confirmation = booked.confirmation();
    assert!(confirmation.success);
    assert_eq!(confirmation.appointment_id, 1);
    assert_eq!(confirmation.doctor, "Dr. Ahuja");
    assert_eq!(confirmation.doctor_email, "ahuja@clinic.example");
    assert_eq!(confirmation.patient_email, "asha@example.com");
    assert_eq!(confirmation.time, "2026-02-17T10:00:00");
    assert_eq!(confirmation.formatted_time, "Tuesday, February 17, 2026 at 10:00 AM");
    assert_eq!(booked.appointment.duration_minutes, 30);
}

#[tokio::test]
async fn test_second_booking_same_slot_is_unavailable() {
    let store = Arc::new(InMemoryClinicStore::with_default_roster());
    let booking = service(Arc::clone(&store));

    booking
        .book_appointment(&request("Dr. Ahuja", "Asha", "2026-02-17T10:00:00"))
        .await
        .unwrap();

    let again = booking
        .book_appointment(&request("Dr. Ahuja", "Ravi", "2026-02-17T10:00"))
        .await;
    assert_matches!(again, Err(AppointmentError::SlotUnavailable(_)));

    // seconds are dropped, so 10:00:42 is the taken 10:00 slot
    let with_seconds = booking
        .book_appointment(&request("Dr. Ahuja", "Ravi", "2026-02-17T10:00:42"))
        .await;
    assert_matches!(with_seconds, Err(AppointmentError::SlotUnavailable(_)));

    let other_doctor = booking
        .book_appointment(&request("Dr. Sharma", "Ravi", "2026-02-17T10:00:00"))
        .await;
    assert!(other_doctor.is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bookings_yield_exactly_one_success() {
    let store = Arc::new(InMemoryClinicStore::with_default_roster());
    let booking = Arc::new(service(Arc::clone(&store)));

    let attempts = ["Asha", "Ravi"].into_iter().map(|patient| {
        let booking = Arc::clone(&booking);
        tokio::spawn(async move {
            booking
                .book_appointment(&request("Dr. Ahuja", patient, "2026-02-17T10:00:00"))
                .await
        })
    });

    let results: Vec<_> = join_all(attempts).await.into_iter().map(|r| r.unwrap()).collect();

    let successes: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(successes.len(), 1);
    assert!(successes[0].confirmation().success);
    assert_eq!(
        results.iter().filter(|r| matches!(r, Err(AppointmentError::SlotUnavailable(_)))).count(),
        1
    );

    let stored = store
        .scheduled_appointments_on(Some(1), clinic_date("2026-02-17"))
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn test_rejections_before_any_write() {
    let store = Arc::new(InMemoryClinicStore::with_default_roster());
    let booking = service(Arc::clone(&store));

    assert_matches!(
        booking.book_appointment(&request("Dr. Who", "Asha", "2026-02-17T10:00:00")).await,
        Err(AppointmentError::DoctorNotFound(_))
    );
    assert_matches!(
        booking.book_appointment(&request("Ahuja", "Asha", "next tuesday at 10")).await,
        Err(AppointmentError::InvalidDateTime(_))
    );

    let mut bad_email = request("Ahuja", "Asha", "2026-02-17T10:00:00");
    bad_email.patient_email = "not-an-email".to_string();
    assert_matches!(
        booking.book_appointment(&bad_email).await,
        Err(AppointmentError::ValidationError(_))
    );

    assert!(store.all_appointments().await.is_empty());
}

#[tokio::test]
async fn test_off_grid_start_is_rejected_before_any_write() {
    let store = Arc::new(InMemoryClinicStore::with_default_roster());
    let booking = service(Arc::clone(&store));

    for when in ["2026-02-17T10:07:00", "2026-02-17T10:15", "2026-02-17T04:45:00Z"] {
        assert_matches!(
            booking.book_appointment(&request("Dr. Ahuja", "Asha", when)).await,
            Err(AppointmentError::InvalidDateTime(CalendarError::OffSlotGrid { width_minutes: 30, .. }))
        );
    }
    assert!(store.all_appointments().await.is_empty());

    // 10:00 and 10:30 can both be held, a 10:15 start could not sit between them
    booking
        .book_appointment(&request("Dr. Ahuja", "Asha", "2026-02-17T10:00:00"))
        .await
        .unwrap();
    booking
        .book_appointment(&request("Dr. Ahuja", "Ravi", "2026-02-17T10:30:00"))
        .await
        .unwrap();
    assert_eq!(store.all_appointments().await.len(), 2);
}

#[tokio::test]
async fn test_offset_timestamp_is_converted_to_clinic_time() {
    let store = Arc::new(InMemoryClinicStore::with_default_roster());
    let booked = service(Arc::clone(&store))
        .book_appointment(&request("Sharma", "Asha", "2026-02-17T04:30:00Z"))
        .await
        .unwrap();

    assert_eq!(booked.confirmation().time, "2026-02-17T10:00:00");
}

#[tokio::test]
async fn test_unique_index_violation_is_slot_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_response(1, "Dr. Ahuja", "Cardiology", "ahuja@clinic.example")
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(MockSupabaseResponses::error_response(
            "duplicate key value violates unique constraint",
            "23505",
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_mock_server(&mock_server.uri()).to_app_config();
    let booking = BookingService::new(Arc::new(SupabaseClinicStore::new(&config)), config.clinic_timezone);

    let result = booking
        .book_appointment(&request("Ahuja", "Asha", "2026-02-17T10:00:00"))
        .await;
    assert_matches!(result, Err(AppointmentError::SlotUnavailable(_)));
}
