// libs/appointment-cell/tests/handlers_test.rs

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
};
use chrono_tz::Tz;
use serde_json::{json, Value};
use tower::ServiceExt;

use appointment_cell::{appointment_routes, BookingService};
use shared_database::InMemoryClinicStore;

async fn post_booking(app: axum::Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_book_then_conflict() {
    let store = Arc::new(InMemoryClinicStore::with_default_roster());
    let app = appointment_routes(Arc::new(BookingService::new(store, Tz::Asia__Kolkata)));

    let body = json!({
        "doctor_name": "Dr. Sharma",
        "patient_name": "Asha",
        "patient_email": "asha@example.com",
        "appointment_datetime": "2026-02-18T15:30:00"
    });

    let (status, created) = post_booking(app.clone(), body.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["appointment_id"], 1);
    assert_eq!(created["success"], true);

    let (status, conflict) = post_booking(app, body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(conflict["detail"].as_str().unwrap().contains("already booked"));
}
