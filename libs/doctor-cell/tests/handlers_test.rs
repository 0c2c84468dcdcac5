// libs/doctor-cell/tests/handlers_test.rs

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::Value;
use tower::ServiceExt;

use doctor_cell::{doctor_routes, AvailabilityService};
use shared_database::InMemoryClinicStore;

fn app() -> axum::Router {
    let store = Arc::new(InMemoryClinicStore::with_default_roster());
    doctor_routes(Arc::new(AvailabilityService::new(store)))
}

async fn get_json(uri: &str) -> (StatusCode, Value) {
    let response = app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_availability_endpoint_returns_slots() {
    let (status, body) =
        get_json("/availability?doctor_name=Sharma&date=2026-02-16&time_preference=afternoon").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], true);
    assert_eq!(body["doctor"], "Dr. Sharma");
    assert_eq!(body["slots"][0], "12:00");
    assert_eq!(body["slots"].as_array().unwrap().len(), 10);
    assert!(body.get("reason").is_none());
}

#[tokio::test]
async fn test_availability_endpoint_error_statuses() {
    let (status, body) = get_json("/availability?doctor_name=Nobody&date=2026-02-16").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Doctor Nobody not found");

    let (status, _) = get_json("/availability?doctor_name=Sharma&date=tomorrow").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_roster_endpoint_lists_doctors() {
    let (status, body) = get_json("/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["doctors"][1]["doctor"]["name"], "Dr. Sharma");
}
