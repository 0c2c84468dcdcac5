use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers;
use crate::services::availability::AvailabilityService;

pub fn doctor_routes(service: Arc<AvailabilityService>) -> Router {
    Router::new()
        .route("/", get(handlers::list_doctors))
        .route("/availability", get(handlers::check_availability))
        .with_state(service)
}
