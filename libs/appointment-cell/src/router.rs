// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{routing::post, Router};

use crate::handlers;
use crate::services::booking::BookingService;

pub fn appointment_routes(service: Arc<BookingService>) -> Router {
    Router::new()
        .route("/", post(handlers::book_appointment))
        .with_state(service)
}
