// =====================================================================================
// ANALYTICS CELL ROUTER
// =====================================================================================

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers::{get_range_report, get_report};
use crate::services::reports::ReportService;

pub fn report_routes(service: Arc<ReportService>) -> Router {
    Router::new()
        .route("/range", get(get_range_report))
        .route("/{query_type}", get(get_report))
        .with_state(service)
}
