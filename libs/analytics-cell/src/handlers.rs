use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use shared_models::error::AppError;

use crate::models::{RangeQuery, RangeReport, Report, ReportError, ReportFilter, ReportQuery};
use crate::services::reports::ReportService;

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::DoctorNotFound(_) => AppError::NotFound(err.to_string()),
            ReportError::InvalidQuery(_) | ReportError::InvalidDate(_) | ReportError::InvalidRange(_) => {
                AppError::BadRequest(err.to_string())
            }
            ReportError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}

#[axum::debug_handler]
pub async fn get_report(
    State(service): State<Arc<ReportService>>,
    Path(query_type): Path<String>,
    Query(filter): Query<ReportFilter>,
) -> Result<Json<Report>, AppError> {
    let query: ReportQuery = query_type.parse()?;
    let report = service.report(query, filter.doctor_name.as_deref()).await?;

    Ok(Json(report))
}

#[axum::debug_handler]
pub async fn get_range_report(
    State(service): State<Arc<ReportService>>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<RangeReport>, AppError> {
    let report = service
        .appointments_between(&range.start_date, &range.end_date, range.doctor_name.as_deref())
        .await?;

    Ok(Json(report))
}
