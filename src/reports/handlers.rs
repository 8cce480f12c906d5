use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::error::{ApiError, AppJson};
use crate::state::AppState;

use super::dto::{day_bounds, CreateReport, Report, ReportFilters};

#[instrument(skip(state, payload))]
pub async fn create_report(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateReport>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let report = payload.validate()?;
    let row = state.reports.insert(&report).await?;
    info!(
        report_id = %row.id,
        disease = %row.suspected_disease,
        anonymous = row.is_anonymous,
        "report created"
    );
    Ok((
        StatusCode::CREATED,
        Json(json!({ "report": Report::from(row) })),
    ))
}

/// Resolves query filters into repo arguments, expanding a date filter to
/// its calendar-day range. Empty strings count as unset.
pub(crate) fn resolve_filters(
    filters: &ReportFilters,
    offset_hours: i8,
) -> Result<(Option<&str>, Option<&str>, Option<(i64, i64)>), ApiError> {
    let region = filters.region.as_deref().filter(|s| !s.is_empty());
    let disease = filters.disease.as_deref().filter(|s| !s.is_empty());
    let range = match filters.date.as_deref().filter(|s| !s.is_empty()) {
        Some(date) => Some(day_bounds(date, offset_hours)?),
        None => None,
    };
    Ok((region, disease, range))
}

#[instrument(skip(state))]
pub async fn list_reports(
    State(state): State<AppState>,
    Query(filters): Query<ReportFilters>,
) -> Result<Json<Value>, ApiError> {
    let (region, disease, range) = resolve_filters(&filters, state.config.day_offset_hours)?;
    let rows = state.reports.list(region, disease, range).await?;
    let reports: Vec<Report> = rows.into_iter().map(Report::from).collect();
    Ok(Json(json!({ "reports": reports })))
}

/// Removes every report. Administrative/demo operation with no filter and
/// no server-side confirmation, as in the original.
#[instrument(skip(state))]
pub async fn delete_all_reports(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let deleted = state.reports.delete_all().await?;
    info!(deleted, "all reports deleted");
    Ok(Json(json!({ "message": "All reports deleted successfully" })))
}
