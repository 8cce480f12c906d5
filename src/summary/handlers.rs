use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::reports::dto::{Report, ReportFilters};
use crate::reports::handlers::resolve_filters;
use crate::state::AppState;

/// Summarizes the in-scope report set (same filters as the list endpoint)
/// through the generative model. Nothing is cached or persisted; a model
/// failure surfaces as an error for this request only.
#[instrument(skip(state))]
pub async fn generate_summary(
    State(state): State<AppState>,
    Query(filters): Query<ReportFilters>,
) -> Result<Json<Value>, ApiError> {
    let (region, disease, range) = resolve_filters(&filters, state.config.day_offset_hours)?;
    let rows = state.reports.list(region, disease, range).await?;
    let reports: Vec<Report> = rows.into_iter().map(Report::from).collect();

    let recent_data =
        serde_json::to_string(&reports).map_err(|e| ApiError::Internal(e.into()))?;

    let summary = state
        .summarizer
        .summarize(&recent_data)
        .await
        .map_err(|e| ApiError::Internal(e.context("generate daily summary")))?;

    info!(reports = reports.len(), "daily summary generated");
    Ok(Json(json!({ "summary": summary })))
}
