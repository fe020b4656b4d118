//! Dashboard analytics endpoint handlers.

use axum::{
    extract::{Query, State},
    response::Response,
    Json,
};
use domain::models::{AnalyticsReport, MonthlyBucket, TimeWindow};
use domain::services::{aggregation, csv_export};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{csv_response, local_now, parse_param};
use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::Tenant;
use crate::middleware::metrics::record_export;

#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsParams {
    /// today | week | month | year, defaulting to month.
    pub window: Option<String>,
    pub utc_offset_minutes: Option<i32>,
}

impl AnalyticsParams {
    fn window(&self) -> Result<TimeWindow, ApiError> {
        Ok(parse_param(self.window.as_deref())?.unwrap_or_default())
    }
}

#[derive(Debug, Serialize)]
pub struct MonthlyResponse {
    pub months: Vec<MonthlyBucket>,
}

/// Summary of the selected window against the one before it.
///
/// GET /api/v1/analytics?window=month
pub async fn get_report(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<AnalyticsReport>, ApiError> {
    let window = params.window()?;
    let now = local_now(&state.config, params.utc_offset_minutes)?;
    let records = state.applications.list(&tenant.0).await?;

    let report = aggregation::build_report(&records, window, now);
    debug!(
        tenant = %tenant.0,
        window = %window,
        current_total = report.current.total_applications,
        "Analytics report built"
    );

    Ok(Json(report))
}

/// Twelve monthly buckets ending at the current month.
///
/// GET /api/v1/analytics/monthly
pub async fn get_monthly(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<MonthlyResponse>, ApiError> {
    let now = local_now(&state.config, params.utc_offset_minutes)?;
    let records = state.applications.list(&tenant.0).await?;

    Ok(Json(MonthlyResponse {
        months: aggregation::monthly_history(&records, now),
    }))
}

/// Download the monthly history as CSV, named after the selected window.
///
/// GET /api/v1/analytics/monthly/export?window=month
pub async fn export_monthly(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(params): Query<AnalyticsParams>,
) -> Result<Response, ApiError> {
    let window = params.window()?;
    let now = local_now(&state.config, params.utc_offset_minutes)?;
    let records = state.applications.list(&tenant.0).await?;

    let buckets = aggregation::monthly_history(&records, now);
    record_export("monthly", buckets.len());

    Ok(csv_response(csv_export::export_monthly(&buckets, window)))
}
