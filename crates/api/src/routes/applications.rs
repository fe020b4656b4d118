//! Visa application endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use domain::models::{
    ApplicationPatch, ApplicationResponse, NewApplication, UpdateStatusRequest, VisaApplication,
};
use domain::services::{csv_export, listing, ListQuery, SortOrder, StatusFilter};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::{csv_response, local_now, parse_param};
use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::Tenant;
use crate::middleware::metrics::record_export;

/// Query parameters shaping the application table.
///
/// Kept as raw strings so an unknown value yields a 400 naming it.
#[derive(Debug, Default, Deserialize)]
pub struct ListApplicationsParams {
    pub search: Option<String>,
    pub status: Option<String>,
    pub sort: Option<String>,
    pub window: Option<String>,
    pub utc_offset_minutes: Option<i32>,
}

impl ListApplicationsParams {
    pub(crate) fn to_query(&self) -> Result<ListQuery, ApiError> {
        Ok(ListQuery {
            search: self.search.clone().unwrap_or_default(),
            status: parse_param::<StatusFilter>(self.status.as_deref())?.unwrap_or_default(),
            sort: parse_param::<SortOrder>(self.sort.as_deref())?.unwrap_or_default(),
            window: parse_param(self.window.as_deref())?,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ListApplicationsResponse {
    pub applications: Vec<ApplicationResponse>,
    pub count: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub confirm: bool,
}

/// Fetches the tenant's rows and applies search, filter, sort and window.
async fn filtered(
    state: &AppState,
    tenant: &Tenant,
    params: &ListApplicationsParams,
) -> Result<(ListQuery, Vec<VisaApplication>), ApiError> {
    let query = params.to_query()?;
    let now = local_now(&state.config, params.utc_offset_minutes)?;
    let records = state.applications.list(&tenant.0).await?;
    let rows = listing::apply(&records, &query, now)
        .into_iter()
        .cloned()
        .collect();
    Ok((query, rows))
}

/// List the tenant's applications.
///
/// GET /api/v1/applications?search=&status=&sort=&window=
pub async fn list_applications(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(params): Query<ListApplicationsParams>,
) -> Result<Json<ListApplicationsResponse>, ApiError> {
    let (_, rows) = filtered(&state, &tenant, &params).await?;
    let applications: Vec<ApplicationResponse> =
        rows.into_iter().map(ApplicationResponse::from).collect();

    Ok(Json(ListApplicationsResponse {
        count: applications.len(),
        applications,
    }))
}

/// Download the filtered table as CSV.
///
/// GET /api/v1/applications/export?window=month
pub async fn export_applications(
    State(state): State<AppState>,
    tenant: Tenant,
    Query(params): Query<ListApplicationsParams>,
) -> Result<Response, ApiError> {
    let (query, rows) = filtered(&state, &tenant, &params).await?;
    let download = csv_export::export_applications(&rows, query.window);

    record_export("applications", rows.len());
    info!(
        tenant = %tenant.0,
        rows = rows.len(),
        filename = %download.filename,
        "Applications exported"
    );

    Ok(csv_response(download))
}

/// Create an application. The store assigns id, status and timestamps.
///
/// POST /api/v1/applications
pub async fn create_application(
    State(state): State<AppState>,
    tenant: Tenant,
    Json(request): Json<NewApplication>,
) -> Result<(StatusCode, Json<ApplicationResponse>), ApiError> {
    let request = request.normalized();
    request.validate()?;

    let created = state.applications.create(&tenant.0, request).await?;
    state.workspaces.invalidate_tenant(&tenant.0, None).await;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// GET /api/v1/applications/:id
pub async fn get_application(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<i64>,
) -> Result<Json<ApplicationResponse>, ApiError> {
    let application = state
        .applications
        .get(&tenant.0, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Application {} not found", id)))?;

    Ok(Json(application.into()))
}

/// Apply a sparse patch. Fields left out keep their value.
///
/// PATCH /api/v1/applications/:id
pub async fn update_application(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<i64>,
    Json(patch): Json<ApplicationPatch>,
) -> Result<Json<ApplicationResponse>, ApiError> {
    let patch = patch.normalized();
    patch.validate()?;
    if patch.is_empty() {
        return Err(ApiError::Validation("No fields to update".to_string()));
    }

    let updated = state.applications.update(&tenant.0, id, &patch).await?;
    state.workspaces.invalidate_tenant(&tenant.0, None).await;
    Ok(Json(updated.into()))
}

/// Change the status immediately.
///
/// PUT /api/v1/applications/:id/status
pub async fn update_status(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<i64>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<ApplicationResponse>, ApiError> {
    let updated = state
        .applications
        .update(&tenant.0, id, &ApplicationPatch::status(request.status))
        .await?;
    state.workspaces.invalidate_tenant(&tenant.0, None).await;

    info!(
        tenant = %tenant.0,
        application_id = id,
        status = %request.status,
        "Application status changed"
    );

    Ok(Json(updated.into()))
}

/// Delete an application. Requires `confirm=true`; anything else leaves the
/// row untouched.
///
/// DELETE /api/v1/applications/:id?confirm=true
pub async fn delete_application(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<i64>,
    Query(params): Query<DeleteParams>,
) -> Result<StatusCode, ApiError> {
    if !params.confirm {
        return Err(ApiError::Validation(
            "Deletion must be confirmed with confirm=true".to_string(),
        ));
    }

    state.applications.delete(&tenant.0, id).await?;
    state.workspaces.invalidate_tenant(&tenant.0, None).await;
    Ok(StatusCode::NO_CONTENT)
}
