//! Tenant settings endpoint handlers.

use axum::{extract::State, Json};
use domain::models::{Branding, TenantSettings, UpdateTenantSettingsRequest};
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::Tenant;

/// Get the tenant's saved settings. 404 when never saved.
///
/// GET /api/v1/settings
pub async fn get_settings(
    State(state): State<AppState>,
    tenant: Tenant,
) -> Result<Json<TenantSettings>, ApiError> {
    state
        .settings
        .get(&tenant.0)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Settings have not been saved yet".to_string()))
}

/// Create or replace the tenant's settings.
///
/// PUT /api/v1/settings
pub async fn update_settings(
    State(state): State<AppState>,
    tenant: Tenant,
    Json(request): Json<UpdateTenantSettingsRequest>,
) -> Result<Json<TenantSettings>, ApiError> {
    let request = request.normalized();
    request.validate()?;

    let saved = state.settings.upsert(&tenant.0, &request).await?;
    info!(tenant = %tenant.0, agency_name = %saved.agency_name, "Tenant settings saved");

    Ok(Json(saved))
}

/// Branding for the console header, with defaults filled in.
///
/// GET /api/v1/settings/branding
pub async fn get_branding(
    State(state): State<AppState>,
    tenant: Tenant,
) -> Result<Json<Branding>, ApiError> {
    let settings = state.settings.get(&tenant.0).await?;
    Ok(Json(Branding::resolve(settings.as_ref())))
}
