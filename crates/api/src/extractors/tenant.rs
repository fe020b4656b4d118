//! Tenant extractor.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::models::TenantId;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::tenant_auth::TenantAuth;

/// The tenant every store call in a handler is scoped to.
///
/// Uses the identity placed in extensions by `require_tenant_auth`, and
/// falls back to validating the bearer token itself on routes without that
/// layer.
#[derive(Debug, Clone)]
pub struct Tenant(pub TenantId);

#[async_trait]
impl FromRequestParts<AppState> for Tenant {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(auth) = parts.extensions.get::<TenantAuth>() {
            return Ok(Tenant(auth.tenant.clone()));
        }

        let auth = TenantAuth::from_headers(&parts.headers, state)?;
        Ok(Tenant(auth.tenant))
    }
}
