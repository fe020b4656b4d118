//! Session extractor.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::models::TenantId;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::tenant_auth::TenantAuth;

/// One operator's signed-in session: the tenant plus the token's `jti`.
///
/// Two operators of the same agency share a tenant but never a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Session {
    pub tenant: TenantId,
    pub id: String,
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = match parts.extensions.get::<TenantAuth>() {
            Some(auth) => auth.clone(),
            None => TenantAuth::from_headers(&parts.headers, state)?,
        };

        Ok(Session {
            tenant: auth.tenant,
            id: auth.jti,
        })
    }
}
