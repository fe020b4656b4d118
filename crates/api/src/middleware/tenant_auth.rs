//! Tenant session authentication.
//!
//! Every protected route runs under exactly one tenant, taken from the `sub`
//! claim of the bearer token. Requests without a usable identity never reach
//! a handler.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use domain::models::TenantId;
use shared::jwt::JwtConfig;

use crate::app::AppState;
use crate::config::JwtAuthConfig;
use crate::error::ApiError;

/// Authenticated tenant, stored in request extensions.
#[derive(Debug, Clone)]
pub struct TenantAuth {
    pub tenant: TenantId,
    /// JWT ID (jti) of the session token.
    pub jti: String,
}

impl TenantAuth {
    /// Validates an access token and resolves its tenant.
    pub fn validate(jwt_config: &JwtConfig, token: &str) -> Result<Self, String> {
        let claims = jwt_config
            .validate_access_token(token)
            .map_err(|e| format!("Invalid token: {}", e))?;

        let tenant = TenantId::parse(&claims.sub).map_err(|e| e.to_string())?;

        Ok(TenantAuth {
            tenant,
            jti: claims.jti,
        })
    }

    /// Builds the token verifier. A private key is optional; without one the
    /// service can only validate tokens.
    pub fn create_jwt_config(config: &JwtAuthConfig) -> Result<JwtConfig, String> {
        let result = if config.private_key.trim().is_empty() {
            JwtConfig::verify_only(&config.public_key, config.leeway_secs)
        } else {
            JwtConfig::with_leeway(
                &config.private_key,
                &config.public_key,
                config.access_token_expiry_secs,
                config.leeway_secs,
            )
        };
        result.map_err(|e| format!("Failed to initialize JWT config: {}", e))
    }

    /// Resolves the tenant from an `Authorization: Bearer` header.
    pub fn from_headers(headers: &HeaderMap, state: &AppState) -> Result<Self, ApiError> {
        let token = bearer_token(headers).ok_or_else(|| {
            ApiError::Unauthorized("Missing or invalid Authorization header".to_string())
        })?;

        let jwt_config = state.jwt.as_ref().ok_or_else(|| {
            ApiError::ServiceUnavailable("Authentication service unavailable".to_string())
        })?;

        TenantAuth::validate(jwt_config, token).map_err(|e| {
            tracing::debug!("JWT validation failed: {}", e);
            ApiError::Unauthorized("Invalid or expired token".to_string())
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Rejects requests without a valid tenant session.
pub async fn require_tenant_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match TenantAuth::from_headers(req.headers(), &state) {
        Ok(auth) => {
            req.extensions_mut().insert(auth);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}
