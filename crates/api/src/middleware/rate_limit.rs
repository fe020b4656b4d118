//! Per-tenant rate limiting.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use domain::models::TenantId;
use governor::{
    clock::{Clock, DefaultClock},
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovRateLimiter,
};
use serde_json::json;
use std::{
    collections::HashMap,
    num::NonZeroU32,
    sync::{Arc, RwLock},
};

use crate::app::AppState;
use crate::middleware::tenant_auth::TenantAuth;

type TenantRateLimiter = GovRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// One token bucket per tenant, created on first request.
pub struct RateLimiterState {
    limiters: RwLock<HashMap<TenantId, Arc<TenantRateLimiter>>>,
    quota: Quota,
    rate_limit_per_minute: u32,
}

impl RateLimiterState {
    /// `None` when the limit is 0, which disables rate limiting.
    pub fn new(rate_limit_per_minute: u32) -> Option<Self> {
        let per_minute = NonZeroU32::new(rate_limit_per_minute)?;
        Some(Self {
            limiters: RwLock::new(HashMap::new()),
            quota: Quota::per_minute(per_minute),
            rate_limit_per_minute,
        })
    }

    pub fn rate_limit_per_minute(&self) -> u32 {
        self.rate_limit_per_minute
    }

    fn get_or_create_limiter(&self, tenant: &TenantId) -> Arc<TenantRateLimiter> {
        {
            let limiters = self.limiters.read().unwrap_or_else(|e| e.into_inner());
            if let Some(limiter) = limiters.get(tenant) {
                return limiter.clone();
            }
        }

        let mut limiters = self.limiters.write().unwrap_or_else(|e| e.into_inner());
        limiters
            .entry(tenant.clone())
            .or_insert_with(|| Arc::new(GovRateLimiter::direct(self.quota)))
            .clone()
    }

    /// `Err(retry_after_secs)` when the tenant has used up its quota.
    pub fn check(&self, tenant: &TenantId) -> Result<(), u64> {
        let limiter = self.get_or_create_limiter(tenant);

        limiter.check().map_err(|not_until| {
            let wait_time = not_until.wait_time_from(DefaultClock::default().now());
            wait_time.as_secs().max(1)
        })
    }

    fn active_limiters(&self) -> usize {
        self.limiters.read().map(|l| l.len()).unwrap_or(0)
    }
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("active_limiters", &self.active_limiters())
            .finish()
    }
}

/// Applies the tenant's quota. Must run after tenant authentication so the
/// tenant is in the request extensions.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(rate_limiter) = state.rate_limiter.as_ref() else {
        return next.run(req).await;
    };

    // Unauthenticated requests are rejected by the auth layer.
    let Some(auth) = req.extensions().get::<TenantAuth>() else {
        return next.run(req).await;
    };

    if let Err(retry_after) = rate_limiter.check(&auth.tenant) {
        tracing::debug!(tenant = %auth.tenant, retry_after, "Rate limit exceeded");
        return rate_limited_response(rate_limiter.rate_limit_per_minute(), retry_after);
    }

    next.run(req).await
}

fn rate_limited_response(limit: u32, retry_after: u64) -> Response {
    let body = json!({
        "error": "rate_limited",
        "message": format!("Rate limit of {} requests/minute exceeded", limit),
        "retry_after": retry_after
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant(email: &str) -> TenantId {
        TenantId::parse(email).unwrap()
    }

    #[test]
    fn test_zero_limit_disables() {
        assert!(RateLimiterState::new(0).is_none());
    }

    #[test]
    fn test_rate_limiter_exhaustion() {
        let state = RateLimiterState::new(1).unwrap();
        let owner = tenant("owner@agency.test");

        assert!(state.check(&owner).is_ok());
        let retry_after = state.check(&owner).unwrap_err();
        assert!(retry_after >= 1);
    }

    #[test]
    fn test_tenants_have_independent_quotas() {
        let state = RateLimiterState::new(2).unwrap();
        let first = tenant("first@agency.test");
        let second = tenant("second@agency.test");

        assert!(state.check(&first).is_ok());
        assert!(state.check(&first).is_ok());
        assert!(state.check(&first).is_err());

        assert!(state.check(&second).is_ok());
        assert!(state.check(&second).is_ok());
    }

    #[test]
    fn test_identity_is_normalized_before_limiting() {
        let state = RateLimiterState::new(1).unwrap();
        assert!(state.check(&tenant("Owner@Agency.test")).is_ok());
        assert!(state.check(&tenant("owner@agency.test ")).is_err());
        assert_eq!(state.active_limiters(), 1);
    }

    #[test]
    fn test_rate_limited_response() {
        let response = rate_limited_response(60, 5);
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "5");
    }

    #[test]
    fn test_debug_output() {
        let state = RateLimiterState::new(30).unwrap();
        let debug = format!("{:?}", state);
        assert!(debug.contains("rate_limit_per_minute: 30"));
    }
}
