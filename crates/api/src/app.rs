use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use domain::services::{ApplicationStore, TenantSettingsStore};
use persistence::repositories::{TenantSettingsRepository, VisaApplicationRepository};
use shared::jwt::JwtConfig;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_tenant_auth,
    security_headers_middleware, trace_id, RateLimiterState, TenantAuth,
};
use crate::routes::{analytics, applications, health, settings, workspace};
use crate::routes::workspace::WorkspaceRegistry;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
    /// `None` when the configured keys could not be loaded; protected routes
    /// then answer 503.
    pub jwt: Option<Arc<JwtConfig>>,
    pub applications: Arc<dyn ApplicationStore>,
    pub settings: Arc<dyn TenantSettingsStore>,
    pub workspaces: Arc<WorkspaceRegistry>,
}

/// Builds the router over the PostgreSQL repositories.
pub fn create_app(config: Config, pool: PgPool) -> Router {
    let applications = Arc::new(VisaApplicationRepository::new(pool.clone()));
    let settings = Arc::new(TenantSettingsRepository::new(pool.clone()));
    create_app_with_stores(config, pool, applications, settings)
}

/// Builds the router over the given stores. The pool only backs health
/// checks and pool metrics.
pub fn create_app_with_stores(
    config: Config,
    pool: PgPool,
    applications: Arc<dyn ApplicationStore>,
    settings: Arc<dyn TenantSettingsStore>,
) -> Router {
    let config = Arc::new(config);

    let rate_limiter = RateLimiterState::new(config.security.rate_limit_per_minute).map(Arc::new);

    let jwt = match TenantAuth::create_jwt_config(&config.jwt) {
        Ok(jwt) => Some(Arc::new(jwt)),
        Err(e) => {
            tracing::error!("{}", e);
            None
        }
    };

    let state = AppState {
        pool,
        config: config.clone(),
        rate_limiter,
        jwt,
        applications,
        settings,
        workspaces: Arc::new(WorkspaceRegistry::new(Duration::from_secs(
            config.workspace.idle_timeout_secs,
        ))),
    };

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Tenant routes. Auth runs first (outermost route layer), then the
    // per-tenant rate limit which needs the tenant from auth.
    let tenant_routes = Router::new()
        .route(
            "/api/v1/applications",
            get(applications::list_applications).post(applications::create_application),
        )
        .route(
            "/api/v1/applications/export",
            get(applications::export_applications),
        )
        .route(
            "/api/v1/applications/:id",
            get(applications::get_application)
                .patch(applications::update_application)
                .delete(applications::delete_application),
        )
        .route(
            "/api/v1/applications/:id/status",
            put(applications::update_status),
        )
        .route("/api/v1/analytics", get(analytics::get_report))
        .route("/api/v1/analytics/monthly", get(analytics::get_monthly))
        .route(
            "/api/v1/analytics/monthly/export",
            get(analytics::export_monthly),
        )
        .route(
            "/api/v1/settings",
            get(settings::get_settings).put(settings::update_settings),
        )
        .route("/api/v1/settings/branding", get(settings::get_branding))
        .route("/api/v1/workspace", get(workspace::get_view))
        .route("/api/v1/workspace/reload", post(workspace::reload))
        .route("/api/v1/workspace/rows", post(workspace::create_row))
        .route(
            "/api/v1/workspace/rows/:id/edit",
            post(workspace::enter_edit_mode),
        )
        .route("/api/v1/workspace/rows/:id/save", post(workspace::save_row))
        .route(
            "/api/v1/workspace/rows/:id/cancel",
            post(workspace::cancel_row),
        )
        .route(
            "/api/v1/workspace/rows/:id/status",
            put(workspace::change_status),
        )
        .route(
            "/api/v1/workspace/rows/:id/delete",
            post(workspace::delete_row),
        )
        .route("/api/v1/workspace/focus", put(workspace::focus))
        .route("/api/v1/workspace/commit", post(workspace::commit))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_tenant_auth,
        ));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    // Global middleware (bottom layers run first)
    Router::new()
        .merge(public_routes)
        .merge(tenant_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
