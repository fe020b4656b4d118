//! Repository for tenant settings operations.

use domain::models::{TenantId, TenantSettings, UpdateTenantSettingsRequest};
use domain::services::TenantSettingsStore;
use domain::DomainError;
use sqlx::PgPool;
use tracing::info;

use super::store_error;
use crate::entities::TenantSettingsEntity;
use crate::metrics::QueryTimer;

/// Repository for tenant settings database operations.
#[derive(Clone)]
pub struct TenantSettingsRepository {
    pool: PgPool,
}

impl TenantSettingsRepository {
    /// Creates a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets settings for a tenant.
    /// Returns None if the tenant never saved any.
    pub async fn get_by_owner(
        &self,
        owner_email: &str,
    ) -> Result<Option<TenantSettingsEntity>, sqlx::Error> {
        let timer = QueryTimer::new("get_tenant_settings");
        let result = sqlx::query_as::<_, TenantSettingsEntity>(
            r#"
            SELECT owner_email, agency_name, logo_url, visible_fields, created_at, updated_at
            FROM tenant_settings
            WHERE owner_email = $1
            "#,
        )
        .bind(owner_email)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Creates or replaces the settings of a tenant.
    pub async fn upsert_for_owner(
        &self,
        owner_email: &str,
        agency_name: &str,
        logo_url: Option<&str>,
        visible_fields: Option<&[String]>,
    ) -> Result<TenantSettingsEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert_tenant_settings");
        let result = sqlx::query_as::<_, TenantSettingsEntity>(
            r#"
            INSERT INTO tenant_settings (owner_email, agency_name, logo_url, visible_fields)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (owner_email) DO UPDATE SET
                agency_name = EXCLUDED.agency_name,
                logo_url = EXCLUDED.logo_url,
                visible_fields = EXCLUDED.visible_fields,
                updated_at = NOW()
            RETURNING owner_email, agency_name, logo_url, visible_fields, created_at, updated_at
            "#,
        )
        .bind(owner_email)
        .bind(agency_name)
        .bind(logo_url)
        .bind(visible_fields)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}

#[async_trait::async_trait]
impl TenantSettingsStore for TenantSettingsRepository {
    async fn get(&self, tenant: &TenantId) -> Result<Option<TenantSettings>, DomainError> {
        Ok(self
            .get_by_owner(tenant.as_str())
            .await
            .map_err(store_error)?
            .map(TenantSettings::from))
    }

    async fn upsert(
        &self,
        tenant: &TenantId,
        request: &UpdateTenantSettingsRequest,
    ) -> Result<TenantSettings, DomainError> {
        let entity = self
            .upsert_for_owner(
                tenant.as_str(),
                &request.agency_name,
                request.logo_url.as_deref(),
                request.visible_fields.as_deref(),
            )
            .await
            .map_err(store_error)?;
        info!(tenant = %tenant, "Tenant settings saved");
        Ok(entity.into())
    }
}
