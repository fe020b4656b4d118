//! Repository for visa application operations.
//!
//! Every query is scoped by `owner_email`; a row owned by another tenant is
//! indistinguishable from a missing one.

use domain::models::{ApplicationPatch, NewApplication, TenantId, VisaApplication};
use domain::services::ApplicationStore;
use domain::DomainError;
use sqlx::PgPool;
use tracing::info;

use super::store_error;
use crate::entities::{VisaApplicationEntity, VISA_APPLICATION_COLUMNS};
use crate::metrics::QueryTimer;

/// Repository for visa application database operations.
#[derive(Clone)]
pub struct VisaApplicationRepository {
    pool: PgPool,
}

impl VisaApplicationRepository {
    /// Creates a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists an owner's applications, newest submission first.
    pub async fn list_by_owner(
        &self,
        owner_email: &str,
    ) -> Result<Vec<VisaApplicationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_visa_applications");
        let sql = format!(
            r#"
            SELECT {}
            FROM visa_applications
            WHERE owner_email = $1
            ORDER BY submitted_at DESC, id DESC
            "#,
            VISA_APPLICATION_COLUMNS
        );
        let result = sqlx::query_as::<_, VisaApplicationEntity>(&sql)
            .bind(owner_email)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Finds one application of an owner.
    pub async fn find_by_id(
        &self,
        owner_email: &str,
        id: i64,
    ) -> Result<Option<VisaApplicationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_visa_application_by_id");
        let sql = format!(
            r#"
            SELECT {}
            FROM visa_applications
            WHERE id = $1 AND owner_email = $2
            "#,
            VISA_APPLICATION_COLUMNS
        );
        let result = sqlx::query_as::<_, VisaApplicationEntity>(&sql)
            .bind(id)
            .bind(owner_email)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Inserts a PENDING application; owner and agent are both the tenant.
    pub async fn insert(
        &self,
        owner_email: &str,
        application: &NewApplication,
    ) -> Result<VisaApplicationEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_visa_application");
        let sql = format!(
            r#"
            INSERT INTO visa_applications (
                owner_email, first_name, middle_name, last_name, date_of_birth, gender,
                passport_no, whatsapp_number, email, destination, visa_type,
                application_status, fees, costs, whatsapp_sent, agent_notes, document_urls,
                agent_id, submitted_at, last_updated_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                'PENDING', $12, $13, FALSE, $14, $15, $1, NOW(), NOW()
            )
            RETURNING {}
            "#,
            VISA_APPLICATION_COLUMNS
        );
        let result = sqlx::query_as::<_, VisaApplicationEntity>(&sql)
            .bind(owner_email)
            .bind(&application.first_name)
            .bind(&application.middle_name)
            .bind(&application.last_name)
            .bind(&application.date_of_birth)
            .bind(&application.gender)
            .bind(&application.passport_no)
            .bind(&application.whatsapp_number)
            .bind(&application.email)
            .bind(&application.destination)
            .bind(&application.visa_type)
            .bind(application.fees)
            .bind(application.costs)
            .bind(&application.agent_notes)
            .bind(&application.document_urls)
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Applies the fields present in the patch and refreshes `last_updated_at`.
    ///
    /// Absent fields keep their value. For optional text columns a blank value
    /// clears the column. Returns `None` when the owner has no such row.
    pub async fn update_fields(
        &self,
        owner_email: &str,
        id: i64,
        patch: &ApplicationPatch,
    ) -> Result<Option<VisaApplicationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_visa_application");
        let sql = format!(
            r#"
            UPDATE visa_applications SET
                first_name = COALESCE($3, first_name),
                middle_name = CASE WHEN $4::TEXT IS NULL THEN middle_name
                                   WHEN BTRIM($4) = '' THEN NULL ELSE $4 END,
                last_name = COALESCE($5, last_name),
                date_of_birth = COALESCE($6, date_of_birth),
                gender = CASE WHEN $7::TEXT IS NULL THEN gender
                              WHEN BTRIM($7) = '' THEN NULL ELSE $7 END,
                passport_no = COALESCE($8, passport_no),
                whatsapp_number = COALESCE($9, whatsapp_number),
                email = CASE WHEN $10::TEXT IS NULL THEN email
                             WHEN BTRIM($10) = '' THEN NULL ELSE $10 END,
                destination = COALESCE($11, destination),
                visa_type = COALESCE($12, visa_type),
                application_status = COALESCE($13, application_status),
                fees = COALESCE($14, fees),
                costs = COALESCE($15, costs),
                whatsapp_sent = COALESCE($16, whatsapp_sent),
                agent_notes = CASE WHEN $17::TEXT IS NULL THEN agent_notes
                                   WHEN BTRIM($17) = '' THEN NULL ELSE $17 END,
                last_updated_at = NOW()
            WHERE id = $1 AND owner_email = $2
            RETURNING {}
            "#,
            VISA_APPLICATION_COLUMNS
        );
        let result = sqlx::query_as::<_, VisaApplicationEntity>(&sql)
            .bind(id)
            .bind(owner_email)
            .bind(&patch.first_name)
            .bind(&patch.middle_name)
            .bind(&patch.last_name)
            .bind(&patch.date_of_birth)
            .bind(&patch.gender)
            .bind(&patch.passport_no)
            .bind(&patch.whatsapp_number)
            .bind(&patch.email)
            .bind(&patch.destination)
            .bind(&patch.visa_type)
            .bind(patch.application_status.map(|s| s.as_str()))
            .bind(patch.fees)
            .bind(patch.costs)
            .bind(patch.whatsapp_sent)
            .bind(&patch.agent_notes)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Deletes one application of an owner. Returns the number of rows removed.
    pub async fn delete_by_id(&self, owner_email: &str, id: i64) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_visa_application");
        let result = sqlx::query(
            r#"
            DELETE FROM visa_applications
            WHERE id = $1 AND owner_email = $2
            "#,
        )
        .bind(id)
        .bind(owner_email)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected())
    }
}

fn into_domain(entity: VisaApplicationEntity) -> Result<VisaApplication, DomainError> {
    VisaApplication::try_from(entity).map_err(DomainError::Store)
}

#[async_trait::async_trait]
impl ApplicationStore for VisaApplicationRepository {
    async fn list(&self, tenant: &TenantId) -> Result<Vec<VisaApplication>, DomainError> {
        self.list_by_owner(tenant.as_str())
            .await
            .map_err(store_error)?
            .into_iter()
            .map(into_domain)
            .collect()
    }

    async fn get(
        &self,
        tenant: &TenantId,
        id: i64,
    ) -> Result<Option<VisaApplication>, DomainError> {
        self.find_by_id(tenant.as_str(), id)
            .await
            .map_err(store_error)?
            .map(into_domain)
            .transpose()
    }

    async fn create(
        &self,
        tenant: &TenantId,
        application: NewApplication,
    ) -> Result<VisaApplication, DomainError> {
        let entity = self
            .insert(tenant.as_str(), &application)
            .await
            .map_err(store_error)?;
        info!(tenant = %tenant, application_id = entity.id, "Visa application created");
        into_domain(entity)
    }

    async fn update(
        &self,
        tenant: &TenantId,
        id: i64,
        patch: &ApplicationPatch,
    ) -> Result<VisaApplication, DomainError> {
        let entity = self.update_fields(tenant.as_str(), id, patch)
            .await
            .map_err(store_error)?
            .ok_or(DomainError::ApplicationNotFound(id))?;
        info!(
            tenant = %tenant,
            application_id = id,
            fields = ?patch.field_names(),
            "Visa application updated"
        );
        into_domain(entity)
    }

    async fn delete(&self, tenant: &TenantId, id: i64) -> Result<(), DomainError> {
        let removed = self.delete_by_id(tenant.as_str(), id)
            .await
            .map_err(store_error)?;
        if removed == 0 {
            return Err(DomainError::ApplicationNotFound(id));
        }
        info!(tenant = %tenant, application_id = id, "Visa application deleted");
        Ok(())
    }
}
