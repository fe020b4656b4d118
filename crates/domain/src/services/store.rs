//! Store traits for application records and tenant settings.
//!
//! The persistence crate implements these against PostgreSQL. The in-memory
//! implementations below back the domain tests.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;

use crate::error::DomainError;
use crate::models::{
    ApplicationPatch, ApplicationStatus, NewApplication, TenantId, TenantSettings,
    UpdateTenantSettingsRequest, VisaApplication,
};

/// Tenant-scoped access to the `visa_applications` table.
#[async_trait::async_trait]
pub trait ApplicationStore: Send + Sync {
    /// All applications of the tenant, newest submission first.
    async fn list(&self, tenant: &TenantId) -> Result<Vec<VisaApplication>, DomainError>;

    async fn get(&self, tenant: &TenantId, id: i64)
        -> Result<Option<VisaApplication>, DomainError>;

    /// Inserts a PENDING application owned by the tenant.
    async fn create(
        &self,
        tenant: &TenantId,
        application: NewApplication,
    ) -> Result<VisaApplication, DomainError>;

    /// Applies the fields present in `patch` and refreshes `last_updated_at`.
    async fn update(
        &self,
        tenant: &TenantId,
        id: i64,
        patch: &ApplicationPatch,
    ) -> Result<VisaApplication, DomainError>;

    async fn delete(&self, tenant: &TenantId, id: i64) -> Result<(), DomainError>;
}

/// Per-tenant settings record, upserted by owner.
#[async_trait::async_trait]
pub trait TenantSettingsStore: Send + Sync {
    async fn get(&self, tenant: &TenantId) -> Result<Option<TenantSettings>, DomainError>;

    async fn upsert(
        &self,
        tenant: &TenantId,
        request: &UpdateTenantSettingsRequest,
    ) -> Result<TenantSettings, DomainError>;
}

#[derive(Default)]
struct InMemoryTable {
    next_id: i64,
    rows: Vec<VisaApplication>,
}

/// Application store held in process memory.
#[derive(Default)]
pub struct InMemoryApplicationStore {
    table: Mutex<InMemoryTable>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    /// Number of write calls received, successful or not.
    writes: AtomicUsize,
}

impl InMemoryApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds rows as they would come back from the database.
    pub async fn with_rows(rows: Vec<VisaApplication>) -> Self {
        let store = Self::new();
        {
            let mut table = store.table.lock().await;
            table.next_id = rows.iter().map(|r| r.id).max().unwrap_or(0);
            table.rows = rows;
        }
        store
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_write(&self) -> Result<(), DomainError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::Store("simulated write failure".into()));
        }
        Ok(())
    }

    fn check_read(&self) -> Result<(), DomainError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DomainError::Store("simulated read failure".into()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ApplicationStore for InMemoryApplicationStore {
    async fn list(&self, tenant: &TenantId) -> Result<Vec<VisaApplication>, DomainError> {
        self.check_read()?;
        let table = self.table.lock().await;
        let mut rows: Vec<VisaApplication> = table
            .rows
            .iter()
            .filter(|r| r.owner_email == tenant.as_str())
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.submitted_at
                .cmp(&a.submitted_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(rows)
    }

    async fn get(
        &self,
        tenant: &TenantId,
        id: i64,
    ) -> Result<Option<VisaApplication>, DomainError> {
        self.check_read()?;
        let table = self.table.lock().await;
        Ok(table
            .rows
            .iter()
            .find(|r| r.id == id && r.owner_email == tenant.as_str())
            .cloned())
    }

    async fn create(
        &self,
        tenant: &TenantId,
        application: NewApplication,
    ) -> Result<VisaApplication, DomainError> {
        self.check_write()?;
        let mut table = self.table.lock().await;
        table.next_id += 1;
        let now = Utc::now();
        let row = VisaApplication {
            id: table.next_id,
            owner_email: tenant.to_string(),
            first_name: application.first_name,
            middle_name: application.middle_name,
            last_name: application.last_name,
            date_of_birth: application.date_of_birth,
            gender: application.gender,
            passport_no: application.passport_no,
            whatsapp_number: application.whatsapp_number,
            email: application.email,
            destination: application.destination,
            visa_type: application.visa_type,
            application_status: ApplicationStatus::Pending,
            fees: application.fees,
            costs: application.costs,
            whatsapp_sent: false,
            agent_notes: application.agent_notes,
            document_urls: application.document_urls,
            agent_id: tenant.to_string(),
            submitted_at: now,
            last_updated_at: now,
        };
        table.rows.push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        tenant: &TenantId,
        id: i64,
        patch: &ApplicationPatch,
    ) -> Result<VisaApplication, DomainError> {
        self.check_write()?;
        let mut table = self.table.lock().await;
        let row = table
            .rows
            .iter_mut()
            .find(|r| r.id == id && r.owner_email == tenant.as_str())
            .ok_or(DomainError::ApplicationNotFound(id))?;
        row.apply_patch(patch);
        row.last_updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete(&self, tenant: &TenantId, id: i64) -> Result<(), DomainError> {
        self.check_write()?;
        let mut table = self.table.lock().await;
        let before = table.rows.len();
        table
            .rows
            .retain(|r| !(r.id == id && r.owner_email == tenant.as_str()));
        if table.rows.len() == before {
            return Err(DomainError::ApplicationNotFound(id));
        }
        Ok(())
    }
}

/// Tenant settings held in process memory.
#[derive(Default)]
pub struct InMemoryTenantSettingsStore {
    records: Mutex<HashMap<TenantId, TenantSettings>>,
}

impl InMemoryTenantSettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl TenantSettingsStore for InMemoryTenantSettingsStore {
    async fn get(&self, tenant: &TenantId) -> Result<Option<TenantSettings>, DomainError> {
        Ok(self.records.lock().await.get(tenant).cloned())
    }

    async fn upsert(
        &self,
        tenant: &TenantId,
        request: &UpdateTenantSettingsRequest,
    ) -> Result<TenantSettings, DomainError> {
        let settings = TenantSettings {
            owner_email: tenant.to_string(),
            agency_name: request.agency_name.clone(),
            logo_url: request.logo_url.clone(),
            visible_fields: request.visible_fields.clone(),
            updated_at: Utc::now(),
        };
        self.records
            .lock()
            .await
            .insert(tenant.clone(), settings.clone());
        Ok(settings)
    }
}
