//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod tenant_settings;
pub mod visa_application;

pub use tenant_settings::TenantSettingsEntity;
pub use visa_application::{VisaApplicationEntity, VISA_APPLICATION_COLUMNS};
