//! Tenant settings entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the tenant_settings table.
#[derive(Debug, Clone, FromRow)]
pub struct TenantSettingsEntity {
    pub owner_email: String,
    pub agency_name: String,
    pub logo_url: Option<String>,
    pub visible_fields: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TenantSettingsEntity> for domain::models::TenantSettings {
    fn from(entity: TenantSettingsEntity) -> Self {
        Self {
            owner_email: entity.owner_email,
            agency_name: entity.agency_name,
            logo_url: entity.logo_url,
            visible_fields: entity.visible_fields,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_to_domain() {
        let entity = TenantSettingsEntity {
            owner_email: "owner@agency.test".to_string(),
            agency_name: "Sunrise Visas".to_string(),
            logo_url: None,
            visible_fields: Some(vec!["first_name".to_string()]),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let settings: domain::models::TenantSettings = entity.into();
        assert_eq!(settings.agency_name, "Sunrise Visas");
        assert_eq!(settings.visible_fields.unwrap().len(), 1);
    }
}
