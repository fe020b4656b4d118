//! Repository implementations for database operations.
//!
//! Each repository also implements the matching domain store trait.

pub mod tenant_settings;
pub mod visa_application;

pub use tenant_settings::TenantSettingsRepository;
pub use visa_application::VisaApplicationRepository;

use domain::DomainError;
use tracing::error;

/// Maps a database failure into the domain's store error.
pub(crate) fn store_error(err: sqlx::Error) -> DomainError {
    error!(error = %err, "Database operation failed");
    DomainError::Store(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_keeps_message() {
        let err = store_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, DomainError::Store(ref m) if m.contains("no rows")));
    }
}
