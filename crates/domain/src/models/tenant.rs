//! Tenant identity.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identity of a travel-agency account.
///
/// Every store call is scoped by a `TenantId`. It can only be built from a
/// non-blank identity string, so no read or write is ever scoped to an empty
/// tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    /// Parses an identity as handed out by the session service.
    ///
    /// Surrounding whitespace is dropped and the value is lower-cased.
    pub fn parse(identity: &str) -> Result<Self, DomainError> {
        let normalized = identity.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(DomainError::MissingTenant);
        }
        Ok(Self(normalized))
    }

    /// Resolves an optional session identity, failing when absent.
    pub fn from_session(identity: Option<&str>) -> Result<Self, DomainError> {
        identity.map_or(Err(DomainError::MissingTenant), Self::parse)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TenantId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TenantId> for String {
    fn from(tenant: TenantId) -> Self {
        tenant.0
    }
}
