//! Tenant settings domain models.
//!
//! Per-agency branding used by the console chrome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::application::APPLICATION_COLUMNS;

/// Agency name shown when a tenant never saved settings.
pub const DEFAULT_AGENCY_NAME: &str = "Travel Agency";

/// Agent label shown when no agency name is available.
pub const DEFAULT_AGENT_NAME: &str = "Agent";

/// Logo shown when the stored reference is missing or unusable.
pub const DEFAULT_LOGO_URL: &str = "/logo.svg";

/// Stored settings record for one tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TenantSettings {
    pub owner_email: String,
    pub agency_name: String,
    pub logo_url: Option<String>,
    /// Table columns the tenant chose to show. `None` shows all of them.
    pub visible_fields: Option<Vec<String>>,
    pub updated_at: DateTime<Utc>,
}

/// PUT request to save tenant settings.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateTenantSettingsRequest {
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    #[validate(length(max = 120, message = "Agency name must be at most 120 characters"))]
    pub agency_name: String,

    /// Logo reference. Blank clears the logo.
    #[serde(default)]
    #[validate(custom(function = "validate_logo_reference"))]
    pub logo_url: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_visible_fields"))]
    pub visible_fields: Option<Vec<String>>,
}

impl UpdateTenantSettingsRequest {
    /// Trims the name and turns a blank logo into `None`.
    pub fn normalized(mut self) -> Self {
        self.agency_name = self.agency_name.trim().to_string();
        self.logo_url = self
            .logo_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        self
    }
}

lazy_static::lazy_static! {
    static ref LOGO_REGEX: regex::Regex =
        regex::Regex::new(r"^(https?://[^\s/$.?#][^\s]*|/[^\s]*)$").unwrap();
}

fn is_usable_logo(value: &str) -> bool {
    LOGO_REGEX.is_match(value)
}

/// Accepts an http(s) URL or an absolute path; blank means "no logo".
pub fn validate_logo_reference(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || is_usable_logo(trimmed) {
        Ok(())
    } else {
        let mut err = ValidationError::new("logo_url");
        err.message = Some("Logo must be an http(s) URL or an absolute path".into());
        Err(err)
    }
}

/// Every entry must name a known application column.
pub fn validate_visible_fields(fields: &[String]) -> Result<(), ValidationError> {
    match fields
        .iter()
        .find(|field| !APPLICATION_COLUMNS.contains(&field.as_str()))
    {
        None => Ok(()),
        Some(unknown) => {
            let mut err = ValidationError::new("visible_fields");
            err.message = Some(format!("Unknown column: {}", unknown).into());
            Err(err)
        }
    }
}

/// Branding resolved for the console header.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Branding {
    pub agency_name: String,
    /// First word of the agency name, used in greetings.
    pub agent_display_name: String,
    pub logo_url: String,
}

impl Branding {
    /// Resolves branding with fallbacks for missing or unusable values.
    pub fn resolve(settings: Option<&TenantSettings>) -> Self {
        let agency_name = settings
            .map(|s| s.agency_name.trim())
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_AGENCY_NAME)
            .to_string();

        let agent_display_name = settings
            .and_then(|s| s.agency_name.split_whitespace().next())
            .unwrap_or(DEFAULT_AGENT_NAME)
            .to_string();

        let logo_url = settings
            .and_then(|s| s.logo_url.as_deref())
            .map(str::trim)
            .filter(|url| is_usable_logo(url))
            .unwrap_or(DEFAULT_LOGO_URL)
            .to_string();

        Self {
            agency_name,
            agent_display_name,
            logo_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(name: &str, logo: Option<&str>) -> TenantSettings {
        TenantSettings {
            owner_email: "owner@agency.test".into(),
            agency_name: name.into(),
            logo_url: logo.map(String::from),
            visible_fields: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_branding_defaults_without_settings() {
        let branding = Branding::resolve(None);
        assert_eq!(branding.agency_name, "Travel Agency");
        assert_eq!(branding.agent_display_name, "Agent");
        assert_eq!(branding.logo_url, DEFAULT_LOGO_URL);
    }

    #[test]
    fn test_branding_uses_first_word_and_valid_logo() {
        let s = settings("Sunrise Visa Services", Some("https://cdn.test/logo.png"));
        let branding = Branding::resolve(Some(&s));
        assert_eq!(branding.agency_name, "Sunrise Visa Services");
        assert_eq!(branding.agent_display_name, "Sunrise");
        assert_eq!(branding.logo_url, "https://cdn.test/logo.png");
    }

    #[test]
    fn test_branding_rejects_unusable_logo() {
        let s = settings("Sunrise", Some("data:image/png;base64,AAAA"));
        assert_eq!(Branding::resolve(Some(&s)).logo_url, DEFAULT_LOGO_URL);
    }

    #[test]
    fn test_update_request_validation() {
        let request = UpdateTenantSettingsRequest {
            agency_name: "  Sunrise  ".into(),
            logo_url: Some("   ".into()),
            visible_fields: Some(vec!["first_name".into(), "profit".into()]),
        }
        .normalized();
        assert_eq!(request.agency_name, "Sunrise");
        assert_eq!(request.logo_url, None);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_update_request_rejects_unknown_column_and_bad_logo() {
        let request = UpdateTenantSettingsRequest {
            agency_name: "Sunrise".into(),
            logo_url: Some("ftp://files.test/logo.png".into()),
            visible_fields: Some(vec!["shoe_size".into()]),
        };
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("logo_url"));
        assert!(fields.contains_key("visible_fields"));
    }

    #[test]
    fn test_update_request_deserialization() {
        let json = r#"{"agency_name": "Sunrise"}"#;
        let request: UpdateTenantSettingsRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.logo_url, None);
        assert_eq!(request.visible_fields, None);
    }
}
