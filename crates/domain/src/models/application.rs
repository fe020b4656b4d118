//! Visa application domain models.
//!
//! One `VisaApplication` is one row of the `visa_applications` table. Profit
//! and margin are derived from `fees`/`costs` on every read and never stored.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::{Validate, ValidateEmail, ValidationError};

use crate::error::DomainError;

/// Column names of an application row, in table and export order.
pub const APPLICATION_COLUMNS: [&str; 18] = [
    "id",
    "first_name",
    "middle_name",
    "last_name",
    "gender",
    "date_of_birth",
    "passport_no",
    "whatsapp_number",
    "email",
    "destination",
    "visa_type",
    "fees",
    "costs",
    "profit",
    "application_status",
    "agent_id",
    "submitted_at",
    "last_updated_at",
];

/// Processing status of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 3] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Approved,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "PENDING",
            ApplicationStatus::Approved => "APPROVED",
            ApplicationStatus::Rejected => "REJECTED",
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Ok(ApplicationStatus::Pending),
            "APPROVED" => Ok(ApplicationStatus::Approved),
            "REJECTED" => Ok(ApplicationStatus::Rejected),
            _ => Err(format!("Unknown application status: {}", s)),
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A visa application as stored for a tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct VisaApplication {
    pub id: i64,
    pub owner_email: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub date_of_birth: String,
    pub gender: Option<String>,
    pub passport_no: String,
    pub whatsapp_number: String,
    pub email: Option<String>,
    pub destination: String,
    pub visa_type: String,
    pub application_status: ApplicationStatus,
    pub fees: f64,
    pub costs: f64,
    pub whatsapp_sent: bool,
    pub agent_notes: Option<String>,
    pub document_urls: Vec<String>,
    pub agent_id: String,
    pub submitted_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

impl VisaApplication {
    /// Agency profit on this application: fees minus costs.
    pub fn profit(&self) -> f64 {
        self.fees - self.costs
    }

    /// Profit as a rounded percentage of fees.
    ///
    /// `None` when fees are zero.
    pub fn profit_margin_percent(&self) -> Option<i64> {
        if self.fees == 0.0 {
            return None;
        }
        let margin = (self.profit() / self.fees) * 100.0;
        margin.is_finite().then(|| margin.round() as i64)
    }

    /// "First Last" display name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Applies every field present in the patch.
    ///
    /// Identity, owner and timestamps are never touched here; the store
    /// refreshes `last_updated_at` itself.
    pub fn apply_patch(&mut self, patch: &ApplicationPatch) {
        if let Some(ref v) = patch.first_name {
            self.first_name = v.clone();
        }
        if let Some(ref v) = patch.middle_name {
            self.middle_name = non_empty(v);
        }
        if let Some(ref v) = patch.last_name {
            self.last_name = v.clone();
        }
        if let Some(ref v) = patch.date_of_birth {
            self.date_of_birth = v.clone();
        }
        if let Some(ref v) = patch.gender {
            self.gender = non_empty(v);
        }
        if let Some(ref v) = patch.passport_no {
            self.passport_no = v.clone();
        }
        if let Some(ref v) = patch.whatsapp_number {
            self.whatsapp_number = v.clone();
        }
        if let Some(ref v) = patch.email {
            self.email = non_empty(v);
        }
        if let Some(ref v) = patch.destination {
            self.destination = v.clone();
        }
        if let Some(ref v) = patch.visa_type {
            self.visa_type = v.clone();
        }
        if let Some(status) = patch.application_status {
            self.application_status = status;
        }
        if let Some(fees) = patch.fees {
            self.fees = fees;
        }
        if let Some(costs) = patch.costs {
            self.costs = costs;
        }
        if let Some(sent) = patch.whatsapp_sent {
            self.whatsapp_sent = sent;
        }
        if let Some(ref v) = patch.agent_notes {
            self.agent_notes = non_empty(v);
        }
    }
}

/// Optional text columns store blank input as null.
pub fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Validates a `YYYY-MM-DD` date of birth.
pub fn validate_birth_date(value: &str) -> Result<(), ValidationError> {
    match NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
        Ok(date) if date <= Utc::now().date_naive() => Ok(()),
        _ => {
            let mut err = ValidationError::new("birth_date");
            err.message = Some("Date of birth must be a past date in YYYY-MM-DD format".into());
            Err(err)
        }
    }
}

/// An empty email clears the column; anything else must be an address.
pub fn validate_clearable_email(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() || value.validate_email() {
        Ok(())
    } else {
        let mut err = ValidationError::new("email");
        err.message = Some("Invalid email format".into());
        Err(err)
    }
}

/// Creation payload from the new-application form.
///
/// Status is not part of the payload: the store always creates PENDING rows
/// and stamps both timestamps itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct NewApplication {
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    #[validate(length(max = 100, message = "First name must be at most 100 characters"))]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(max = 100, message = "Middle name must be at most 100 characters"))]
    pub middle_name: Option<String>,

    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    #[validate(length(max = 100, message = "Last name must be at most 100 characters"))]
    pub last_name: String,

    #[validate(custom(function = "validate_birth_date"))]
    pub date_of_birth: String,

    #[serde(default)]
    pub gender: Option<String>,

    #[validate(custom(function = "shared::validation::validate_passport_number"))]
    pub passport_no: String,

    #[validate(custom(function = "shared::validation::validate_phone_number"))]
    pub whatsapp_number: String,

    #[serde(default)]
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub destination: String,

    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub visa_type: String,

    #[validate(custom(function = "shared::validation::validate_amount"))]
    pub fees: f64,

    #[validate(custom(function = "shared::validation::validate_amount"))]
    pub costs: f64,

    #[serde(default)]
    pub agent_notes: Option<String>,

    #[serde(default)]
    pub document_urls: Vec<String>,
}

impl NewApplication {
    /// Turns blank optional inputs into `None` and trims identifiers.
    pub fn normalized(mut self) -> Self {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.passport_no = self.passport_no.trim().to_uppercase();
        self.middle_name = self.middle_name.as_deref().and_then(non_empty);
        self.gender = self.gender.as_deref().and_then(non_empty);
        self.email = self.email.as_deref().and_then(non_empty);
        self.agent_notes = self.agent_notes.as_deref().and_then(non_empty);
        self.document_urls.retain(|url| !url.trim().is_empty());
        self
    }
}

/// Sparse set of field changes for one application.
///
/// Only the fields that were actually edited are present. This is both the
/// body of a partial update and the per-row draft of the inline editor. For
/// optional text columns an empty string clears the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct ApplicationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    #[validate(length(max = 100, message = "First name must be at most 100 characters"))]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100, message = "Middle name must be at most 100 characters"))]
    pub middle_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    #[validate(length(max = 100, message = "Last name must be at most 100 characters"))]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_birth_date"))]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "shared::validation::validate_passport_number"))]
    pub passport_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "shared::validation::validate_phone_number"))]
    pub whatsapp_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_clearable_email"))]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub visa_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_status: Option<ApplicationStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "shared::validation::validate_amount"))]
    pub fees: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "shared::validation::validate_amount"))]
    pub costs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp_sent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_notes: Option<String>,
}

impl ApplicationPatch {
    /// A patch that only changes the status.
    pub fn status(status: ApplicationStatus) -> Self {
        Self {
            application_status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Trims names and upper-cases the passport number, as on create.
    pub fn normalized(mut self) -> Self {
        if let Some(v) = self.first_name.as_mut() {
            *v = v.trim().to_string();
        }
        if let Some(v) = self.last_name.as_mut() {
            *v = v.trim().to_string();
        }
        if let Some(v) = self.passport_no.as_mut() {
            *v = v.trim().to_uppercase();
        }
        self
    }

    /// Records one coerced field value, replacing any earlier value.
    pub fn set(&mut self, field: EditableField, value: FieldValue) -> Result<(), DomainError> {
        let mismatch = |value: &FieldValue| DomainError::InvalidFieldValue {
            field: field.as_str().to_string(),
            message: format!("unexpected value {:?}", value),
        };

        match (field, value) {
            (EditableField::FirstName, FieldValue::Text(v)) => self.first_name = Some(v),
            (EditableField::MiddleName, FieldValue::Text(v)) => self.middle_name = Some(v),
            (EditableField::LastName, FieldValue::Text(v)) => self.last_name = Some(v),
            (EditableField::DateOfBirth, FieldValue::Text(v)) => self.date_of_birth = Some(v),
            (EditableField::Gender, FieldValue::Text(v)) => self.gender = Some(v),
            (EditableField::PassportNo, FieldValue::Text(v)) => self.passport_no = Some(v),
            (EditableField::WhatsappNumber, FieldValue::Text(v)) => {
                self.whatsapp_number = Some(v)
            }
            (EditableField::Email, FieldValue::Text(v)) => self.email = Some(v),
            (EditableField::Destination, FieldValue::Text(v)) => self.destination = Some(v),
            (EditableField::VisaType, FieldValue::Text(v)) => self.visa_type = Some(v),
            (EditableField::AgentNotes, FieldValue::Text(v)) => self.agent_notes = Some(v),
            (EditableField::ApplicationStatus, FieldValue::Status(s)) => {
                self.application_status = Some(s)
            }
            (EditableField::Fees, FieldValue::Number(n)) => self.fees = Some(n),
            (EditableField::Costs, FieldValue::Number(n)) => self.costs = Some(n),
            (EditableField::WhatsappSent, FieldValue::Flag(b)) => self.whatsapp_sent = Some(b),
            (_, other) => return Err(mismatch(&other)),
        }
        Ok(())
    }

    /// Names of the fields present in this patch, for logging.
    pub fn field_names(&self) -> Vec<&'static str> {
        EditableField::ALL
            .iter()
            .filter(|field| self.contains(**field))
            .map(|field| field.as_str())
            .collect()
    }

    fn contains(&self, field: EditableField) -> bool {
        match field {
            EditableField::FirstName => self.first_name.is_some(),
            EditableField::MiddleName => self.middle_name.is_some(),
            EditableField::LastName => self.last_name.is_some(),
            EditableField::DateOfBirth => self.date_of_birth.is_some(),
            EditableField::Gender => self.gender.is_some(),
            EditableField::PassportNo => self.passport_no.is_some(),
            EditableField::WhatsappNumber => self.whatsapp_number.is_some(),
            EditableField::Email => self.email.is_some(),
            EditableField::Destination => self.destination.is_some(),
            EditableField::VisaType => self.visa_type.is_some(),
            EditableField::ApplicationStatus => self.application_status.is_some(),
            EditableField::Fees => self.fees.is_some(),
            EditableField::Costs => self.costs.is_some(),
            EditableField::WhatsappSent => self.whatsapp_sent.is_some(),
            EditableField::AgentNotes => self.agent_notes.is_some(),
        }
    }
}

/// Columns an operator can edit in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditableField {
    FirstName,
    MiddleName,
    LastName,
    DateOfBirth,
    Gender,
    PassportNo,
    WhatsappNumber,
    Email,
    Destination,
    VisaType,
    ApplicationStatus,
    Fees,
    Costs,
    WhatsappSent,
    AgentNotes,
}

impl EditableField {
    pub const ALL: [EditableField; 15] = [
        EditableField::FirstName,
        EditableField::MiddleName,
        EditableField::LastName,
        EditableField::DateOfBirth,
        EditableField::Gender,
        EditableField::PassportNo,
        EditableField::WhatsappNumber,
        EditableField::Email,
        EditableField::Destination,
        EditableField::VisaType,
        EditableField::ApplicationStatus,
        EditableField::Fees,
        EditableField::Costs,
        EditableField::WhatsappSent,
        EditableField::AgentNotes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EditableField::FirstName => "first_name",
            EditableField::MiddleName => "middle_name",
            EditableField::LastName => "last_name",
            EditableField::DateOfBirth => "date_of_birth",
            EditableField::Gender => "gender",
            EditableField::PassportNo => "passport_no",
            EditableField::WhatsappNumber => "whatsapp_number",
            EditableField::Email => "email",
            EditableField::Destination => "destination",
            EditableField::VisaType => "visa_type",
            EditableField::ApplicationStatus => "application_status",
            EditableField::Fees => "fees",
            EditableField::Costs => "costs",
            EditableField::WhatsappSent => "whatsapp_sent",
            EditableField::AgentNotes => "agent_notes",
        }
    }
}

impl FromStr for EditableField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EditableField::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s.trim())
            .ok_or_else(|| DomainError::UnknownField(s.to_string()))
    }
}

impl std::fmt::Display for EditableField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A coerced value ready to be stored in a draft.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Flag(bool),
    Status(ApplicationStatus),
}

/// Request body for an immediate status change.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UpdateStatusRequest {
    pub status: ApplicationStatus,
}

/// API representation of an application, with derived figures.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ApplicationResponse {
    #[serde(flatten)]
    pub application: VisaApplication,
    pub profit: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit_margin_percent: Option<i64>,
}

impl From<VisaApplication> for ApplicationResponse {
    fn from(application: VisaApplication) -> Self {
        Self {
            profit: application.profit(),
            profit_margin_percent: application.profit_margin_percent(),
            application,
        }
    }
}
