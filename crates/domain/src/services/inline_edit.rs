//! Inline edit controller.
//!
//! Keeps two layers of application data for one operator: the
//! `authoritative` rows as last fetched from the store, and the `displayed`
//! rows with optimistic field commits applied on top. Field commits land in a
//! sparse per-row draft, and a row save sends the whole draft as one partial
//! update.
//! At most one field is focused across the whole table.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, warn};
use validator::Validate;

use super::listing::{self, ListQuery};
use super::store::ApplicationStore;
use crate::error::DomainError;
use crate::models::{
    ApplicationPatch, ApplicationResponse, ApplicationStatus, EditableField, FieldValue,
    NewApplication, TenantId, VisaApplication,
};

/// Label shown for a sent WhatsApp notification.
pub const WHATSAPP_SENT_LABEL: &str = "✓ Sent";

/// Label shown while the notification is still outstanding.
pub const WHATSAPP_PENDING_LABEL: &str = "✗ Pending";

const GENDER_CODES: [(&str, &str); 4] = [
    ("M", "Male"),
    ("F", "Female"),
    ("O", "Other"),
    ("N/A", "Not specified"),
];

/// Parses the longest leading decimal number of `raw`.
///
/// Leading whitespace is skipped and trailing garbage ignored, so `"12.5abc"`
/// reads as 12.5. Anything without a numeric prefix reads as 0.
pub fn parse_amount(raw: &str) -> f64 {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return 0.0;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end]
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

/// Maps a gender code from the table to the stored word.
///
/// Unknown input is stored as typed.
pub fn gender_from_code(raw: &str) -> String {
    GENDER_CODES
        .iter()
        .find(|(code, _)| *code == raw)
        .map(|(_, word)| word.to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Maps a stored gender word to its table code.
pub fn gender_code(stored: Option<&str>) -> &'static str {
    GENDER_CODES
        .iter()
        .find(|(_, word)| Some(*word) == stored)
        .map(|(code, _)| *code)
        .unwrap_or("N/A")
}

/// Converts raw operator input into the value stored for `field`.
pub fn coerce(field: EditableField, raw: &str) -> Result<FieldValue, DomainError> {
    let value = match field {
        EditableField::Fees | EditableField::Costs => FieldValue::Number(parse_amount(raw)),
        EditableField::WhatsappSent => FieldValue::Flag(raw == WHATSAPP_SENT_LABEL),
        EditableField::Gender => FieldValue::Text(gender_from_code(raw)),
        EditableField::ApplicationStatus => {
            let status = raw
                .parse::<ApplicationStatus>()
                .map_err(|message| DomainError::InvalidFieldValue {
                    field: field.as_str().to_string(),
                    message,
                })?;
            FieldValue::Status(status)
        }
        _ => FieldValue::Text(raw.to_string()),
    };
    Ok(value)
}

/// The value an editor widget starts from for `field`.
pub fn display_value(application: &VisaApplication, field: EditableField) -> String {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    match field {
        EditableField::FirstName => application.first_name.clone(),
        EditableField::MiddleName => text(&application.middle_name),
        EditableField::LastName => application.last_name.clone(),
        EditableField::DateOfBirth => application.date_of_birth.clone(),
        EditableField::Gender => gender_code(application.gender.as_deref()).to_string(),
        EditableField::PassportNo => application.passport_no.clone(),
        EditableField::WhatsappNumber => application.whatsapp_number.clone(),
        EditableField::Email => text(&application.email),
        EditableField::Destination => application.destination.clone(),
        EditableField::VisaType => application.visa_type.clone(),
        EditableField::ApplicationStatus => application.application_status.to_string(),
        EditableField::Fees => application.fees.to_string(),
        EditableField::Costs => application.costs.to_string(),
        EditableField::WhatsappSent => {
            let label = if application.whatsapp_sent {
                WHATSAPP_SENT_LABEL
            } else {
                WHATSAPP_PENDING_LABEL
            };
            label.to_string()
        }
        EditableField::AgentNotes => text(&application.agent_notes),
    }
}

/// The single field currently open for editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldFocus {
    pub row_id: i64,
    pub field: EditableField,
}

/// Human confirmation step before a destructive action.
pub trait DeleteConfirmation: Send + Sync {
    fn confirm(&self, application: &VisaApplication) -> bool;
}

impl<F> DeleteConfirmation for F
where
    F: Fn(&VisaApplication) -> bool + Send + Sync,
{
    fn confirm(&self, application: &VisaApplication) -> bool {
        self(application)
    }
}

/// Question put to the operator before deleting.
pub fn delete_prompt(application: &VisaApplication) -> String {
    format!(
        "This will permanently delete the application for {} (ID #{}). This action cannot be undone.",
        application.full_name(),
        application.id
    )
}

/// Serializable snapshot of a controller.
#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceView {
    pub rows: Vec<ApplicationResponse>,
    pub editing: Vec<i64>,
    pub focus: Option<FieldFocus>,
    pub drafts: BTreeMap<i64, ApplicationPatch>,
}

/// One operator's editing state over a tenant's rows.
pub struct InlineEditController {
    store: Arc<dyn ApplicationStore>,
    tenant: TenantId,
    authoritative: Vec<VisaApplication>,
    displayed: Vec<VisaApplication>,
    editing: BTreeSet<i64>,
    drafts: BTreeMap<i64, ApplicationPatch>,
    focus: Option<FieldFocus>,
}

impl InlineEditController {
    pub fn new(store: Arc<dyn ApplicationStore>, tenant: TenantId) -> Self {
        Self {
            store,
            tenant,
            authoritative: Vec::new(),
            displayed: Vec::new(),
            editing: BTreeSet::new(),
            drafts: BTreeMap::new(),
            focus: None,
        }
    }

    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    /// Rows as shown, optimistic edits included.
    pub fn applications(&self) -> &[VisaApplication] {
        &self.displayed
    }

    /// Rows as last fetched from the store.
    pub fn authoritative(&self) -> &[VisaApplication] {
        &self.authoritative
    }

    /// Filtered and sorted view of the displayed rows.
    pub fn view(&self, query: &ListQuery, now: DateTime<FixedOffset>) -> Vec<&VisaApplication> {
        listing::apply(&self.displayed, query, now)
    }

    pub fn focused(&self) -> Option<FieldFocus> {
        self.focus
    }

    pub fn is_editing(&self, row_id: i64) -> bool {
        self.editing.contains(&row_id)
    }

    pub fn draft(&self, row_id: i64) -> Option<&ApplicationPatch> {
        self.drafts.get(&row_id)
    }

    pub fn snapshot(&self) -> WorkspaceView {
        WorkspaceView {
            rows: self
                .displayed
                .iter()
                .cloned()
                .map(ApplicationResponse::from)
                .collect(),
            editing: self.editing.iter().copied().collect(),
            focus: self.focus,
            drafts: self.drafts.clone(),
        }
    }

    /// Replaces both layers with the store's current rows.
    ///
    /// On failure the rows already held stay as they were.
    pub async fn load(&mut self) -> Result<(), DomainError> {
        let rows = self.store.list(&self.tenant).await.map_err(|e| {
            warn!(tenant = %self.tenant, error = %e, "Failed to load applications");
            e
        })?;

        self.editing.retain(|id| rows.iter().any(|r| r.id == *id));
        self.drafts.retain(|id, _| rows.iter().any(|r| r.id == *id));
        if let Some(focus) = self.focus {
            if !self.editing.contains(&focus.row_id) {
                self.focus = None;
            }
        }

        debug!(tenant = %self.tenant, count = rows.len(), "Loaded applications");
        let mut displayed = rows.clone();
        for row in displayed.iter_mut() {
            if let Some(draft) = self.drafts.get(&row.id) {
                row.apply_patch(draft);
            }
        }
        self.displayed = displayed;
        self.authoritative = rows;
        Ok(())
    }

    fn displayed_row(&self, row_id: i64) -> Result<&VisaApplication, DomainError> {
        self.displayed
            .iter()
            .find(|r| r.id == row_id)
            .ok_or(DomainError::ApplicationNotFound(row_id))
    }

    /// Marks a row editable and drops any focused field.
    pub fn enter_edit_mode(&mut self, row_id: i64) -> Result<(), DomainError> {
        self.displayed_row(row_id)?;
        self.editing.insert(row_id);
        self.focus = None;
        Ok(())
    }

    /// Opens one field for editing, replacing any previous focus.
    ///
    /// Returns the value the editor should start from.
    pub fn focus(&mut self, row_id: i64, field: EditableField) -> Result<String, DomainError> {
        let row = self.displayed_row(row_id)?;
        if !self.editing.contains(&row_id) {
            return Err(DomainError::RowNotEditable(row_id));
        }
        let value = display_value(row, field);
        self.focus = Some(FieldFocus { row_id, field });
        Ok(value)
    }

    /// Commits raw input for the focused field into its row draft.
    ///
    /// Called on blur, dropdown selection or the confirm key. The displayed row
    /// is updated at once; nothing is written to the store yet.
    pub fn commit_focused(&mut self, raw: &str) -> Result<FieldValue, DomainError> {
        let focus = self.focus.ok_or(DomainError::NothingFocused)?;
        let value = coerce(focus.field, raw)?;

        let mut single = ApplicationPatch::default();
        single.set(focus.field, value.clone())?;
        self.drafts
            .entry(focus.row_id)
            .or_default()
            .set(focus.field, value.clone())?;

        if let Some(row) = self.displayed.iter_mut().find(|r| r.id == focus.row_id) {
            row.apply_patch(&single);
        }
        self.focus = None;

        debug!(
            tenant = %self.tenant,
            row_id = focus.row_id,
            field = %focus.field,
            "Committed field to draft"
        );
        Ok(value)
    }

    /// Writes the row draft as one partial update and leaves edit mode.
    ///
    /// Draft and edit mode are cleared whatever the outcome. A draft that
    /// breaks the field rules is never sent and the row reverts to its stored
    /// values. After a failed write the optimistic values stay displayed and
    /// the error is returned.
    pub async fn save_row(&mut self, row_id: i64) -> Result<Option<VisaApplication>, DomainError> {
        let draft = self.drafts.remove(&row_id);
        self.editing.remove(&row_id);
        self.focus = None;

        let saved = match draft.filter(|d| !d.is_empty()) {
            Some(patch) => {
                let patch = patch.normalized();
                if let Err(errors) = patch.validate() {
                    let error = DomainError::from(errors);
                    warn!(tenant = %self.tenant, row_id, error = %error, "Rejected row draft");
                    self.revert_row(row_id);
                    return Err(error);
                }

                let fields = patch.field_names();
                match self.store.update(&self.tenant, row_id, &patch).await {
                    Ok(saved) => {
                        debug!(tenant = %self.tenant, row_id, ?fields, "Saved row draft");
                        Some(saved)
                    }
                    Err(e) => {
                        warn!(tenant = %self.tenant, row_id, error = %e, "Failed to save row draft");
                        return Err(e);
                    }
                }
            }
            None => None,
        };

        self.load().await?;
        Ok(saved)
    }

    /// Discards the row draft, leaves edit mode and reloads from the store.
    pub async fn cancel_row(&mut self, row_id: i64) -> Result<(), DomainError> {
        self.drafts.remove(&row_id);
        self.editing.remove(&row_id);
        self.focus = None;
        self.revert_row(row_id);
        self.load().await
    }

    fn revert_row(&mut self, row_id: i64) {
        if let Some(original) = self.authoritative.iter().find(|r| r.id == row_id) {
            if let Some(row) = self.displayed.iter_mut().find(|r| r.id == row_id) {
                *row = original.clone();
            }
        }
    }

    /// Writes a status change at once, outside any draft.
    pub async fn change_status(
        &mut self,
        row_id: i64,
        status: ApplicationStatus,
    ) -> Result<VisaApplication, DomainError> {
        let updated = self
            .store
            .update(&self.tenant, row_id, &ApplicationPatch::status(status))
            .await?;
        self.load().await?;
        Ok(updated)
    }

    /// Deletes a row once the operator confirms.
    ///
    /// Returns `false` without touching the store when confirmation is
    /// declined.
    pub async fn delete(
        &mut self,
        row_id: i64,
        confirmation: &dyn DeleteConfirmation,
    ) -> Result<bool, DomainError> {
        let row = self.displayed_row(row_id)?;
        if !confirmation.confirm(row) {
            debug!(tenant = %self.tenant, row_id, "Delete declined");
            return Ok(false);
        }

        self.store.delete(&self.tenant, row_id).await?;
        self.drafts.remove(&row_id);
        self.editing.remove(&row_id);
        if self.focus.map(|f| f.row_id) == Some(row_id) {
            self.focus = None;
        }
        self.load().await?;
        Ok(true)
    }

    /// Validates and stores a new application, then reloads.
    pub async fn create(&mut self, application: NewApplication) -> Result<VisaApplication, DomainError> {
        let application = application.normalized();
        application.validate()?;
        let created = self.store.create(&self.tenant, application).await?;
        self.load().await?;
        Ok(created)
    }
}
