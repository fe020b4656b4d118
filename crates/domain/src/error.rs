//! Domain error types.

use thiserror::Error;

/// Errors raised by domain services and store implementations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// No tenant identity could be resolved for the operation.
    #[error("No tenant identity available")]
    MissingTenant,

    #[error("Application {0} not found")]
    ApplicationNotFound(i64),

    #[error("Application {0} is not in edit mode")]
    RowNotEditable(i64),

    #[error("No field is focused for editing")]
    NothingFocused,

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidFieldValue { field: String, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    /// The backing store rejected or failed the request.
    #[error("Store error: {0}")]
    Store(String),
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .iter()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .and_then(|e| e.message.clone())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "invalid".to_string());
                format!("{}: {}", field, message)
            })
            .collect();
        fields.sort();
        DomainError::Validation(fields.join("; "))
    }
}
