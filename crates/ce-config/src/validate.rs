//! Configuration validation errors and results.

use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error: {0}")]
    ParseError(String),

    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    #[error("unsupported schema version: {found} (supported: {supported})")]
    SchemaVersion { found: String, supported: String },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Outcome of semantic validation: every violated constraint, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn push(&mut self, field: &str, reason: impl Into<String>) {
        self.errors.push(format!("{}: {}", field, reason.into()));
    }

    /// Convert into the first error, if any.
    pub fn into_result(self) -> Result<(), ValidationError> {
        match self.errors.into_iter().next() {
            None => Ok(()),
            Some(first) => {
                let (field, reason) = first.split_once(": ").unwrap_or(("config", first.as_str()));
                Err(ValidationError::InvalidValue {
                    field: field.to_string(),
                    reason: reason.to_string(),
                })
            }
        }
    }
}
