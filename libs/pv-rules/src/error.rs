//! Rule Engine Error Types

use crate::types::RuleId;
use thiserror::Error;

/// Result type for rule operations
pub type Result<T> = std::result::Result<T, RuleError>;

/// Rule engine errors
#[derive(Debug, Error)]
pub enum RuleError {
    /// Draft rejected by validation; the draft stays in edit
    #[error("Invalid rule {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Rule not found
    #[error("Rule not found: {0}")]
    NotFound(RuleId),

    /// No rule id left to hand out
    #[error("Rule ids exhausted after {0}")]
    IdsExhausted(RuleId),

    /// Unsupported rule file format
    #[error("Unsupported rule file format: {0}")]
    UnsupportedFormat(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for RuleError {
    fn from(err: serde_json::Error) -> Self {
        RuleError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for RuleError {
    fn from(err: serde_yaml::Error) -> Self {
        RuleError::Serialization(err.to_string())
    }
}

impl RuleError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        RuleError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, RuleError::Validation { .. })
    }
}
