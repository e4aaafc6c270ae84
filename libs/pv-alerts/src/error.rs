//! Alert pipeline error types

use pv_model::ModelError;
use pv_rules::RuleError;
use thiserror::Error;

/// Result type for alert pipeline operations
pub type Result<T> = std::result::Result<T, AlertError>;

#[derive(Debug, Error)]
pub enum AlertError {
    /// Submitted batch was empty or whitespace only; nothing changed
    #[error("Batch is empty: paste or load readings before analyzing")]
    EmptyBatch,

    /// Batch text could not be read as a table
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Rule operation rejected
    #[error(transparent)]
    Rule(#[from] RuleError),

    /// Invalid threshold or setting
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    /// Alert export failed
    #[error("Export error: {0}")]
    Export(String),

    /// State snapshot could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AlertError {
    fn from(err: serde_json::Error) -> Self {
        AlertError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for AlertError {
    fn from(err: csv::Error) -> Self {
        AlertError::Export(err.to_string())
    }
}

impl AlertError {
    pub fn storage(msg: impl Into<String>) -> Self {
        AlertError::Storage(msg.into())
    }

    /// Whether the caller should show this to the operator as a rejection
    /// rather than a failure
    pub fn is_rejection(&self) -> bool {
        match self {
            AlertError::EmptyBatch | AlertError::InvalidSetting(_) => true,
            AlertError::Model(ModelError::EmptyBatch) => true,
            AlertError::Rule(e) => e.is_validation(),
            _ => false,
        }
    }
}
