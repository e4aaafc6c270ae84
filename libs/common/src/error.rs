//! Configuration and bootstrap errors

use thiserror::Error;

/// Result type for pv-common operations
pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Layered configuration could not be extracted
    #[error("Failed to load configuration: {0}")]
    Load(String),

    /// Explicit configuration file does not exist
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Unsupported config file format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid configuration: {field}: {reason}")]
    Invalid { field: String, reason: String },

    /// Logging could not be installed
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Load(err.to_string())
    }
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
