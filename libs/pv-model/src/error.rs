//! Model Layer Error Types

use thiserror::Error;

/// Result type for pv-model operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Model layer errors
///
/// Row-level data problems never surface here; they are recovered inside the
/// parser. Only whole-batch problems are reported.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Submitted batch text was empty or whitespace only
    #[error("Batch is empty: nothing to analyze")]
    EmptyBatch,

    /// Tabular text could not be read at all
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid delimiter or reader setting
    #[error("Invalid input format: {0}")]
    InvalidFormat(String),
}

impl ModelError {
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        ModelError::InvalidFormat(msg.into())
    }
}
