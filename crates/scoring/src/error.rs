//! Scoring errors

use thiserror::Error;

/// Errors from the scoring engine
///
/// Normal absence of data (missing field, low confidence) is never an error;
/// it shows up as a sub-score and/or anomaly instead.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to read scoring config: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("Failed to parse scoring config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Failed to serialize report: {0}")]
    Serialization(String),
}

/// Result type for scoring operations
pub type ScoringResult<T> = Result<T, ScoringError>;
