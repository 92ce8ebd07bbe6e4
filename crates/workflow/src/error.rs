//! Workflow errors surfaced to the API layer

use kycflow_core::CoreError;
use kycflow_scoring::ScoringError;
use thiserror::Error;

use crate::extractor::ExtractionError;
use crate::store::StoreError;

/// Errors from case operations
///
/// A failed operation never leaves a partial audit entry or report behind.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Case not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(#[from] ExtractionError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ScoringError),

    #[error("Case {id} was modified concurrently (expected version {expected})")]
    Conflict { id: String, expected: u64 },

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { id, expected } => WorkflowError::Conflict { id, expected },
            StoreError::NotFound(id) => WorkflowError::NotFound(id),
            other => WorkflowError::Store(other),
        }
    }
}

impl From<CoreError> for WorkflowError {
    fn from(err: CoreError) -> Self {
        WorkflowError::InvalidInput(err.to_string())
    }
}

/// Result type for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;
