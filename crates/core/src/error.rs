//! Core parse errors

use thiserror::Error;

/// Errors that can occur when parsing core domain values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Unsupported document type: {0}")]
    UnknownDocumentType(String),

    #[error("Invalid role: {0} (must be MAKER or CHECKER)")]
    UnknownRole(String),

    #[error("Actor id cannot be empty")]
    EmptyActorId,
}
