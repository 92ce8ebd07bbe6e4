//! KycFlow Core - Domain types
//!
//! This crate contains the types shared by the scoring engine and the
//! case workflow:
//! - `Actor` / `UserRole`: who is acting on a case
//! - `DocumentType`: the identity documents a case can carry
//! - `DeclaredProfile`: what the applicant typed into the onboarding form
//! - `ExtractionRecord`: structured output of the extraction collaborator

pub mod actor;
pub mod document;
pub mod error;
pub mod profile;

pub use actor::{Actor, UserRole};
pub use document::{
    fields, DocumentType, ExtractionRecord, FieldComparison, FormCrossValidation, QualityCheck,
};
pub use error::CoreError;
pub use profile::DeclaredProfile;
