//! KycFlow Workflow - maker/checker case lifecycle
//!
//! ## Flow
//! - A MAKER creates a case (DRAFT) and uploads identity documents; every
//!   upload is extracted, cross-checked against the declared form and the
//!   whole case re-scored
//! - The MAKER submits; an automated review scores the case (AI_REVIEWED)
//! - A different CHECKER approves or rejects
//!
//! ## Guarantees
//! - Every transition and upload appends exactly one audit entry
//! - Operations on one case are serialized and saved with compare-and-set
//! - A failed operation leaves the stored case untouched

pub mod case;
pub mod config;
pub mod error;
pub mod extractor;
pub mod machine;
pub mod review;
pub mod service;
pub mod store;

pub use case::{AuditAction, AuditEntry, Case, CaseStatus};
pub use config::ServiceConfig;
pub use error::{WorkflowError, WorkflowResult};
pub use extractor::{DocumentExtractor, ExtractionError, JsonExtractor, StaticExtractor};
pub use machine::{CaseStateMachine, Decision};
pub use review::AiReviewer;
pub use service::{CaseService, ValidationView};
pub use store::{CaseFilter, CaseStore, MemoryCaseStore, SqliteCaseStore, StoreError};
