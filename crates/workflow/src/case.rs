//! Case records and their audit trail

use chrono::{DateTime, Utc};
use kycflow_core::{Actor, DeclaredProfile, DocumentType, ExtractionRecord, UserRole};
use kycflow_scoring::{RiskLevel, ValidationReport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::WorkflowError;

pub const CASE_ID_PREFIX: &str = "CASE-";
const CASE_ID_SUFFIX_LEN: usize = 8;

/// Lifecycle status of a case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStatus {
    /// Being assembled by its maker
    Draft,
    /// Handed over for review
    Submitted,
    /// Automated review recorded
    AiReviewed,
    CheckerApproved,
    CheckerRejected,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Draft => "DRAFT",
            CaseStatus::Submitted => "SUBMITTED",
            CaseStatus::AiReviewed => "AI_REVIEWED",
            CaseStatus::CheckerApproved => "CHECKER_APPROVED",
            CaseStatus::CheckerRejected => "CHECKER_REJECTED",
        }
    }

    /// No transitions leave a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self, CaseStatus::CheckerApproved | CaseStatus::CheckerRejected)
    }

    /// Statuses from which a checker may decide
    pub fn awaits_decision(&self) -> bool {
        matches!(self, CaseStatus::Submitted | CaseStatus::AiReviewed)
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseStatus {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DRAFT" => Ok(CaseStatus::Draft),
            "SUBMITTED" => Ok(CaseStatus::Submitted),
            "AI_REVIEWED" => Ok(CaseStatus::AiReviewed),
            "CHECKER_APPROVED" => Ok(CaseStatus::CheckerApproved),
            "CHECKER_REJECTED" => Ok(CaseStatus::CheckerRejected),
            _ => Err(WorkflowError::InvalidInput(format!("Unknown case status: {}", s))),
        }
    }
}

/// What an audit entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Created,
    Submitted,
    AiReviewed,
    CheckerApproved,
    CheckerRejected,
    OcrProcessed,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Created => "CREATED",
            AuditAction::Submitted => "SUBMITTED",
            AuditAction::AiReviewed => "AI_REVIEWED",
            AuditAction::CheckerApproved => "CHECKER_APPROVED",
            AuditAction::CheckerRejected => "CHECKER_REJECTED",
            AuditAction::OcrProcessed => "OCR_PROCESSED",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One append-only audit record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub action: AuditAction,
    pub actor_id: String,
    pub actor_name: String,
    pub actor_role: UserRole,
    pub timestamp: DateTime<Utc>,
    pub comment: String,
}

impl AuditEntry {
    pub fn new(action: AuditAction, actor: &Actor, comment: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            action,
            actor_id: actor.id.clone(),
            actor_name: actor.name.clone(),
            actor_role: actor.role,
            timestamp,
            comment: comment.into(),
        }
    }
}

/// A KYC verification case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub id: String,
    pub status: CaseStatus,
    pub profile: DeclaredProfile,
    /// Latest extraction per document type
    #[serde(default)]
    pub documents: BTreeMap<DocumentType, ExtractionRecord>,
    /// Uploaded filename per document type
    #[serde(default)]
    pub filenames: BTreeMap<DocumentType, String>,
    /// Current report, replaced wholesale on each re-score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
    /// Heuristic automated-review score; never feeds the verdict
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_score: Option<u8>,
    /// Overall match of the latest upload against the declared form
    #[serde(default)]
    pub data_match_score: f64,
    pub created_by: Actor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<Actor>,
    #[serde(default)]
    pub audit_trail: Vec<AuditEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped on every transition; used for compare-and-set saves
    pub version: u64,
}

impl Case {
    pub fn is_valid(&self) -> Option<bool> {
        self.validation.as_ref().map(|v| v.is_valid)
    }

    /// Mean extraction confidence over uploaded documents, 0 when none
    pub fn mean_confidence(&self) -> f64 {
        if self.documents.is_empty() {
            return 0.0;
        }
        self.documents.values().map(|d| d.confidence).sum::<f64>() / self.documents.len() as f64
    }

    pub fn last_audit(&self) -> Option<&AuditEntry> {
        self.audit_trail.last()
    }
}

/// Allocate a fresh case id: `CASE-` and 8 uppercase hex characters
pub fn new_case_id() -> String {
    format!(
        "{}{}",
        CASE_ID_PREFIX,
        uuid::Uuid::new_v4().simple().to_string()[..CASE_ID_SUFFIX_LEN].to_uppercase()
    )
}

/// Reject malformed case ids before any store lookup
pub fn validate_case_id(id: &str) -> Result<(), WorkflowError> {
    let suffix = id.strip_prefix(CASE_ID_PREFIX).unwrap_or_default();
    let well_formed = id.starts_with(CASE_ID_PREFIX)
        && suffix.len() == CASE_ID_SUFFIX_LEN
        && suffix
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, 'A'..='F'));

    if well_formed {
        Ok(())
    } else {
        Err(WorkflowError::InvalidInput(format!("Malformed case id: {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_case_id_is_well_formed() {
        for _ in 0..20 {
            let id = new_case_id();
            assert_eq!(id.len(), 13);
            assert!(validate_case_id(&id).is_ok(), "{}", id);
        }
    }

    #[test]
    fn test_malformed_case_ids() {
        assert!(validate_case_id("CASE-1234ABCD").is_ok());
        assert!(validate_case_id("CASE-1234abcd").is_err());
        assert!(validate_case_id("CASE-1234ABC").is_err());
        assert!(validate_case_id("CASE-1234ABCG").is_err());
        assert!(validate_case_id("APPR-1234ABCD").is_err());
        assert!(validate_case_id("").is_err());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            CaseStatus::Draft,
            CaseStatus::Submitted,
            CaseStatus::AiReviewed,
            CaseStatus::CheckerApproved,
            CaseStatus::CheckerRejected,
        ] {
            assert_eq!(status.as_str().parse::<CaseStatus>().unwrap(), status);
            assert_eq!(
                serde_json::to_string(&status).unwrap(),
                format!("\"{}\"", status.as_str())
            );
        }
        assert!("ai_reviewed".parse::<CaseStatus>().is_ok());
        assert!("ARCHIVED".parse::<CaseStatus>().is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(CaseStatus::CheckerApproved.is_terminal());
        assert!(CaseStatus::CheckerRejected.is_terminal());
        assert!(!CaseStatus::AiReviewed.is_terminal());
        assert!(CaseStatus::AiReviewed.awaits_decision());
        assert!(!CaseStatus::Draft.awaits_decision());
    }

    #[test]
    fn test_audit_entry_records_actor() {
        let actor = Actor::checker("chk-1", "Carol");
        let entry = AuditEntry::new(AuditAction::CheckerApproved, &actor, "ok", Utc::now());
        assert_eq!(entry.actor_name, "Carol");
        assert_eq!(entry.actor_role, UserRole::Checker);
        assert_eq!(entry.action.to_string(), "CHECKER_APPROVED");
    }
}
