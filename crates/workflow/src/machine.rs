//! Case lifecycle state machine
//!
//! ```text
//! DRAFT --submit--> SUBMITTED --ai review--> AI_REVIEWED
//!                      |                         |
//!                      +----approve / reject-----+--> CHECKER_APPROVED | CHECKER_REJECTED
//! ```
//!
//! Every function is pure: it checks role, identity and status (in that
//! order), then returns an updated copy carrying exactly one new audit
//! entry and a bumped version. The input case is never touched.

use chrono::{DateTime, Utc};
use kycflow_core::{Actor, DeclaredProfile, ExtractionRecord, UserRole};
use kycflow_scoring::ValidationReport;
use std::collections::BTreeMap;

use crate::case::{AuditAction, AuditEntry, Case, CaseStatus};
use crate::error::{WorkflowError, WorkflowResult};

/// A checker's decision on a submitted case
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    fn target(&self) -> CaseStatus {
        match self {
            Decision::Approve => CaseStatus::CheckerApproved,
            Decision::Reject => CaseStatus::CheckerRejected,
        }
    }

    fn action(&self) -> AuditAction {
        match self {
            Decision::Approve => AuditAction::CheckerApproved,
            Decision::Reject => AuditAction::CheckerRejected,
        }
    }

    fn default_comment(&self) -> &'static str {
        match self {
            Decision::Approve => "Case approved",
            Decision::Reject => "Case rejected",
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Reject => "reject",
        }
    }
}

/// A scored upload ready to be recorded on a case
pub struct ScoredUpload {
    pub filename: String,
    pub record: ExtractionRecord,
    pub report: ValidationReport,
}

pub struct CaseStateMachine;

impl CaseStateMachine {
    /// Open a new DRAFT case; only makers create cases
    pub fn create(
        id: String,
        profile: DeclaredProfile,
        creator: &Actor,
        now: DateTime<Utc>,
    ) -> WorkflowResult<Case> {
        require_role(creator, UserRole::Maker, "create cases")?;

        Ok(Case {
            id,
            status: CaseStatus::Draft,
            profile,
            documents: BTreeMap::new(),
            filenames: BTreeMap::new(),
            validation: None,
            risk_score: None,
            risk_level: None,
            ai_score: None,
            data_match_score: 0.0,
            created_by: creator.clone(),
            reviewed_by: None,
            audit_trail: vec![AuditEntry::new(AuditAction::Created, creator, "Case created", now)],
            created_at: now,
            updated_at: now,
            version: 1,
        })
    }

    /// DRAFT -> SUBMITTED, by the case's own maker
    pub fn submit(
        case: &Case,
        actor: &Actor,
        comment: Option<&str>,
        now: DateTime<Utc>,
    ) -> WorkflowResult<Case> {
        require_role(actor, UserRole::Maker, "submit cases")?;
        if !actor.is_same_identity(&case.created_by) {
            return Err(WorkflowError::PermissionDenied(
                "Can only submit your own cases".to_string(),
            ));
        }
        if case.status != CaseStatus::Draft {
            return Err(WorkflowError::InvalidState(format!(
                "Case is already {}",
                case.status
            )));
        }

        let comment = comment_or(comment, "Case submitted for review");
        Ok(advance(case, CaseStatus::Submitted, AuditAction::Submitted, actor, comment, now))
    }

    /// SUBMITTED -> AI_REVIEWED, recording the fresh report and AI score
    pub fn record_ai_review(
        case: &Case,
        report: ValidationReport,
        ai_score: u8,
        now: DateTime<Utc>,
    ) -> WorkflowResult<Case> {
        if case.status != CaseStatus::Submitted {
            return Err(WorkflowError::InvalidState(format!(
                "Automated review requires SUBMITTED, case is {}",
                case.status
            )));
        }

        let comment = format!("AI verification score: {}/100", ai_score);
        let mut next = advance(
            case,
            CaseStatus::AiReviewed,
            AuditAction::AiReviewed,
            &Actor::system(),
            comment,
            now,
        );
        apply_report(&mut next, report);
        next.ai_score = Some(ai_score);
        Ok(next)
    }

    /// SUBMITTED | AI_REVIEWED -> CHECKER_APPROVED | CHECKER_REJECTED
    pub fn decide(
        case: &Case,
        reviewer: &Actor,
        decision: Decision,
        comment: Option<&str>,
        now: DateTime<Utc>,
    ) -> WorkflowResult<Case> {
        require_role(reviewer, UserRole::Checker, &format!("{} cases", decision.verb()))?;
        if reviewer.is_same_identity(&case.created_by) {
            return Err(WorkflowError::PermissionDenied(format!(
                "Cannot {} your own case",
                decision.verb()
            )));
        }
        if !case.status.awaits_decision() {
            return Err(WorkflowError::InvalidState(format!(
                "Cannot {} case in {} status",
                decision.verb(),
                case.status
            )));
        }

        let comment = comment_or(comment, decision.default_comment());
        let mut next = advance(case, decision.target(), decision.action(), reviewer, comment, now);
        next.reviewed_by = Some(reviewer.clone());
        Ok(next)
    }

    /// Check that `actor` may upload to `case` before any extraction runs
    pub fn check_upload(case: &Case, actor: &Actor, allow_after_decision: bool) -> WorkflowResult<()> {
        if !actor.is_same_identity(&case.created_by) {
            return Err(WorkflowError::PermissionDenied(
                "Only the case creator can upload documents".to_string(),
            ));
        }
        if case.status.is_terminal() && !allow_after_decision {
            return Err(WorkflowError::InvalidState(format!(
                "Cannot upload documents to a case in {} status",
                case.status
            )));
        }
        Ok(())
    }

    /// Record a scored upload; status is unchanged
    pub fn record_upload(
        case: &Case,
        actor: &Actor,
        upload: ScoredUpload,
        allow_after_decision: bool,
        now: DateTime<Utc>,
    ) -> WorkflowResult<Case> {
        Self::check_upload(case, actor, allow_after_decision)?;

        let ScoredUpload {
            filename,
            record,
            report,
        } = upload;
        let comment = format!(
            "{} processed - Confidence: {:.2}%, Risk: {}",
            record.document_type.code().to_uppercase(),
            record.confidence * 100.0,
            report.risk_level
        );

        let mut next = advance(case, case.status, AuditAction::OcrProcessed, actor, comment, now);
        next.data_match_score = record
            .form_validation
            .as_ref()
            .map_or(0.0, |v| v.overall_match_score);
        next.filenames.insert(record.document_type, filename);
        next.documents.insert(record.document_type, record);
        apply_report(&mut next, report);
        Ok(next)
    }
}

fn require_role(actor: &Actor, role: UserRole, what: &str) -> WorkflowResult<()> {
    if actor.role == role {
        Ok(())
    } else {
        Err(WorkflowError::PermissionDenied(format!(
            "Only {} users can {}",
            role, what
        )))
    }
}

fn comment_or(comment: Option<&str>, default: &str) -> String {
    comment
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(default)
        .to_string()
}

fn advance(
    case: &Case,
    status: CaseStatus,
    action: AuditAction,
    actor: &Actor,
    comment: String,
    now: DateTime<Utc>,
) -> Case {
    let mut next = case.clone();
    next.status = status;
    next.audit_trail.push(AuditEntry::new(action, actor, comment, now));
    next.updated_at = now;
    next.version += 1;
    next
}

fn apply_report(case: &mut Case, report: ValidationReport) {
    case.risk_score = Some(report.risk_score);
    case.risk_level = Some(report.risk_level);
    case.validation = Some(report);
}
