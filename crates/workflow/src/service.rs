//! Case service: the operations exposed to the API layer
//!
//! Every operation on one case runs under that case's lock, reads the
//! stored case, builds an updated copy through the state machine and
//! persists it with a single compare-and-set write. Nothing is written
//! when a step fails.

use chrono::Utc;
use kycflow_core::{Actor, DeclaredProfile, DocumentType, UserRole};
use kycflow_scoring::{cross_validate, RiskLevel, ValidationReport, ValidationRiskScorer};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;
use tracing::{error, info, warn};

use crate::case::{new_case_id, validate_case_id, AuditEntry, Case, CaseStatus};
use crate::config::ServiceConfig;
use crate::error::{WorkflowError, WorkflowResult};
use crate::extractor::DocumentExtractor;
use crate::machine::{CaseStateMachine, Decision, ScoredUpload};
use crate::review::AiReviewer;
use crate::store::{CaseFilter, CaseStore};

pub const NO_VALIDATION: &str = "No validation data available";

/// Current validation state of a case
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationView {
    pub case_id: String,
    pub status: CaseStatus,
    pub validation: Option<ValidationReport>,
    pub risk_score: Option<u8>,
    pub risk_level: Option<RiskLevel>,
    pub is_valid: Option<bool>,
    pub ai_score: Option<u8>,
    pub report_text: String,
}

type LockMap = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

/// Held for the duration of one operation on a case
///
/// The map entry is removed when the last holder or waiter lets go.
struct CaseGuard<'a> {
    locks: &'a LockMap,
    case_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for CaseGuard<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        self.guard.take();
        if locks
            .get(&self.case_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.case_id);
        }
    }
}

pub struct CaseService {
    store: Arc<dyn CaseStore>,
    extractor: Arc<dyn DocumentExtractor>,
    scorer: ValidationRiskScorer,
    reviewer: AiReviewer,
    config: ServiceConfig,
    locks: LockMap,
}

impl CaseService {
    /// Fails with `Configuration` if the scoring config is invalid
    pub fn new(
        store: Arc<dyn CaseStore>,
        extractor: Arc<dyn DocumentExtractor>,
        config: ServiceConfig,
    ) -> WorkflowResult<Self> {
        let scorer = ValidationRiskScorer::new(config.scoring.clone())?;
        Ok(Self {
            store,
            extractor,
            scorer,
            reviewer: AiReviewer::new(config.ai_seed),
            config,
            locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Wait for exclusive access to one case
    async fn lock_case(&self, case_id: &str) -> CaseGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(case_id.to_string()).or_default().clone()
        };
        CaseGuard {
            locks: &self.locks,
            case_id: case_id.to_string(),
            guard: Some(lock.lock_owned().await),
        }
    }

    fn load(&self, case_id: &str) -> WorkflowResult<Case> {
        validate_case_id(case_id)?;
        self.store
            .get(case_id)
            .map_err(|e| {
                error!(case_id = %case_id, error = %e, "Failed to load case");
                WorkflowError::from(e)
            })?
            .ok_or_else(|| WorkflowError::NotFound(case_id.to_string()))
    }

    fn save(&self, case: &Case, expected_version: u64) -> WorkflowResult<()> {
        self.store.update(case, expected_version).map_err(|e| {
            error!(case_id = %case.id, error = %e, "Failed to save case");
            WorkflowError::from(e)
        })
    }

    fn score(&self, case: &Case) -> ValidationReport {
        self.scorer
            .score(&case.profile, &case.documents, Utc::now().date_naive())
    }

    /// Makers see only the cases they created
    fn ensure_visible(case: &Case, actor: &Actor) -> WorkflowResult<()> {
        if actor.role == UserRole::Maker && !actor.is_same_identity(&case.created_by) {
            return Err(WorkflowError::PermissionDenied(
                "Can only view your own cases".to_string(),
            ));
        }
        Ok(())
    }

    /// Open a new DRAFT case for the acting maker
    pub async fn create_case(&self, actor: &Actor, profile: DeclaredProfile) -> WorkflowResult<Case> {
        let case = CaseStateMachine::create(new_case_id(), profile, actor, Utc::now())
            .inspect_err(|e| warn!(actor = %actor, error = %e, "Case creation rejected"))?;

        self.store.insert(&case).map_err(|e| {
            error!(case_id = %case.id, error = %e, "Failed to store new case");
            WorkflowError::from(e)
        })?;

        info!(case_id = %case.id, created_by = %actor.id, "Case created");
        Ok(case)
    }

    /// Extract, cross-check and score one document, then record it on the case
    pub async fn upload_document(
        &self,
        case_id: &str,
        actor: &Actor,
        document_type: &str,
        filename: &str,
        document: &[u8],
    ) -> WorkflowResult<Case> {
        let document_type: DocumentType = document_type.parse()?;
        if document.is_empty() {
            return Err(WorkflowError::InvalidInput("Document is empty".to_string()));
        }
        let filename = filename.trim();
        if filename.is_empty() {
            return Err(WorkflowError::InvalidInput("Filename is empty".to_string()));
        }

        validate_case_id(case_id)?;
        let _guard = self.lock_case(case_id).await;

        let case = self.load(case_id)?;
        CaseStateMachine::check_upload(&case, actor, self.config.allow_upload_after_decision)
            .inspect_err(|e| warn!(case_id = %case_id, actor = %actor, error = %e, "Upload rejected"))?;

        let mut record = self
            .extractor
            .extract(document, document_type)
            .await
            .inspect_err(|e| {
                error!(
                    case_id = %case_id,
                    extractor = self.extractor.name(),
                    error = %e,
                    "Extraction failed"
                )
            })?;
        record.document_type = document_type;

        if self.config.reject_failed_quality && record.quality_failed() {
            let reason = record
                .quality_check
                .as_ref()
                .and_then(|q| q.reason.clone())
                .unwrap_or_else(|| "Unknown".to_string());
            warn!(case_id = %case_id, document_type = %document_type, reason = %reason, "Document failed quality check");
            return Err(WorkflowError::InvalidInput(format!(
                "Document quality check failed: {}",
                reason
            )));
        }

        if record.form_validation.is_none() {
            record.form_validation = Some(cross_validate(
                &case.profile,
                &record,
                self.scorer.config().thresholds.field_match_similarity,
            ));
        }

        let mut rescored = case.clone();
        rescored.documents.insert(document_type, record.clone());
        let report = self.score(&rescored);

        let updated = CaseStateMachine::record_upload(
            &case,
            actor,
            ScoredUpload {
                filename: filename.to_string(),
                record,
                report,
            },
            self.config.allow_upload_after_decision,
            Utc::now(),
        )?;
        self.save(&updated, case.version)?;

        info!(
            case_id = %case_id,
            document_type = %document_type,
            filename = %filename,
            risk_score = ?updated.risk_score,
            "Document processed"
        );
        Ok(updated)
    }

    /// Submit a DRAFT case, then run the automated review
    pub async fn submit(&self, case_id: &str, actor: &Actor, comment: Option<&str>) -> WorkflowResult<Case> {
        validate_case_id(case_id)?;
        let _guard = self.lock_case(case_id).await;

        let case = self.load(case_id)?;
        let submitted = CaseStateMachine::submit(&case, actor, comment, Utc::now())
            .inspect_err(|e| warn!(case_id = %case_id, actor = %actor, error = %e, "Submit rejected"))?;

        let report = self.score(&submitted);
        let ai_score = self
            .reviewer
            .review(submitted.data_match_score, submitted.mean_confidence());
        let reviewed = CaseStateMachine::record_ai_review(&submitted, report, ai_score, Utc::now())?;

        self.save(&reviewed, case.version)?;

        info!(
            case_id = %case_id,
            ai_score,
            risk_score = ?reviewed.risk_score,
            "Case submitted and reviewed"
        );
        Ok(reviewed)
    }

    pub async fn approve(&self, case_id: &str, actor: &Actor, comment: Option<&str>) -> WorkflowResult<Case> {
        self.decide(case_id, actor, Decision::Approve, comment).await
    }

    pub async fn reject(&self, case_id: &str, actor: &Actor, comment: Option<&str>) -> WorkflowResult<Case> {
        self.decide(case_id, actor, Decision::Reject, comment).await
    }

    async fn decide(
        &self,
        case_id: &str,
        actor: &Actor,
        decision: Decision,
        comment: Option<&str>,
    ) -> WorkflowResult<Case> {
        validate_case_id(case_id)?;
        let _guard = self.lock_case(case_id).await;

        let case = self.load(case_id)?;
        let decided = CaseStateMachine::decide(&case, actor, decision, comment, Utc::now()).inspect_err(|e| {
            warn!(case_id = %case_id, actor = %actor, decision = ?decision, error = %e, "Decision rejected")
        })?;

        self.save(&decided, case.version)?;

        info!(case_id = %case_id, reviewer = %actor.id, status = %decided.status, "Case decided");
        Ok(decided)
    }

    pub async fn get_case(&self, case_id: &str, actor: &Actor) -> WorkflowResult<Case> {
        let case = self.load(case_id)?;
        Self::ensure_visible(&case, actor)?;
        Ok(case)
    }

    /// Newest first, capped at `list_limit`; makers only see their own cases
    pub async fn list_cases(&self, actor: &Actor, status: Option<CaseStatus>) -> WorkflowResult<Vec<Case>> {
        let filter = CaseFilter {
            created_by: (actor.role == UserRole::Maker).then(|| actor.id.clone()),
            status,
            limit: Some(self.config.list_limit),
        };
        Ok(self.store.list(&filter)?)
    }

    pub async fn get_validation(&self, case_id: &str, actor: &Actor) -> WorkflowResult<ValidationView> {
        let case = self.get_case(case_id, actor).await?;
        let report_text = case
            .validation
            .as_ref()
            .map_or_else(|| NO_VALIDATION.to_string(), ValidationReport::render);

        Ok(ValidationView {
            case_id: case.id.clone(),
            status: case.status,
            is_valid: case.is_valid(),
            risk_score: case.risk_score,
            risk_level: case.risk_level,
            ai_score: case.ai_score,
            validation: case.validation,
            report_text,
        })
    }

    pub async fn get_audit_trail(&self, case_id: &str, actor: &Actor) -> WorkflowResult<Vec<AuditEntry>> {
        Ok(self.get_case(case_id, actor).await?.audit_trail)
    }
}
