//! Integration tests for the case workflow
//!
//! These drive `CaseService` end to end: creation, uploads through an
//! extraction collaborator, submission with automated review, and the
//! checker decision, over both SQLite and in-memory stores.

use chrono::{Duration, Utc};
use kycflow_core::{fields, Actor, DeclaredProfile, DocumentType, ExtractionRecord, QualityCheck};
use kycflow_scoring::{AnomalyType, RiskLevel, Severity};
use kycflow_workflow::{
    AuditAction, CaseService, CaseStatus, JsonExtractor, MemoryCaseStore, ServiceConfig, SqliteCaseStore,
    StaticExtractor, WorkflowError,
};
use std::sync::Arc;
use tempfile::TempDir;

fn maker() -> Actor {
    Actor::maker("mk-1", "Maya Maker")
}

fn checker() -> Actor {
    Actor::checker("chk-1", "Carl Checker")
}

fn profile() -> DeclaredProfile {
    DeclaredProfile::new("John Doe", "1990-06-15", "123 Main Street, City, State, 400001")
        .with_email("john.doe@mail.com")
        .with_phone("+91 98765 43210")
}

fn scripted_extractor() -> StaticExtractor {
    let extractor = StaticExtractor::new();
    extractor.set_record(
        ExtractionRecord::new(DocumentType::TaxId, 0.92)
            .with_field(fields::NAME, "JOHN DOE")
            .with_field(fields::DOB, "1990-06-15")
            .with_field(fields::TAX_ID, "ABCDE1234F")
            .with_quality(QualityCheck::passed()),
    );
    extractor.set_record(
        ExtractionRecord::new(DocumentType::NationalId, 0.9)
            .with_field(fields::NAME, "John Doe")
            .with_field(fields::ADDRESS, "123 Main Street, City, State, 400001")
            .with_field(fields::NATIONAL_ID, "2345 6789 0123")
            .with_quality(QualityCheck::passed()),
    );
    extractor
}

fn memory_service() -> CaseService {
    CaseService::new(
        Arc::new(MemoryCaseStore::new()),
        Arc::new(scripted_extractor()),
        ServiceConfig::default().with_seed(42),
    )
    .unwrap()
}

/// Test: create → upload both IDs → submit → AI review → approve
#[tokio::test]
async fn test_full_lifecycle_on_sqlite() {
    let temp_dir = TempDir::new().unwrap();
    let store = SqliteCaseStore::new(temp_dir.path().join("cases.db")).unwrap();
    let service = CaseService::new(
        Arc::new(store),
        Arc::new(scripted_extractor()),
        ServiceConfig::default().with_seed(42),
    )
    .unwrap();

    let case = service.create_case(&maker(), profile()).await.unwrap();
    assert_eq!(case.status, CaseStatus::Draft);

    service
        .upload_document(&case.id, &maker(), "tax_id", "tax_id_front.jpg", b"scan-1")
        .await
        .unwrap();
    let uploaded = service
        .upload_document(&case.id, &maker(), "national_id", "national_id_front.jpg", b"scan-2")
        .await
        .unwrap();
    assert_eq!(uploaded.documents.len(), 2);
    assert_eq!(uploaded.filenames[&DocumentType::TaxId], "tax_id_front.jpg");
    assert_eq!(uploaded.filenames[&DocumentType::NationalId], "national_id_front.jpg");
    assert_eq!(uploaded.risk_level, Some(RiskLevel::VeryLow));
    assert_eq!(uploaded.is_valid(), Some(true));

    let reviewed = service.submit(&case.id, &maker(), None).await.unwrap();
    assert_eq!(reviewed.status, CaseStatus::AiReviewed);
    // full data match and confident extraction push the AI score up
    assert!(reviewed.ai_score.unwrap() >= 80);

    let approved = service
        .approve(&case.id, &checker(), Some("All documents verified"))
        .await
        .unwrap();
    assert_eq!(approved.status, CaseStatus::CheckerApproved);
    assert_eq!(approved.reviewed_by.as_ref().map(|a| a.id.as_str()), Some("chk-1"));

    let trail = service.get_audit_trail(&case.id, &checker()).await.unwrap();
    let actions: Vec<AuditAction> = trail.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![
            AuditAction::Created,
            AuditAction::OcrProcessed,
            AuditAction::OcrProcessed,
            AuditAction::Submitted,
            AuditAction::AiReviewed,
            AuditAction::CheckerApproved,
        ]
    );
    assert!(trail.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    assert!(trail[1].comment.starts_with("TAX_ID processed - Confidence: 92.00%"));
    assert_eq!(trail[5].comment, "All documents verified");

    // the decision survived in the database
    let reopened = SqliteCaseStore::new(temp_dir.path().join("cases.db")).unwrap();
    assert_eq!(reopened.count().unwrap(), 1);
}

/// Test: the creator can never decide on their own case
#[tokio::test]
async fn test_segregation_of_duties() {
    let service = memory_service();
    let case = service.create_case(&maker(), profile()).await.unwrap();
    service.submit(&case.id, &maker(), None).await.unwrap();

    let creator_as_checker = Actor::checker("mk-1", "Maya Maker");
    let approve = service.approve(&case.id, &creator_as_checker, None).await;
    let reject = service.reject(&case.id, &creator_as_checker, None).await;
    assert!(matches!(approve, Err(WorkflowError::PermissionDenied(_))));
    assert!(matches!(reject, Err(WorkflowError::PermissionDenied(_))));

    let maker_approves = service.approve(&case.id, &maker(), None).await;
    assert!(matches!(maker_approves, Err(WorkflowError::PermissionDenied(_))));

    let trail = service.get_audit_trail(&case.id, &maker()).await.unwrap();
    assert_eq!(trail.len(), 3);
}

/// Test: illegal transitions fail with InvalidState and change nothing
#[tokio::test]
async fn test_illegal_transitions() {
    let service = memory_service();
    let case = service.create_case(&maker(), profile()).await.unwrap();

    let early = service.approve(&case.id, &checker(), None).await;
    assert!(matches!(early, Err(WorkflowError::InvalidState(ref m)) if m.contains("DRAFT")));

    service.submit(&case.id, &maker(), None).await.unwrap();
    let twice = service.submit(&case.id, &maker(), None).await;
    assert!(matches!(twice, Err(WorkflowError::InvalidState(_))));

    service.reject(&case.id, &checker(), None).await.unwrap();
    let after = service.approve(&case.id, &checker(), None).await;
    assert!(matches!(after, Err(WorkflowError::InvalidState(ref m)) if m.contains("CHECKER_REJECTED")));

    let stored = service.get_case(&case.id, &checker()).await.unwrap();
    assert_eq!(stored.status, CaseStatus::CheckerRejected);
    assert_eq!(stored.audit_trail.len(), 4);
    assert_eq!(stored.audit_trail[3].comment, "Case rejected");
}

/// Test: uploads after a decision are refused unless configured otherwise
#[tokio::test]
async fn test_upload_after_decision() {
    let service = memory_service();
    let case = service.create_case(&maker(), profile()).await.unwrap();
    service.submit(&case.id, &maker(), None).await.unwrap();
    service.approve(&case.id, &checker(), None).await.unwrap();

    let late = service.upload_document(&case.id, &maker(), "tax_id", "scan.png", b"scan").await;
    assert!(matches!(late, Err(WorkflowError::InvalidState(_))));

    let mut config = ServiceConfig::default();
    config.allow_upload_after_decision = true;
    let store = Arc::new(MemoryCaseStore::new());
    let permissive = CaseService::new(store, Arc::new(scripted_extractor()), config).unwrap();
    let case = permissive.create_case(&maker(), profile()).await.unwrap();
    permissive.submit(&case.id, &maker(), None).await.unwrap();
    permissive.approve(&case.id, &checker(), None).await.unwrap();

    let updated = permissive
        .upload_document(&case.id, &maker(), "tax_id", "scan.png", b"scan")
        .await
        .unwrap();
    assert_eq!(updated.status, CaseStatus::CheckerApproved);
}

/// Test: makers only see and touch their own cases
#[tokio::test]
async fn test_maker_visibility() {
    let service = memory_service();
    let other = Actor::maker("mk-2", "Mo Maker");

    let mine = service.create_case(&maker(), profile()).await.unwrap();
    service.create_case(&other, profile()).await.unwrap();

    let peek = service.get_case(&mine.id, &other).await;
    assert!(matches!(peek, Err(WorkflowError::PermissionDenied(_))));

    let foreign_upload = service.upload_document(&mine.id, &other, "tax_id", "scan.png", b"scan").await;
    assert!(matches!(foreign_upload, Err(WorkflowError::PermissionDenied(_))));

    assert_eq!(service.list_cases(&maker(), None).await.unwrap().len(), 1);
    assert_eq!(service.list_cases(&checker(), None).await.unwrap().len(), 2);

    service.submit(&mine.id, &maker(), None).await.unwrap();
    let reviewed = service
        .list_cases(&checker(), Some(CaseStatus::AiReviewed))
        .await
        .unwrap();
    assert_eq!(reviewed.len(), 1);
    assert_eq!(reviewed[0].id, mine.id);
}

/// Test: listings are capped at the configured limit, newest first
#[tokio::test]
async fn test_list_is_capped() {
    let mut config = ServiceConfig::default();
    config.list_limit = 3;
    let service = CaseService::new(Arc::new(MemoryCaseStore::new()), Arc::new(scripted_extractor()), config).unwrap();

    let mut ids = Vec::new();
    for _ in 0..5 {
        ids.push(service.create_case(&maker(), profile()).await.unwrap().id);
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let listed = service.list_cases(&checker(), None).await.unwrap();
    let listed: Vec<_> = listed.iter().map(|c| c.id.clone()).collect();
    assert_eq!(listed, vec![ids[4].clone(), ids[3].clone(), ids[2].clone()]);
    assert_eq!(service.list_cases(&maker(), None).await.unwrap().len(), 3);
}

/// Test: concurrent uploads on one case are serialized, none lost
#[tokio::test]
async fn test_concurrent_uploads_are_serialized() {
    let service = Arc::new(memory_service());
    let case = service.create_case(&maker(), profile()).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let service = Arc::clone(&service);
        let id = case.id.clone();
        let document_type = if i % 2 == 0 { "tax_id" } else { "national_id" };
        handles.push(tokio::spawn(async move {
            service
                .upload_document(&id, &maker(), document_type, "scan.png", b"scan")
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = service.get_case(&case.id, &maker()).await.unwrap();
    assert_eq!(stored.audit_trail.len(), 9);
    assert_eq!(stored.version, 9);
    assert_eq!(stored.documents.len(), 2);
}

/// Test: an underage applicant is flagged and invalid, yet still decidable
#[tokio::test]
async fn test_underage_applicant() {
    let service = memory_service();
    let dob = (Utc::now().date_naive() - Duration::days(15 * 365)).format("%Y-%m-%d").to_string();
    let profile = DeclaredProfile::new("John Doe", dob, "123 Main Street, City, State, 400001");

    let case = service.create_case(&maker(), profile).await.unwrap();
    let reviewed = service.submit(&case.id, &maker(), None).await.unwrap();

    let report = reviewed.validation.as_ref().unwrap();
    assert!(!report.is_valid);
    assert!(report
        .anomalies
        .iter()
        .any(|a| a.anomaly_type == AnomalyType::AgeInconsistency && a.severity == Severity::High));

    // the verdict informs the checker but does not gate the decision
    let rejected = service.reject(&case.id, &checker(), Some("Applicant is a minor")).await.unwrap();
    assert_eq!(rejected.status, CaseStatus::CheckerRejected);
}

/// Test: documents supplied as OCR JSON output
#[tokio::test]
async fn test_json_extraction_payloads() {
    let service = CaseService::new(
        Arc::new(MemoryCaseStore::new()),
        Arc::new(JsonExtractor),
        ServiceConfig::default(),
    )
    .unwrap();
    let case = service.create_case(&maker(), profile()).await.unwrap();

    let payload = br#"{
        "raw_text": "GOVT OF INDIA JOHN DOE 2345 6789 0123",
        "fields": { "name": "JOHN DOE", "national_id": "2345 6789 0123" },
        "confidence": 0.81,
        "quality_check": { "valid": true }
    }"#;
    let updated = service
        .upload_document(&case.id, &maker(), "national_id", "national_id_ocr.json", payload)
        .await
        .unwrap();
    assert_eq!(
        updated.documents[&DocumentType::NationalId].field(fields::NATIONAL_ID),
        Some("2345 6789 0123")
    );

    let garbage = service
        .upload_document(&case.id, &maker(), "tax_id", "scan.png", b"not json")
        .await;
    assert!(matches!(garbage, Err(WorkflowError::ExtractionFailed(_))));

    let view = service.get_validation(&case.id, &maker()).await.unwrap();
    assert!(view.report_text.contains("Risk Score:"));
    assert_eq!(view.risk_score, updated.risk_score);
}
