//! Integration tests for the KycFlow CLI
//!
//! These drive the command handlers through an `AppContext` backed by a
//! temporary data directory, with extraction JSON files on disk.

use kycflow_cli::{commands, context, AppContext};
use kycflow_core::{DeclaredProfile, DocumentType, UserRole};
use kycflow_workflow::{AuditAction, CaseStatus};
use std::path::PathBuf;
use tempfile::TempDir;

fn profile() -> DeclaredProfile {
    DeclaredProfile::new("John Doe", "1990-06-15", "123 Main Street, City, State, 400001")
        .with_email("john.doe@mail.com")
        .with_phone("+91 98765 43210")
}

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

const TAX_ID_JSON: &str = r#"{
    "document_type": "tax_id",
    "raw_text": "INCOME TAX DEPARTMENT JOHN DOE ABCDE1234F",
    "fields": { "name": "JOHN DOE", "dob": "1990-06-15", "tax_id": "ABCDE1234F" },
    "confidence": 0.92,
    "quality_check": { "valid": true }
}"#;

const NATIONAL_ID_JSON: &str = r#"{
    "document_type": "national_id",
    "fields": {
        "name": "John Doe",
        "address": "123 Main Street, City, State, 400001",
        "national_id": "2345 6789 0123"
    },
    "confidence": 0.9,
    "quality_check": { "valid": true }
}"#;

/// Test: create → upload → submit → approve through the command handlers
#[tokio::test]
async fn test_cli_workflow() {
    let temp_dir = TempDir::new().unwrap();
    let data_path = temp_dir.path().join("data");
    let ctx = AppContext::new(&data_path, None).await.unwrap();
    assert!(ctx.db_path().exists());

    let maker = context::actor("mk-1", Some("Maya Maker"), "maker").unwrap();
    let checker = context::actor("chk-1", None, "CHECKER").unwrap();
    assert_eq!(checker.name, "chk-1");

    let case = commands::create(&ctx, &maker, profile()).await.unwrap();

    let tax = write_file(&temp_dir, "tax.json", TAX_ID_JSON);
    let national = write_file(&temp_dir, "national.json", NATIONAL_ID_JSON);
    commands::upload(&ctx, &maker, &case.id, "tax_id", &tax).await.unwrap();
    let uploaded = commands::upload(&ctx, &maker, &case.id, "national_id", &national)
        .await
        .unwrap();
    assert_eq!(uploaded.documents.len(), 2);
    assert_eq!(uploaded.filenames[&DocumentType::TaxId], "tax.json");
    assert_eq!(uploaded.filenames[&DocumentType::NationalId], "national.json");
    assert_eq!(uploaded.is_valid(), Some(true));

    let submitted = commands::submit(&ctx, &maker, &case.id, None).await.unwrap();
    assert_eq!(submitted.status, CaseStatus::AiReviewed);

    let listed = commands::list(&ctx, &checker, Some("ai_reviewed")).await.unwrap();
    assert_eq!(listed.len(), 1);

    let view = commands::validation(&ctx, &checker, &case.id).await.unwrap();
    assert!(view.report_text.contains("Status: PASSED"));

    let approved = commands::approve(&ctx, &checker, &case.id, Some("Verified"))
        .await
        .unwrap();
    assert_eq!(approved.status, CaseStatus::CheckerApproved);

    let trail = commands::audit(&ctx, &checker, &case.id).await.unwrap();
    assert_eq!(trail.len(), 6);
    assert_eq!(trail.last().map(|e| e.action), Some(AuditAction::CheckerApproved));
}

/// Test: cases survive reopening the data directory
#[tokio::test]
async fn test_context_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let maker = context::actor("mk-1", None, "MAKER").unwrap();

    let case_id = {
        let ctx = AppContext::new(temp_dir.path(), None).await.unwrap();
        commands::create(&ctx, &maker, profile()).await.unwrap().id
    };

    let ctx = AppContext::new(temp_dir.path(), None).await.unwrap();
    let shown = commands::show(&ctx, &maker, &case_id).await.unwrap();
    assert_eq!(shown.status, CaseStatus::Draft);
    assert_eq!(shown.created_by.role, UserRole::Maker);
}

/// Test: identity flags reject unknown roles and the system role
#[test]
fn test_actor_flags() {
    assert!(context::actor("u-1", None, "AUDITOR").is_err());
    assert!(context::actor("u-1", None, "SYSTEM").is_err());
    assert!(context::actor("  ", None, "MAKER").is_err());
}

/// Test: a config file with bad weights refuses to start
#[tokio::test]
async fn test_bad_config_refuses_to_start() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_file(
        &temp_dir,
        "kycflow.json",
        r#"{ "scoring": { "weights": { "data_match": "0.9" } } }"#,
    );

    assert!(context::load_config(Some(&config)).is_err());
    assert!(AppContext::new(temp_dir.path().join("data"), Some(&config)).await.is_err());

    let good = write_file(&temp_dir, "ok.json", r#"{ "ai_seed": 7 }"#);
    let loaded = context::load_config(Some(&good)).unwrap();
    assert_eq!(loaded.ai_seed, Some(7));
    commands::check_config(&loaded).unwrap();
}

/// Test: unknown status filters and unreadable files surface as errors
#[tokio::test]
async fn test_command_errors() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = AppContext::new(temp_dir.path(), None).await.unwrap();
    let maker = context::actor("mk-1", None, "MAKER").unwrap();
    let case = commands::create(&ctx, &maker, profile()).await.unwrap();

    assert!(commands::list(&ctx, &maker, Some("PENDING")).await.is_err());

    let missing = temp_dir.path().join("missing.json");
    assert!(commands::upload(&ctx, &maker, &case.id, "tax_id", &missing).await.is_err());

    let checker = context::actor("chk-1", None, "CHECKER").unwrap();
    assert!(commands::approve(&ctx, &checker, &case.id, None).await.is_err());
}
