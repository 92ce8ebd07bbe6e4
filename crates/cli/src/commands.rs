//! CLI commands

use kycflow_core::{Actor, DeclaredProfile};
use kycflow_scoring::ScoreCategory;
use kycflow_workflow::{AuditEntry, Case, CaseStatus, ServiceConfig, ValidationView};
use std::path::Path;

use crate::context::AppContext;

fn describe(case: &Case) -> String {
    let risk = match (case.risk_score, case.risk_level) {
        (Some(score), Some(level)) => format!("risk {}/100 {}", score, level),
        _ => "not scored".to_string(),
    };
    format!("{} [{}] {} - {}", case.id, case.status, case.profile.name, risk)
}

/// Open a new DRAFT case
pub async fn create(ctx: &AppContext, actor: &Actor, profile: DeclaredProfile) -> Result<Case, anyhow::Error> {
    let case = ctx.service.create_case(actor, profile).await?;
    println!("✅ Created case {}", case.id);
    Ok(case)
}

/// Upload a document file (the OCR collaborator's JSON output)
pub async fn upload(
    ctx: &AppContext,
    actor: &Actor,
    case_id: &str,
    document_type: &str,
    file: &Path,
) -> Result<Case, anyhow::Error> {
    let bytes = std::fs::read(file)?;
    let filename = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow::anyhow!("Not a file: {}", file.display()))?;
    let case = ctx
        .service
        .upload_document(case_id, actor, document_type, &filename, &bytes)
        .await?;

    if let Some(entry) = case.audit_trail.last() {
        println!("✅ {}", entry.comment);
    }
    Ok(case)
}

/// Submit a case; the automated review runs straight after
pub async fn submit(
    ctx: &AppContext,
    actor: &Actor,
    case_id: &str,
    comment: Option<&str>,
) -> Result<Case, anyhow::Error> {
    let case = ctx.service.submit(case_id, actor, comment).await?;
    println!("✅ Submitted {}", describe(&case));
    if let Some(score) = case.ai_score {
        println!("   AI verification score: {}/100", score);
    }
    Ok(case)
}

pub async fn approve(
    ctx: &AppContext,
    actor: &Actor,
    case_id: &str,
    comment: Option<&str>,
) -> Result<Case, anyhow::Error> {
    let case = ctx.service.approve(case_id, actor, comment).await?;
    println!("✅ Approved {}", describe(&case));
    Ok(case)
}

pub async fn reject(
    ctx: &AppContext,
    actor: &Actor,
    case_id: &str,
    comment: Option<&str>,
) -> Result<Case, anyhow::Error> {
    let case = ctx.service.reject(case_id, actor, comment).await?;
    println!("⛔ Rejected {}", describe(&case));
    Ok(case)
}

/// Print the full case as JSON
pub async fn show(ctx: &AppContext, actor: &Actor, case_id: &str) -> Result<Case, anyhow::Error> {
    let case = ctx.service.get_case(case_id, actor).await?;
    println!("{}", serde_json::to_string_pretty(&case)?);
    Ok(case)
}

pub async fn list(
    ctx: &AppContext,
    actor: &Actor,
    status: Option<&str>,
) -> Result<Vec<Case>, anyhow::Error> {
    let status = status.map(str::parse::<CaseStatus>).transpose()?;
    let cases = ctx.service.list_cases(actor, status).await?;

    if cases.is_empty() {
        println!("No cases found");
    }
    for case in &cases {
        println!("{}  (created {})", describe(case), case.created_at.format("%Y-%m-%d %H:%M"));
    }
    Ok(cases)
}

/// Print the rendered validation report
pub async fn validation(ctx: &AppContext, actor: &Actor, case_id: &str) -> Result<ValidationView, anyhow::Error> {
    let view = ctx.service.get_validation(case_id, actor).await?;
    println!("{}", view.report_text);
    if let Some(score) = view.ai_score {
        println!("AI verification score: {}/100 (advisory)", score);
    }
    Ok(view)
}

pub async fn audit(ctx: &AppContext, actor: &Actor, case_id: &str) -> Result<Vec<AuditEntry>, anyhow::Error> {
    let trail = ctx.service.get_audit_trail(case_id, actor).await?;
    for (i, entry) in trail.iter().enumerate() {
        println!(
            "{:>3}. {} {:<16} {} ({}) - {}",
            i + 1,
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.action.as_str(),
            entry.actor_name,
            entry.actor_role,
            entry.comment
        );
    }
    Ok(trail)
}

/// Print the effective configuration after validation
pub fn check_config(config: &ServiceConfig) -> Result<(), anyhow::Error> {
    config.scoring.validate()?;

    println!("✅ Configuration valid");
    println!("Risk weights (sum {}):", config.scoring.weights.sum());
    for category in ScoreCategory::ALL {
        println!("  {:<18} {}", category.label(), config.scoring.weights.get(category));
    }
    println!("Reject failed-quality uploads: {}", config.reject_failed_quality);
    println!("Uploads after decision: {}", config.allow_upload_after_decision);
    println!("List limit: {}", config.list_limit);
    Ok(())
}
