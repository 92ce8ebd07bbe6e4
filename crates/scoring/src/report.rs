//! Validation report, verdict rules and plain-text rendering

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

use crate::anomaly::Anomaly;
use crate::completeness::CompletenessResult;
use crate::consistency::ConsistencyResult;
use crate::error::{ScoringError, ScoringResult};
use crate::format::FormatResult;
use crate::matching::FieldMatchResult;
use crate::quality::QualityResult;
use crate::risk::{RiskLevel, ScoreCategory};

const RULE: usize = 60;

/// Every sub-validator result, kept for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validations {
    pub data_match: FieldMatchResult,
    pub document_quality: QualityResult,
    pub completeness: CompletenessResult,
    pub consistency: ConsistencyResult,
    pub format_validation: FormatResult,
}

/// A validity rule the case failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum VerdictRule {
    TooManyHighSeverityAnomalies { count: usize, max: usize },
    ElevatedRiskLevel { level: RiskLevel },
    RiskScoreAboveMaximum { score: u8, max: u8 },
    IncompleteSubmission { completeness: u8, min: u8 },
    AgeInconsistency,
}

impl fmt::Display for VerdictRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerdictRule::TooManyHighSeverityAnomalies { count, max } => {
                write!(f, "{} high-severity anomalies (maximum {})", count, max)
            }
            VerdictRule::ElevatedRiskLevel { level } => write!(f, "risk level {}", level),
            VerdictRule::RiskScoreAboveMaximum { score, max } => {
                write!(f, "risk score {} above {}", score, max)
            }
            VerdictRule::IncompleteSubmission { completeness, min } => {
                write!(f, "completeness {} below {}", completeness, min)
            }
            VerdictRule::AgeInconsistency => write!(f, "applicant age outside permitted range"),
        }
    }
}

/// Outcome of one scoring run; replaced wholesale on re-scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub anomalies: Vec<Anomaly>,
    pub validations: Validations,
    pub scores_breakdown: BTreeMap<ScoreCategory, u8>,
    pub recommendations: Vec<String>,
    /// Failed validity rules; empty iff `is_valid`
    pub verdict_failures: Vec<VerdictRule>,
}

impl ValidationReport {
    pub fn high_severity_count(&self) -> usize {
        self.anomalies.iter().filter(|a| a.is_high()).count()
    }

    pub fn sub_score(&self, category: ScoreCategory) -> u8 {
        self.scores_breakdown.get(&category).copied().unwrap_or(0)
    }

    /// SHA-256 over the canonical JSON form
    pub fn fingerprint(&self) -> ScoringResult<String> {
        let bytes = serde_json::to_vec(self).map_err(|e| ScoringError::Serialization(e.to_string()))?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }

    /// Fixed-width plain-text report
    pub fn render(&self) -> String {
        let mut out = Vec::new();
        let heavy = "=".repeat(RULE);
        let light = "-".repeat(RULE);

        out.push(heavy.clone());
        out.push("KYC VALIDATION & RISK ASSESSMENT REPORT".to_string());
        out.push(heavy.clone());
        out.push(String::new());

        let status = if self.is_valid { "PASSED" } else { "FAILED" };
        out.push(format!("Overall Status: {}", status));
        out.push(format!("Risk Score: {}/100", self.risk_score));
        out.push(format!("Risk Level: {}", self.risk_level));
        for failure in &self.verdict_failures {
            out.push(format!("  Failed rule: {}", failure));
        }
        out.push(String::new());

        out.push("Scores Breakdown:".to_string());
        out.push(light.clone());
        for (category, score) in &self.scores_breakdown {
            out.push(format!("  {}: {}/100", category.label(), score));
        }
        out.push(String::new());

        out.push(format!("Anomalies Detected: {}", self.anomalies.len()));
        out.push(light.clone());
        if self.anomalies.is_empty() {
            out.push("  No anomalies detected".to_string());
            out.push(String::new());
        }
        for (i, anomaly) in self.anomalies.iter().enumerate() {
            out.push(format!(
                "{}. [{}] {}",
                i + 1,
                anomaly.severity.to_string().to_uppercase(),
                anomaly.anomaly_type
            ));
            out.push(format!("   Field: {}", anomaly.field));
            out.push(format!("   {}", anomaly.description));
            out.push(String::new());
        }

        out.push("Recommendations:".to_string());
        out.push(light);
        for (i, recommendation) in self.recommendations.iter().enumerate() {
            out.push(format!("{}. {}", i + 1, recommendation));
        }
        out.push(String::new());
        out.push(heavy);

        out.join("\n")
    }
}
