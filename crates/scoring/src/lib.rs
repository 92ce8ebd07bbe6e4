//! KycFlow Scoring - Document validation & risk scoring engine
//!
//! Turns the applicant's declared form plus extracted document fields into a
//! deterministic, auditable `ValidationReport`:
//! - five sub-validators (field match, document quality, completeness,
//!   consistency, format), each scoring 0-100
//! - typed, severity-tagged anomalies
//! - a weighted risk score (higher = riskier) and risk level
//! - a validity verdict listing every failed rule
//! - recommendations and a plain-text rendering

pub mod anomaly;
pub mod completeness;
pub mod config;
pub mod consistency;
pub mod engine;
pub mod error;
pub mod format;
pub mod matching;
pub mod quality;
pub mod recommend;
pub mod report;
pub mod risk;
pub mod similarity;

pub use anomaly::{Anomaly, AnomalyDetector, AnomalyType};
pub use config::{RiskWeights, ScoringConfig, ScoringThresholds};
pub use engine::ValidationRiskScorer;
pub use error::{ScoringError, ScoringResult};
pub use matching::cross_validate;
pub use report::{ValidationReport, Validations, VerdictRule};
pub use risk::{RiskLevel, ScoreCategory, Severity};
pub use similarity::{similarity, FieldComparator};
