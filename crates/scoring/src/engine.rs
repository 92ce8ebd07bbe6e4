//! Validation & risk scoring orchestrator
//!
//! Runs every sub-validator over the same inputs, derives anomalies,
//! aggregates the weighted risk score and applies the validity rules.
//! Sub-results are composed, never mutated across steps.

use chrono::NaiveDate;
use kycflow_core::{DeclaredProfile, DocumentType, ExtractionRecord};
use std::collections::BTreeMap;
use tracing::debug;

use crate::anomaly::{AnomalyDetector, AnomalyType, DetectorInput};
use crate::completeness::check_completeness;
use crate::config::ScoringConfig;
use crate::consistency::check_consistency;
use crate::error::ScoringResult;
use crate::format::validate_formats;
use crate::matching::compare_fields;
use crate::quality::assess_quality;
use crate::recommend::{RecommendationGenerator, RecommendationInput};
use crate::report::{ValidationReport, Validations, VerdictRule};
use crate::risk::{aggregate, anomaly_sub_score, RiskLevel, ScoreCategory};
use crate::similarity::FieldComparator;

/// Deterministic scorer over an injected, validated configuration
#[derive(Debug, Clone)]
pub struct ValidationRiskScorer {
    config: ScoringConfig,
}

impl ValidationRiskScorer {
    /// Fails if the weight table or thresholds are misconfigured
    pub fn new(config: ScoringConfig) -> ScoringResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score a declared profile against the extracted documents
    ///
    /// Pure: ages are computed against `as_of`, so identical inputs always
    /// give an identical report.
    pub fn score(
        &self,
        profile: &DeclaredProfile,
        records: &BTreeMap<DocumentType, ExtractionRecord>,
        as_of: NaiveDate,
    ) -> ValidationReport {
        let thresholds = &self.config.thresholds;
        let records: Vec<&ExtractionRecord> = records.values().collect();

        let data_match = compare_fields(
            profile,
            &records,
            &FieldComparator::new(thresholds.field_match_similarity),
        );
        let quality = assess_quality(&records, thresholds.min_ocr_confidence);
        let completeness = check_completeness(profile, &records);
        let consistency = check_consistency(profile, &records, thresholds, as_of);
        let format = validate_formats(profile, &records);

        let anomalies = AnomalyDetector::new(thresholds.high_severity_mismatch).detect(&DetectorInput {
            profile,
            data_match: &data_match,
            quality: &quality,
            completeness: &completeness,
            consistency: &consistency,
            format: &format,
        });

        let breakdown: BTreeMap<ScoreCategory, u8> = [
            (ScoreCategory::DataMatch, data_match.score),
            (ScoreCategory::DocumentQuality, quality.score),
            (ScoreCategory::Completeness, completeness.score),
            (ScoreCategory::Consistency, consistency.score),
            (ScoreCategory::FormatValidation, format.score),
            (
                ScoreCategory::AnomalyCount,
                anomaly_sub_score(anomalies.iter().map(|a| a.severity)),
            ),
        ]
        .into_iter()
        .collect();

        let risk_score = aggregate(&breakdown, &self.config.weights);
        let risk_level = RiskLevel::from_score(risk_score);

        debug!(
            data_match = data_match.score,
            document_quality = quality.score,
            completeness = completeness.score,
            consistency = consistency.score,
            format_validation = format.score,
            anomalies = anomalies.len(),
            risk_score,
            risk_level = %risk_level,
            "Scored case"
        );

        let high_severity = anomalies.iter().filter(|a| a.is_high()).count();
        let age_flagged = anomalies
            .iter()
            .any(|a| a.anomaly_type == AnomalyType::AgeInconsistency);

        let mut verdict_failures = Vec::new();
        if high_severity > thresholds.max_high_severity_anomalies {
            verdict_failures.push(VerdictRule::TooManyHighSeverityAnomalies {
                count: high_severity,
                max: thresholds.max_high_severity_anomalies,
            });
        }
        if risk_level.is_elevated() {
            verdict_failures.push(VerdictRule::ElevatedRiskLevel { level: risk_level });
        }
        if risk_score > thresholds.max_risk_score {
            verdict_failures.push(VerdictRule::RiskScoreAboveMaximum {
                score: risk_score,
                max: thresholds.max_risk_score,
            });
        }
        if completeness.score < thresholds.min_completeness {
            verdict_failures.push(VerdictRule::IncompleteSubmission {
                completeness: completeness.score,
                min: thresholds.min_completeness,
            });
        }
        if age_flagged {
            verdict_failures.push(VerdictRule::AgeInconsistency);
        }

        let missing = completeness.missing();
        let recommendations = RecommendationGenerator::new(thresholds).generate(&RecommendationInput {
            risk_level,
            anomalies: &anomalies,
            data_match_score: data_match.score,
            document_quality_score: quality.score,
            missing: &missing,
        });

        ValidationReport {
            is_valid: verdict_failures.is_empty(),
            risk_score,
            risk_level,
            anomalies,
            validations: Validations {
                data_match,
                document_quality: quality,
                completeness,
                consistency,
                format_validation: format,
            },
            scores_breakdown: breakdown,
            recommendations,
            verdict_failures,
        }
    }
}
