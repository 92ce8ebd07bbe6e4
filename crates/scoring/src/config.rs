//! Scoring configuration: weight table and thresholds
//!
//! The configuration is an immutable value injected into the engine at
//! construction and validated once. A weight table that does not sum to 1.0
//! is a startup failure, never a per-request one.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ScoringError, ScoringResult};
use crate::risk::ScoreCategory;

/// Tolerance on the weight table sum
pub const WEIGHT_SUM_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 4);

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: RiskWeights,

    #[serde(default)]
    pub thresholds: ScoringThresholds,
}

/// Weight of each category in the risk score; must sum to 1.0
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskWeights {
    /// How well extracted fields match the declared form
    #[serde(default = "default_data_match_weight")]
    pub data_match: Decimal,

    /// Extraction confidence / upstream quality flags
    #[serde(default = "default_document_quality_weight")]
    pub document_quality: Decimal,

    /// Required fields and documents present
    #[serde(default = "default_completeness_weight")]
    pub completeness: Decimal,

    /// Internal consistency (age, names across documents, address)
    #[serde(default = "default_consistency_weight")]
    pub consistency: Decimal,

    /// Identifier format correctness
    #[serde(default = "default_format_validation_weight")]
    pub format_validation: Decimal,

    /// Severity-weighted anomaly load
    #[serde(default = "default_anomaly_count_weight")]
    pub anomaly_count: Decimal,
}

/// Thresholds used by the sub-validators and the verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringThresholds {
    /// Declared vs extracted similarity at or above which a field matches
    #[serde(default = "default_field_match_similarity")]
    pub field_match_similarity: f64,

    /// Mismatches below this similarity are high severity
    #[serde(default = "default_high_severity_mismatch")]
    pub high_severity_mismatch: f64,

    /// Minimum similarity between names extracted from different documents
    #[serde(default = "default_name_consistency_similarity")]
    pub name_consistency_similarity: f64,

    #[serde(default = "default_min_ocr_confidence")]
    pub min_ocr_confidence: f64,

    #[serde(default = "default_min_age")]
    pub min_age: u32,

    #[serde(default = "default_max_age")]
    pub max_age: u32,

    #[serde(default = "default_min_address_length")]
    pub min_address_length: usize,

    /// More high-severity anomalies than this invalidates the case
    #[serde(default = "default_max_high_severity_anomalies")]
    pub max_high_severity_anomalies: usize,

    /// Risk scores above this invalidate the case
    #[serde(default = "default_max_risk_score")]
    pub max_risk_score: u8,

    /// Completeness sub-scores below this invalidate the case
    #[serde(default = "default_min_completeness")]
    pub min_completeness: u8,

    /// Data-match sub-scores below this trigger a re-upload recommendation
    #[serde(default = "default_reupload_below")]
    pub reupload_below: u8,

    /// Document-quality sub-scores below this trigger a rescan recommendation
    #[serde(default = "default_rescan_below")]
    pub rescan_below: u8,
}

// Default value functions for serde
fn default_data_match_weight() -> Decimal {
    Decimal::new(25, 2)
}

fn default_document_quality_weight() -> Decimal {
    Decimal::new(15, 2)
}

fn default_completeness_weight() -> Decimal {
    Decimal::new(20, 2)
}

fn default_consistency_weight() -> Decimal {
    Decimal::new(20, 2)
}

fn default_format_validation_weight() -> Decimal {
    Decimal::new(10, 2)
}

fn default_anomaly_count_weight() -> Decimal {
    Decimal::new(10, 2)
}

fn default_field_match_similarity() -> f64 {
    0.8
}

fn default_high_severity_mismatch() -> f64 {
    0.5
}

fn default_name_consistency_similarity() -> f64 {
    0.7
}

fn default_min_ocr_confidence() -> f64 {
    0.70
}

fn default_min_age() -> u32 {
    18
}

fn default_max_age() -> u32 {
    100
}

fn default_min_address_length() -> usize {
    20
}

fn default_max_high_severity_anomalies() -> usize {
    3
}

fn default_max_risk_score() -> u8 {
    70
}

fn default_min_completeness() -> u8 {
    80
}

fn default_reupload_below() -> u8 {
    80
}

fn default_rescan_below() -> u8 {
    70
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            data_match: default_data_match_weight(),
            document_quality: default_document_quality_weight(),
            completeness: default_completeness_weight(),
            consistency: default_consistency_weight(),
            format_validation: default_format_validation_weight(),
            anomaly_count: default_anomaly_count_weight(),
        }
    }
}

impl Default for ScoringThresholds {
    fn default() -> Self {
        Self {
            field_match_similarity: default_field_match_similarity(),
            high_severity_mismatch: default_high_severity_mismatch(),
            name_consistency_similarity: default_name_consistency_similarity(),
            min_ocr_confidence: default_min_ocr_confidence(),
            min_age: default_min_age(),
            max_age: default_max_age(),
            min_address_length: default_min_address_length(),
            max_high_severity_anomalies: default_max_high_severity_anomalies(),
            max_risk_score: default_max_risk_score(),
            min_completeness: default_min_completeness(),
            reupload_below: default_reupload_below(),
            rescan_below: default_rescan_below(),
        }
    }
}

impl RiskWeights {
    /// Weight for a category
    pub fn get(&self, category: ScoreCategory) -> Decimal {
        match category {
            ScoreCategory::DataMatch => self.data_match,
            ScoreCategory::DocumentQuality => self.document_quality,
            ScoreCategory::Completeness => self.completeness,
            ScoreCategory::Consistency => self.consistency,
            ScoreCategory::FormatValidation => self.format_validation,
            ScoreCategory::AnomalyCount => self.anomaly_count,
        }
    }

    pub fn sum(&self) -> Decimal {
        ScoreCategory::ALL.iter().map(|c| self.get(*c)).sum()
    }

    pub fn validate(&self) -> ScoringResult<()> {
        for category in ScoreCategory::ALL {
            if self.get(category).is_sign_negative() {
                return Err(ScoringError::Configuration(format!(
                    "weight for {} is negative: {}",
                    category,
                    self.get(category)
                )));
            }
        }

        let sum = self.sum();
        if (sum - Decimal::ONE).abs() > WEIGHT_SUM_EPSILON {
            return Err(ScoringError::Configuration(format!(
                "risk weights must sum to 1.0, got {}",
                sum
            )));
        }
        Ok(())
    }
}

impl ScoringThresholds {
    pub fn validate(&self) -> ScoringResult<()> {
        let ratios = [
            ("field_match_similarity", self.field_match_similarity),
            ("high_severity_mismatch", self.high_severity_mismatch),
            ("name_consistency_similarity", self.name_consistency_similarity),
            ("min_ocr_confidence", self.min_ocr_confidence),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(ScoringError::Configuration(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.min_age > self.max_age {
            return Err(ScoringError::Configuration(format!(
                "min_age {} exceeds max_age {}",
                self.min_age, self.max_age
            )));
        }

        let percentages = [
            ("max_risk_score", self.max_risk_score),
            ("min_completeness", self.min_completeness),
            ("reupload_below", self.reupload_below),
            ("rescan_below", self.rescan_below),
        ];
        for (name, value) in percentages {
            if value > 100 {
                return Err(ScoringError::Configuration(format!(
                    "{} must be within [0, 100], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

impl ScoringConfig {
    /// Load configuration from a JSON file; missing fields take defaults
    pub fn from_file(path: &Path) -> ScoringResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ScoringConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the weight table and thresholds
    pub fn validate(&self) -> ScoringResult<()> {
        self.weights.validate()?;
        self.thresholds.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ScoringConfig::default();

        assert_eq!(config.weights.data_match, dec!(0.25));
        assert_eq!(config.weights.document_quality, dec!(0.15));
        assert_eq!(config.weights.completeness, dec!(0.20));
        assert_eq!(config.weights.consistency, dec!(0.20));
        assert_eq!(config.weights.format_validation, dec!(0.10));
        assert_eq!(config.weights.anomaly_count, dec!(0.10));
        assert_eq!(config.thresholds.min_age, 18);
        assert_eq!(config.thresholds.max_age, 100);
        assert_eq!(config.thresholds.max_high_severity_anomalies, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        assert_eq!(RiskWeights::default().sum(), Decimal::ONE);
    }

    #[test]
    fn test_skewed_weights_rejected() {
        let mut weights = RiskWeights::default();
        weights.data_match = dec!(0.35);

        let err = weights.validate().unwrap_err();
        assert!(matches!(err, ScoringError::Configuration(_)));
        assert!(err.to_string().contains("1.10"));
    }

    #[test]
    fn test_weights_within_epsilon_accepted() {
        let mut weights = RiskWeights::default();
        weights.anomaly_count = dec!(0.10005);
        assert!(weights.validate().is_ok());

        weights.anomaly_count = dec!(0.1002);
        assert!(weights.validate().is_err());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let weights = RiskWeights {
            data_match: dec!(0.45),
            document_quality: dec!(-0.05),
            completeness: dec!(0.20),
            consistency: dec!(0.20),
            format_validation: dec!(0.10),
            anomaly_count: dec!(0.10),
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn test_threshold_ranges() {
        let mut thresholds = ScoringThresholds::default();
        thresholds.min_age = 120;
        assert!(thresholds.validate().is_err());

        let mut thresholds = ScoringThresholds::default();
        thresholds.field_match_similarity = 1.5;
        assert!(thresholds.validate().is_err());

        let mut thresholds = ScoringThresholds::default();
        thresholds.min_completeness = 101;
        assert!(thresholds.validate().is_err());
    }

    #[test]
    fn test_config_partial_json() {
        let json = r#"{ "thresholds": { "min_age": 21 } }"#;
        let config: ScoringConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.thresholds.min_age, 21);
        assert_eq!(config.thresholds.max_age, 100); // default
        assert_eq!(config.weights, RiskWeights::default());
    }

    #[test]
    fn test_from_file_fails_fast_on_bad_weights() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "weights": {{ "data_match": "0.5" }} }}"#).unwrap();

        let result = ScoringConfig::from_file(file.path());
        assert!(matches!(result, Err(ScoringError::Configuration(_))));
    }

    #[test]
    fn test_from_file_valid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "weights": {{ "data_match": "0.30", "anomaly_count": "0.05" }} }}"#
        )
        .unwrap();

        let config = ScoringConfig::from_file(file.path()).unwrap();
        assert_eq!(config.weights.data_match, dec!(0.30));
        assert_eq!(config.weights.sum(), Decimal::ONE);
    }
}
