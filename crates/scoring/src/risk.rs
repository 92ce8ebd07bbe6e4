//! Risk aggregation and risk levels
//!
//! Levels follow a total order for comparison:
//! `VeryLow < Low < Medium < High < VeryHigh`
//!
//! The level is a pure function of the integer risk score.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{Display, EnumString};

use crate::config::RiskWeights;

/// Risk level bands (inclusive upper bounds: 20, 40, 60, 80, 100)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskLevel {
    /// Map a risk score to its band; scores above 100 saturate
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=20 => RiskLevel::VeryLow,
            21..=40 => RiskLevel::Low,
            41..=60 => RiskLevel::Medium,
            61..=80 => RiskLevel::High,
            _ => RiskLevel::VeryHigh,
        }
    }

    /// HIGH and VERY_HIGH cases never pass validation
    pub fn is_elevated(&self) -> bool {
        *self >= RiskLevel::High
    }
}

/// Anomaly severity
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Points deducted from the anomaly sub-score
    pub fn weight(&self) -> u32 {
        match self {
            Severity::Low => 5,
            Severity::Medium => 15,
            Severity::High => 30,
        }
    }
}

/// Weighted categories that feed the risk score
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScoreCategory {
    DataMatch,
    DocumentQuality,
    Completeness,
    Consistency,
    FormatValidation,
    AnomalyCount,
}

impl ScoreCategory {
    pub const ALL: [ScoreCategory; 6] = [
        ScoreCategory::DataMatch,
        ScoreCategory::DocumentQuality,
        ScoreCategory::Completeness,
        ScoreCategory::Consistency,
        ScoreCategory::FormatValidation,
        ScoreCategory::AnomalyCount,
    ];

    /// Human-readable label, e.g. "Data Match"
    pub fn label(&self) -> &'static str {
        match self {
            ScoreCategory::DataMatch => "Data Match",
            ScoreCategory::DocumentQuality => "Document Quality",
            ScoreCategory::Completeness => "Completeness",
            ScoreCategory::Consistency => "Consistency",
            ScoreCategory::FormatValidation => "Format Validation",
            ScoreCategory::AnomalyCount => "Anomaly Count",
        }
    }
}

/// Anomaly sub-score: 100 minus the summed severity weights, floored at 0
pub fn anomaly_sub_score<I>(severities: I) -> u8
where
    I: IntoIterator<Item = Severity>,
{
    let total: u32 = severities.into_iter().map(|s| s.weight()).sum();
    100u32.saturating_sub(total) as u8
}

/// Weighted inverse of the sub-scores, truncated into [0, 100]
///
/// Categories missing from the breakdown count as a sub-score of 0.
pub fn aggregate(breakdown: &BTreeMap<ScoreCategory, u8>, weights: &RiskWeights) -> u8 {
    let hundred = Decimal::ONE_HUNDRED;
    let risk: Decimal = ScoreCategory::ALL
        .iter()
        .map(|category| {
            let sub_score = Decimal::from(*breakdown.get(category).unwrap_or(&0)).min(hundred);
            (hundred - sub_score) * weights.get(*category)
        })
        .sum();

    risk.trunc()
        .max(Decimal::ZERO)
        .min(hundred)
        .to_u8()
        .unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn breakdown(scores: [u8; 6]) -> BTreeMap<ScoreCategory, u8> {
        ScoreCategory::ALL.iter().copied().zip(scores).collect()
    }

    #[test]
    fn test_risk_level_bands() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::VeryLow);
        assert_eq!(RiskLevel::from_score(20), RiskLevel::VeryLow);
        assert_eq!(RiskLevel::from_score(21), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(40), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(41), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(60), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(61), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(80), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(81), RiskLevel::VeryHigh);
        assert_eq!(RiskLevel::from_score(100), RiskLevel::VeryHigh);
    }

    #[test]
    fn test_risk_level_monotonic() {
        let mut previous = RiskLevel::from_score(0);
        for score in 1..=100u8 {
            let level = RiskLevel::from_score(score);
            assert!(level >= previous, "level dropped at score {}", score);
            previous = level;
        }
    }

    #[test]
    fn test_risk_level_serialization() {
        assert_eq!(RiskLevel::VeryHigh.to_string(), "VERY_HIGH");
        assert_eq!(
            serde_json::to_string(&RiskLevel::VeryLow).unwrap(),
            "\"VERY_LOW\""
        );
        assert!(RiskLevel::High.is_elevated());
        assert!(!RiskLevel::Medium.is_elevated());
    }

    #[test]
    fn test_anomaly_sub_score() {
        assert_eq!(anomaly_sub_score(vec![]), 100);
        assert_eq!(anomaly_sub_score(vec![Severity::Low]), 95);
        assert_eq!(anomaly_sub_score(vec![Severity::Medium, Severity::High]), 55);
        assert_eq!(anomaly_sub_score(vec![Severity::High; 4]), 0);
    }

    #[test]
    fn test_aggregate_perfect_scores() {
        let weights = RiskWeights::default();
        assert_eq!(aggregate(&breakdown([100; 6]), &weights), 0);
    }

    #[test]
    fn test_aggregate_worst_scores() {
        let weights = RiskWeights::default();
        assert_eq!(aggregate(&breakdown([0; 6]), &weights), 100);
        assert_eq!(aggregate(&BTreeMap::new(), &weights), 100);
    }

    #[test]
    fn test_aggregate_truncates() {
        let weights = RiskWeights::default();
        // 67*0.25 + 11*0.15 + 20*0.20 + 0 + 0 + 60*0.10 = 28.4
        let scores = breakdown([33, 89, 80, 100, 100, 40]);
        assert_eq!(aggregate(&scores, &weights), 28);
    }

    #[test]
    fn test_aggregate_uses_configured_weights() {
        let weights = RiskWeights {
            data_match: dec!(1.0),
            document_quality: dec!(0),
            completeness: dec!(0),
            consistency: dec!(0),
            format_validation: dec!(0),
            anomaly_count: dec!(0),
        };
        let scores = breakdown([55, 0, 0, 0, 0, 0]);
        assert_eq!(aggregate(&scores, &weights), 45);
    }
}
