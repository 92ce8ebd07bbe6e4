//! Recommendation generation from the risk level and diagnostics

use crate::anomaly::Anomaly;
use crate::config::ScoringThresholds;
use crate::risk::RiskLevel;

/// Fixed guidance for each risk level
pub fn level_guidance(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::VeryHigh => "REJECT: Very high risk - Manual verification strongly recommended",
        RiskLevel::High => "CAUTION: High risk - Thorough manual review required",
        RiskLevel::Medium => "REVIEW: Medium risk - Additional verification recommended",
        RiskLevel::Low => "APPROVE: Low risk - Standard verification sufficient",
        RiskLevel::VeryLow => "APPROVE: Very low risk - Minimal verification needed",
    }
}

/// Inputs to the recommendation list
pub struct RecommendationInput<'a> {
    pub risk_level: RiskLevel,
    pub anomalies: &'a [Anomaly],
    pub data_match_score: u8,
    pub document_quality_score: u8,
    pub missing: &'a [String],
}

pub struct RecommendationGenerator<'a> {
    thresholds: &'a ScoringThresholds,
}

impl<'a> RecommendationGenerator<'a> {
    pub fn new(thresholds: &'a ScoringThresholds) -> Self {
        Self { thresholds }
    }

    pub fn generate(&self, input: &RecommendationInput<'_>) -> Vec<String> {
        let mut recommendations = vec![level_guidance(input.risk_level).to_string()];

        let high = input.anomalies.iter().filter(|a| a.is_high()).count();
        if high > 0 {
            recommendations.push(format!(
                "Address {} high-severity anomalies before approval",
                high
            ));
        }

        if input.data_match_score < self.thresholds.reupload_below {
            recommendations.push("Re-upload documents with better quality for accurate extraction".to_string());
        }

        if !input.missing.is_empty() {
            recommendations.push(format!("Complete missing fields: {}", input.missing.join(", ")));
        }

        if input.document_quality_score < self.thresholds.rescan_below {
            recommendations.push("Request higher quality document scans".to_string());
        }

        recommendations
    }
}
