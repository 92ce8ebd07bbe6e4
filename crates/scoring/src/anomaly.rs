//! Anomaly detection over the sub-validator results
//!
//! Anomalies are derived fresh on every scoring run, in a fixed order:
//! missing fields, mismatches, invalid formats, age, document quality,
//! then suspicious patterns in the declared form.

use kycflow_core::{fields, DeclaredProfile};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use strum_macros::{Display, EnumString};

use crate::completeness::CompletenessResult;
use crate::consistency::ConsistencyResult;
use crate::format::FormatResult;
use crate::matching::FieldMatchResult;
use crate::quality::QualityResult;
use crate::risk::Severity;

/// Values that mark a form as test or dummy data
pub const PLACEHOLDER_KEYWORDS: [&str; 5] = ["test", "dummy", "sample", "xxx", "example"];

/// Identical consecutive characters that make a run suspicious
const REPEATED_RUN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyType {
    MissingField,
    Mismatch,
    InvalidFormat,
    SuspiciousPattern,
    AgeInconsistency,
    DocumentQuality,
}

/// A typed, severity-tagged finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    #[serde(rename = "type")]
    pub anomaly_type: AnomalyType,
    pub field: String,
    pub severity: Severity,
    pub description: String,
    /// Similarity evidence for mismatches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

impl Anomaly {
    pub fn new(
        anomaly_type: AnomalyType,
        field: impl Into<String>,
        severity: Severity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            anomaly_type,
            field: field.into(),
            severity,
            description: description.into(),
            similarity: None,
        }
    }

    pub fn with_similarity(mut self, similarity: f64) -> Self {
        self.similarity = Some(similarity);
        self
    }

    pub fn is_high(&self) -> bool {
        self.severity == Severity::High
    }
}

/// Sub-results the detector reads from
pub struct DetectorInput<'a> {
    pub profile: &'a DeclaredProfile,
    pub data_match: &'a FieldMatchResult,
    pub quality: &'a QualityResult,
    pub completeness: &'a CompletenessResult,
    pub consistency: &'a ConsistencyResult,
    pub format: &'a FormatResult,
}

/// Turns sub-results and form heuristics into anomalies
#[derive(Debug, Clone, Copy)]
pub struct AnomalyDetector {
    high_severity_mismatch: f64,
}

impl AnomalyDetector {
    /// Mismatches with similarity below `high_severity_mismatch` are high severity
    pub fn new(high_severity_mismatch: f64) -> Self {
        Self {
            high_severity_mismatch,
        }
    }

    pub fn detect(&self, input: &DetectorInput<'_>) -> Vec<Anomaly> {
        let mut anomalies = Vec::new();

        for field in input.completeness.missing() {
            let description = format!("Required field \"{}\" is missing", field);
            anomalies.push(Anomaly::new(
                AnomalyType::MissingField,
                field,
                Severity::High,
                description,
            ));
        }

        for mismatch in &input.data_match.mismatches {
            let severity = if mismatch.similarity < self.high_severity_mismatch {
                Severity::High
            } else {
                Severity::Medium
            };
            anomalies.push(
                Anomaly::new(
                    AnomalyType::Mismatch,
                    &mismatch.field,
                    severity,
                    format!(
                        "Mismatch: declared '{}' vs extracted '{}'",
                        mismatch.declared, mismatch.extracted
                    ),
                )
                .with_similarity(mismatch.similarity),
            );
        }

        for invalid in &input.format.invalid {
            anomalies.push(Anomaly::new(
                AnomalyType::InvalidFormat,
                &invalid.field,
                Severity::Medium,
                &invalid.issue,
            ));
        }

        if let Some(age) = input.consistency.age_check.as_ref().filter(|a| !a.valid) {
            anomalies.push(Anomaly::new(
                AnomalyType::AgeInconsistency,
                fields::DOB,
                Severity::High,
                age.reason.as_deref().unwrap_or("Invalid age"),
            ));
        }

        for issue in &input.quality.issues {
            anomalies.push(Anomaly::new(
                AnomalyType::DocumentQuality,
                "document",
                Severity::Medium,
                issue,
            ));
        }

        anomalies.extend(suspicious_patterns(input.profile));
        anomalies
    }
}

/// Repeated runs or tokens in the name, placeholder keywords anywhere
pub fn suspicious_patterns(profile: &DeclaredProfile) -> Vec<Anomaly> {
    let mut found = Vec::new();

    if !profile.name.trim().is_empty() && has_repeated_pattern(&profile.name) {
        found.push(Anomaly::new(
            AnomalyType::SuspiciousPattern,
            fields::NAME,
            Severity::Medium,
            "Name contains suspicious repeated patterns",
        ));
    }

    for (field, value) in profile.entries() {
        if contains_placeholder(value) {
            found.push(Anomaly::new(
                AnomalyType::SuspiciousPattern,
                field,
                Severity::High,
                format!("Field contains test/dummy data: {}", value),
            ));
        }
    }

    found
}

/// Three or more identical consecutive characters, or a word used twice
pub fn has_repeated_pattern(value: &str) -> bool {
    let mut run = 0usize;
    let mut previous = None;
    for c in value.chars() {
        if previous == Some(c) {
            run += 1;
            if run >= REPEATED_RUN {
                return true;
            }
        } else {
            run = 1;
        }
        previous = Some(c);
    }

    let mut seen = HashSet::new();
    value
        .split_whitespace()
        .map(str::to_lowercase)
        .any(|word| !seen.insert(word))
}

pub fn contains_placeholder(value: &str) -> bool {
    let lower = value.to_lowercase();
    PLACEHOLDER_KEYWORDS.iter().any(|k| lower.contains(k))
}
