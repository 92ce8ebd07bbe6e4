//! Field match: declared form values against extracted document values

use kycflow_core::{fields, DeclaredProfile, ExtractionRecord, FieldComparison, FormCrossValidation};
use serde::{Deserialize, Serialize};

use crate::similarity::{similarity, Comparison, FieldComparator};

/// Fields compared between the form and the documents
pub const COMPARED_FIELDS: [&str; 3] = [fields::NAME, fields::DOB, fields::ADDRESS];

/// One compared field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMatch {
    pub field: String,
    pub declared: String,
    pub extracted: String,
    pub similarity: f64,
}

/// Data-match sub-result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMatchResult {
    pub score: u8,
    pub matches: Vec<FieldMatch>,
    pub mismatches: Vec<FieldMatch>,
    pub missing_in_extraction: Vec<String>,
}

/// Compare each declared field against the first document that carries it
///
/// `records` must already be in document-type order.
pub fn compare_fields(
    profile: &DeclaredProfile,
    records: &[&ExtractionRecord],
    comparator: &FieldComparator,
) -> FieldMatchResult {
    if records.is_empty() {
        return FieldMatchResult {
            score: 0,
            matches: Vec::new(),
            mismatches: Vec::new(),
            missing_in_extraction: COMPARED_FIELDS.iter().map(|f| f.to_string()).collect(),
        };
    }

    let mut matches = Vec::new();
    let mut mismatches = Vec::new();
    let mut missing = Vec::new();

    for field in COMPARED_FIELDS {
        let declared = profile.get(field).unwrap_or_default();
        let Some(extracted) = records.iter().find_map(|r| r.field(field)) else {
            missing.push(field.to_string());
            continue;
        };

        let comparison = comparator.compare(declared, extracted);
        let entry = FieldMatch {
            field: field.to_string(),
            declared: declared.to_string(),
            extracted: extracted.to_string(),
            similarity: comparison.similarity(),
        };
        match comparison {
            Comparison::Match(_) => matches.push(entry),
            Comparison::Mismatch(_) => mismatches.push(entry),
        }
    }

    let score = (matches.len() * 100 / COMPARED_FIELDS.len()) as u8;

    FieldMatchResult {
        score,
        matches,
        mismatches,
        missing_in_extraction: missing,
    }
}

/// Per-document cross-validation summary
///
/// Only fields declared non-empty are checked, and a match requires
/// similarity strictly above `threshold`.
pub fn cross_validate(
    profile: &DeclaredProfile,
    record: &ExtractionRecord,
    threshold: f64,
) -> FormCrossValidation {
    let mut summary = FormCrossValidation::default();
    let mut checked = 0usize;

    for field in COMPARED_FIELDS {
        let declared = profile.get(field).unwrap_or_default();
        if declared.trim().is_empty() {
            continue;
        }
        checked += 1;

        match record.field(field) {
            Some(extracted) => {
                let score = similarity(declared, extracted);
                let comparison = FieldComparison {
                    declared: declared.to_string(),
                    extracted: extracted.to_string(),
                    similarity: score,
                };
                if score > threshold {
                    summary.matches.insert(field.to_string(), comparison);
                } else {
                    summary.mismatches.insert(field.to_string(), comparison);
                }
            }
            None => {
                summary
                    .missing_in_extraction
                    .insert(field.to_string(), declared.to_string());
            }
        }
    }

    summary.overall_match_score = if checked > 0 {
        summary.matches.len() as f64 / checked as f64
    } else {
        0.0
    };
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use kycflow_core::DocumentType;

    fn profile() -> DeclaredProfile {
        DeclaredProfile::new(
            "John Doe",
            "1990-06-15",
            "123 Main Street, City, State, 400001",
        )
    }

    #[test]
    fn test_no_documents_scores_zero() {
        let result = compare_fields(&profile(), &[], &FieldComparator::new(0.8));
        assert_eq!(result.score, 0);
        assert_eq!(result.missing_in_extraction, vec!["name", "dob", "address"]);
    }

    #[test]
    fn test_match_mismatch_and_missing() {
        let record = ExtractionRecord::new(DocumentType::TaxId, 0.89)
            .with_field(fields::NAME, "JOHN DOE")
            .with_field(fields::DOB, "15/06/1990");

        let result = compare_fields(&profile(), &[&record], &FieldComparator::new(0.8));

        assert_eq!(result.score, 33);
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].field, "name");
        assert_eq!(result.mismatches.len(), 1);
        assert_eq!(result.mismatches[0].field, "dob");
        assert!(result.mismatches[0].similarity < 0.5);
        assert_eq!(result.missing_in_extraction, vec!["address"]);
    }

    #[test]
    fn test_first_document_carrying_field_wins() {
        let tax = ExtractionRecord::new(DocumentType::TaxId, 0.9).with_field(fields::DOB, "1990-06-15");
        let national = ExtractionRecord::new(DocumentType::NationalId, 0.9)
            .with_field(fields::NAME, "John Doe")
            .with_field(fields::DOB, "01/01/1970");

        let result = compare_fields(&profile(), &[&tax, &national], &FieldComparator::new(0.8));

        let dob = result.matches.iter().find(|m| m.field == "dob").unwrap();
        assert_eq!(dob.extracted, "1990-06-15");
        assert!(result.matches.iter().any(|m| m.field == "name"));
        assert_eq!(result.score, 66);
    }

    #[test]
    fn test_cross_validate_strict_threshold() {
        let record = ExtractionRecord::new(DocumentType::NationalId, 0.9)
            .with_field(fields::NAME, "JOHN DOE")
            .with_field(fields::DOB, "15/06/1990");

        let summary = cross_validate(&profile(), &record, 0.8);

        assert!(summary.matches.contains_key("name"));
        assert!(summary.mismatches.contains_key("dob"));
        assert!(summary.missing_in_extraction.contains_key("address"));
        assert!((summary.overall_match_score - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_cross_validate_skips_blank_declared_fields() {
        let profile = DeclaredProfile::new("John Doe", "", "");
        let record = ExtractionRecord::new(DocumentType::TaxId, 0.9).with_field(fields::NAME, "John Doe");

        let summary = cross_validate(&profile, &record, 0.8);
        assert_eq!(summary.overall_match_score, 1.0);

        let empty = DeclaredProfile::default();
        assert_eq!(cross_validate(&empty, &record, 0.8).overall_match_score, 0.0);
    }
}
