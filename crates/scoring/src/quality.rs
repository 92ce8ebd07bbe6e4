//! Document quality sub-validator

use kycflow_core::{DocumentType, ExtractionRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Quality summary for one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentQuality {
    pub confidence: f64,
    pub issues: Vec<String>,
}

/// Document-quality sub-result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityResult {
    pub score: u8,
    pub documents: BTreeMap<DocumentType, DocumentQuality>,
    /// All per-document issues, in document order
    pub issues: Vec<String>,
}

/// Average extraction confidence, plus an issue per low-confidence or
/// quality-failed document
pub fn assess_quality(records: &[&ExtractionRecord], min_confidence: f64) -> QualityResult {
    if records.is_empty() {
        return QualityResult {
            score: 0,
            documents: BTreeMap::new(),
            issues: vec!["No documents uploaded".to_string()],
        };
    }

    let mut documents = BTreeMap::new();
    let mut issues = Vec::new();
    let mut total_confidence = 0.0;

    for record in records {
        let mut doc_issues = Vec::new();
        total_confidence += record.confidence;

        if record.confidence < min_confidence {
            doc_issues.push(format!(
                "{}: low extraction confidence {:.2}%",
                record.document_type,
                record.confidence * 100.0
            ));
        }

        if let Some(quality) = &record.quality_check {
            if !quality.valid {
                doc_issues.push(format!(
                    "{}: quality issue: {}",
                    record.document_type,
                    quality.reason.as_deref().unwrap_or("Unknown")
                ));
            }
        }

        issues.extend(doc_issues.iter().cloned());
        documents.insert(
            record.document_type,
            DocumentQuality {
                confidence: record.confidence,
                issues: doc_issues,
            },
        );
    }

    let average = total_confidence / records.len() as f64;
    let score = (average * 100.0).clamp(0.0, 100.0) as u8;

    QualityResult {
        score,
        documents,
        issues,
    }
}
