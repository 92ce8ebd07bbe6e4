//! Completeness sub-validator: required declared fields and documents

use kycflow_core::{DeclaredProfile, DocumentType, ExtractionRecord};
use serde::{Deserialize, Serialize};

use crate::matching::COMPARED_FIELDS;

/// Completeness sub-result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletenessResult {
    pub score: u8,
    pub required: Vec<String>,
    /// Required documents not uploaded, as `<type>_document`
    pub missing_documents: Vec<String>,
    /// Required declared fields left blank
    pub empty_fields: Vec<String>,
}

impl CompletenessResult {
    /// Everything missing, fields first then documents
    pub fn missing(&self) -> Vec<String> {
        self.empty_fields
            .iter()
            .chain(self.missing_documents.iter())
            .cloned()
            .collect()
    }
}

pub fn check_completeness(profile: &DeclaredProfile, records: &[&ExtractionRecord]) -> CompletenessResult {
    let mut required: Vec<String> = COMPARED_FIELDS.iter().map(|f| f.to_string()).collect();

    let empty_fields: Vec<String> = COMPARED_FIELDS
        .iter()
        .filter(|f| profile.get(f).map_or(true, |v| v.trim().is_empty()))
        .map(|f| f.to_string())
        .collect();

    let mut missing_documents = Vec::new();
    for doc_type in DocumentType::REQUIRED {
        let name = format!("{}_document", doc_type);
        if !records.iter().any(|r| r.document_type == doc_type) {
            missing_documents.push(name.clone());
        }
        required.push(name);
    }

    let total = required.len();
    let absent = (empty_fields.len() + missing_documents.len()).min(total);
    let score = ((total - absent) * 100 / total) as u8;

    CompletenessResult {
        score,
        required,
        missing_documents,
        empty_fields,
    }
}
