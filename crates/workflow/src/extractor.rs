//! Extraction collaborator boundary
//!
//! The collaborator turns document bytes into an `ExtractionRecord`. OCR
//! engines live behind this trait; the workflow only sees records or a
//! typed failure.

use async_trait::async_trait;
use kycflow_core::{DocumentType, ExtractionRecord, FormCrossValidation, QualityCheck};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

/// Collaborator failures, surfaced with the collaborator's reason
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionError {
    #[error("Document unreadable: {0}")]
    Unreadable(String),

    #[error("Unsupported document type: {0}")]
    Unsupported(DocumentType),

    #[error("Malformed extraction output: {0}")]
    Malformed(String),
}

/// Extracts structured fields from one uploaded document
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract(
        &self,
        document: &[u8],
        document_type: DocumentType,
    ) -> Result<ExtractionRecord, ExtractionError>;

    /// Collaborator name for logs
    fn name(&self) -> &str;
}

/// Scripted extractor for tests: returns a preset record per document type
pub struct StaticExtractor {
    records: RwLock<HashMap<DocumentType, Result<ExtractionRecord, ExtractionError>>>,
}

impl StaticExtractor {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    pub fn set_record(&self, record: ExtractionRecord) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(record.document_type, Ok(record));
    }

    pub fn set_failure(&self, document_type: DocumentType, error: ExtractionError) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(document_type, Err(error));
    }
}

impl Default for StaticExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentExtractor for StaticExtractor {
    async fn extract(
        &self,
        _document: &[u8],
        document_type: DocumentType,
    ) -> Result<ExtractionRecord, ExtractionError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records
            .get(&document_type)
            .cloned()
            .unwrap_or_else(|| {
                Err(ExtractionError::Unreadable(format!(
                    "no scripted result for {}",
                    document_type
                )))
            })
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Output of an external OCR run, as JSON
#[derive(Debug, Deserialize)]
struct ExtractionPayload {
    #[serde(default)]
    document_type: Option<DocumentType>,
    #[serde(default)]
    raw_text: String,
    #[serde(default, alias = "extracted_fields")]
    fields: BTreeMap<String, Option<String>>,
    confidence: f64,
    #[serde(default)]
    quality_check: Option<QualityCheck>,
    #[serde(default)]
    form_validation: Option<FormCrossValidation>,
}

/// Reads documents that are already the JSON output of an OCR run
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonExtractor;

#[async_trait]
impl DocumentExtractor for JsonExtractor {
    async fn extract(
        &self,
        document: &[u8],
        document_type: DocumentType,
    ) -> Result<ExtractionRecord, ExtractionError> {
        let payload: ExtractionPayload =
            serde_json::from_slice(document).map_err(|e| ExtractionError::Malformed(e.to_string()))?;

        if let Some(declared) = payload.document_type {
            if declared != document_type {
                return Err(ExtractionError::Malformed(format!(
                    "payload is a {} extraction, uploaded as {}",
                    declared, document_type
                )));
            }
        }
        if !(0.0..=1.0).contains(&payload.confidence) {
            return Err(ExtractionError::Malformed(format!(
                "confidence {} outside [0, 1]",
                payload.confidence
            )));
        }

        let mut record = ExtractionRecord::new(document_type, payload.confidence).with_raw_text(payload.raw_text);
        record.extracted_fields = payload.fields;
        record.quality_check = payload.quality_check;
        record.form_validation = payload.form_validation;
        Ok(record)
    }

    fn name(&self) -> &str {
        "json"
    }
}
