//! Identity documents and their extraction records
//!
//! An `ExtractionRecord` is produced once per successful upload by the
//! extraction collaborator. It is immutable once stored and is replaced
//! wholesale when the same document type is uploaded again.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Well-known extracted field names
pub mod fields {
    pub const NAME: &str = "name";
    pub const DOB: &str = "dob";
    pub const ADDRESS: &str = "address";
    pub const TAX_ID: &str = "tax_id";
    pub const NATIONAL_ID: &str = "national_id";
}

/// Supported document types
///
/// Ordering is significant: scoring walks documents in this order when it
/// looks for "the first document that carries a field".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Tax identity card (primary national ID)
    TaxId,
    /// National identity card (secondary national ID)
    NationalId,
    Passport,
}

impl DocumentType {
    pub const ALL: [DocumentType; 3] = [
        DocumentType::TaxId,
        DocumentType::NationalId,
        DocumentType::Passport,
    ];

    /// Document types every case must carry
    pub const REQUIRED: [DocumentType; 2] = [DocumentType::TaxId, DocumentType::NationalId];

    pub fn code(&self) -> &'static str {
        match self {
            DocumentType::TaxId => "tax_id",
            DocumentType::NationalId => "national_id",
            DocumentType::Passport => "passport",
        }
    }

    pub fn is_required(&self) -> bool {
        Self::REQUIRED.contains(self)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for DocumentType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tax_id" => Ok(DocumentType::TaxId),
            "national_id" => Ok(DocumentType::NationalId),
            "passport" => Ok(DocumentType::Passport),
            _ => Err(CoreError::UnknownDocumentType(s.to_string())),
        }
    }
}

/// Upstream image quality verdict for a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityCheck {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl QualityCheck {
    pub fn passed() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
        }
    }
}

/// One declared-vs-extracted comparison inside a cross-validation summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldComparison {
    pub declared: String,
    pub extracted: String,
    pub similarity: f64,
}

/// Per-document comparison of extracted fields against the declared form
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FormCrossValidation {
    #[serde(default)]
    pub matches: BTreeMap<String, FieldComparison>,
    #[serde(default)]
    pub mismatches: BTreeMap<String, FieldComparison>,
    /// Declared values with no extracted counterpart
    #[serde(default)]
    pub missing_in_extraction: BTreeMap<String, String>,
    /// matches / fields checked, in [0, 1]
    #[serde(default)]
    pub overall_match_score: f64,
}

/// Structured output of the extraction collaborator for one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub document_type: DocumentType,
    #[serde(default)]
    pub raw_text: String,
    /// Field name -> candidate value; absent values are kept as `None`
    #[serde(default)]
    pub extracted_fields: BTreeMap<String, Option<String>>,
    /// Extraction confidence in [0, 1]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_check: Option<QualityCheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_validation: Option<FormCrossValidation>,
}

impl ExtractionRecord {
    pub fn new(document_type: DocumentType, confidence: f64) -> Self {
        Self {
            document_type,
            raw_text: String::new(),
            extracted_fields: BTreeMap::new(),
            confidence: confidence.clamp(0.0, 1.0),
            quality_check: None,
            form_validation: None,
        }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.extracted_fields
            .insert(name.to_string(), Some(value.into()));
        self
    }

    pub fn with_raw_text(mut self, raw_text: impl Into<String>) -> Self {
        self.raw_text = raw_text.into();
        self
    }

    pub fn with_quality(mut self, quality: QualityCheck) -> Self {
        self.quality_check = Some(quality);
        self
    }

    /// Extracted value for a field, if present and non-blank
    pub fn field(&self, name: &str) -> Option<&str> {
        self.extracted_fields
            .get(name)
            .and_then(|v| v.as_deref())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    pub fn quality_failed(&self) -> bool {
        matches!(&self.quality_check, Some(q) if !q.valid)
    }
}
