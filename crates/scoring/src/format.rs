//! Format validation of identifiers, independent of any comparison

use kycflow_core::{fields, DeclaredProfile, ExtractionRecord};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

/// Five letters, four digits, one letter
static TAX_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z]{5}[0-9]{4}[A-Z]$").unwrap());

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

fn digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// 10 digits, or 12 with a country code, after stripping everything else
pub fn is_valid_phone(phone: &str) -> bool {
    matches!(digits(phone).len(), 10 | 12)
}

pub fn is_valid_tax_id(tax_id: &str) -> bool {
    TAX_ID_RE.is_match(tax_id.trim())
}

/// 12 digits (separators allowed), not starting with 0 or 1
pub fn is_valid_national_id(national_id: &str) -> bool {
    let digits = digits(national_id);
    digits.len() == 12 && !digits.starts_with(['0', '1'])
}

/// A value that failed its format check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidFormat {
    pub field: String,
    pub value: String,
    pub issue: String,
}

/// Format sub-result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatResult {
    pub score: u8,
    pub valid: Vec<String>,
    pub invalid: Vec<InvalidFormat>,
}

#[derive(Default)]
struct FormatTally {
    valid: Vec<String>,
    invalid: Vec<InvalidFormat>,
}

impl FormatTally {
    fn check(&mut self, field: &str, value: &str, is_valid: fn(&str) -> bool, issue: &str) {
        if is_valid(value) {
            self.valid.push(field.to_string());
        } else {
            self.invalid.push(InvalidFormat {
                field: field.to_string(),
                value: value.to_string(),
                issue: issue.to_string(),
            });
        }
    }
}

/// Declared email/phone, plus the first extracted tax ID and national ID
pub fn validate_formats(profile: &DeclaredProfile, records: &[&ExtractionRecord]) -> FormatResult {
    let mut tally = FormatTally::default();

    if let Some(email) = profile.email.as_deref().filter(|e| !e.trim().is_empty()) {
        tally.check("email", email, is_valid_email, "Invalid email format");
    }

    if let Some(phone) = profile.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        tally.check("phone", phone, is_valid_phone, "Invalid phone format");
    }

    if let Some(tax_id) = records.iter().find_map(|r| r.field(fields::TAX_ID)) {
        tally.check(fields::TAX_ID, tax_id, is_valid_tax_id, "Invalid tax ID format");
    }

    if let Some(national_id) = records.iter().find_map(|r| r.field(fields::NATIONAL_ID)) {
        tally.check(
            fields::NATIONAL_ID,
            national_id,
            is_valid_national_id,
            "Invalid national ID format",
        );
    }

    let total = tally.valid.len() + tally.invalid.len();
    let score = if total > 0 {
        (tally.valid.len() * 100 / total) as u8
    } else {
        100
    };

    FormatResult {
        score,
        valid: tally.valid,
        invalid: tally.invalid,
    }
}
