//! Consistency sub-validator: age bounds, names across documents, address

use chrono::{Datelike, NaiveDate};
use kycflow_core::{fields, DeclaredProfile, ExtractionRecord};
use serde::{Deserialize, Serialize};

use crate::config::ScoringThresholds;
use crate::similarity::similarity;

pub const DOB_FORMAT: &str = "%Y-%m-%d";

/// Outcome of the age check on the declared date of birth
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeCheck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A failed consistency check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inconsistency {
    pub field: String,
    pub issue: String,
}

/// Consistency sub-result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyResult {
    pub score: u8,
    pub consistent: Vec<String>,
    pub inconsistencies: Vec<Inconsistency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_check: Option<AgeCheck>,
}

/// Whole years elapsed between `dob` and `as_of`; `None` if `dob` is later
pub fn whole_years(dob: NaiveDate, as_of: NaiveDate) -> Option<u32> {
    if dob > as_of {
        return None;
    }
    let mut years = as_of.year() - dob.year();
    if (as_of.month(), as_of.day()) < (dob.month(), dob.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

pub fn check_age(dob: &str, as_of: NaiveDate, min_age: u32, max_age: u32) -> AgeCheck {
    let Ok(date) = NaiveDate::parse_from_str(dob.trim(), DOB_FORMAT) else {
        return AgeCheck {
            age: None,
            valid: false,
            reason: Some("Invalid date format".to_string()),
        };
    };

    match whole_years(date, as_of) {
        None => AgeCheck {
            age: None,
            valid: false,
            reason: Some("Date of birth is in the future".to_string()),
        },
        Some(age) if age < min_age => AgeCheck {
            age: Some(age),
            valid: false,
            reason: Some(format!("Age {} is below minimum {}", age, min_age)),
        },
        Some(age) if age > max_age => AgeCheck {
            age: Some(age),
            valid: false,
            reason: Some(format!("Age {} exceeds maximum {}", age, max_age)),
        },
        Some(age) => AgeCheck {
            age: Some(age),
            valid: true,
            reason: None,
        },
    }
}

pub fn check_consistency(
    profile: &DeclaredProfile,
    records: &[&ExtractionRecord],
    thresholds: &ScoringThresholds,
    as_of: NaiveDate,
) -> ConsistencyResult {
    let mut consistent = Vec::new();
    let mut inconsistencies = Vec::new();

    let age_check = if profile.dob.trim().is_empty() {
        None
    } else {
        let check = check_age(&profile.dob, as_of, thresholds.min_age, thresholds.max_age);
        if check.valid {
            consistent.push("age".to_string());
        } else {
            inconsistencies.push(Inconsistency {
                field: "age".to_string(),
                issue: check.reason.clone().unwrap_or_default(),
            });
        }
        Some(check)
    };

    let names: Vec<&str> = records.iter().filter_map(|r| r.field(fields::NAME)).collect();
    for (i, first) in names.iter().enumerate() {
        for second in &names[i + 1..] {
            if similarity(first, second) >= thresholds.name_consistency_similarity {
                consistent.push("name".to_string());
            } else {
                inconsistencies.push(Inconsistency {
                    field: "name".to_string(),
                    issue: format!("Name mismatch across documents: {} vs {}", first, second),
                });
            }
        }
    }

    let address = profile.address.trim();
    if !address.is_empty() {
        if address.chars().count() >= thresholds.min_address_length {
            consistent.push("address".to_string());
        } else {
            inconsistencies.push(Inconsistency {
                field: "address".to_string(),
                issue: format!(
                    "Address too short (minimum {} characters)",
                    thresholds.min_address_length
                ),
            });
        }
    }

    let total = consistent.len() + inconsistencies.len();
    let score = if total > 0 {
        (consistent.len() * 100 / total) as u8
    } else {
        100
    };

    ConsistencyResult {
        score,
        consistent,
        inconsistencies,
        age_check,
    }
}
