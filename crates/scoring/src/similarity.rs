//! Field comparison between declared and extracted values

use strsim::normalized_levenshtein;

/// Case-insensitive, edit-distance-based similarity ratio in [0, 1]
///
/// Surrounding whitespace is ignored. Two empty strings are identical.
pub fn similarity(declared: &str, extracted: &str) -> f64 {
    let a = declared.trim().to_lowercase();
    let b = extracted.trim().to_lowercase();
    normalized_levenshtein(&a, &b)
}

/// Outcome of comparing one declared value against one extracted value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparison {
    Match(f64),
    Mismatch(f64),
}

impl Comparison {
    pub fn similarity(&self) -> f64 {
        match self {
            Comparison::Match(s) | Comparison::Mismatch(s) => *s,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Comparison::Match(_))
    }
}

/// Compares declared and extracted values against a match threshold
#[derive(Debug, Clone, Copy)]
pub struct FieldComparator {
    threshold: f64,
}

impl FieldComparator {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Similarity at or above the threshold is a match
    pub fn compare(&self, declared: &str, extracted: &str) -> Comparison {
        let score = similarity(declared, extracted);
        if score >= self.threshold {
            Comparison::Match(score)
        } else {
            Comparison::Mismatch(score)
        }
    }
}
