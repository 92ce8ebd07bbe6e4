//! Automated review heuristic
//!
//! The AI score is a probabilistic, clearly separate signal stored next to
//! the deterministic risk score. It never gates approval or rejection.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};

pub const AI_BASE_MIN: u8 = 70;
pub const AI_BASE_MAX: u8 = 85;

/// Apply the data-match and confidence boosts to a base draw, capped at 100
pub fn ai_score(base: u8, data_match_score: f64, mean_confidence: f64) -> u8 {
    let mut score = u32::from(base);
    if data_match_score > 0.8 {
        score += 10;
    } else if data_match_score > 0.6 {
        score += 5;
    }
    if mean_confidence > 0.8 {
        score += 5;
    }
    score.min(100) as u8
}

/// Draws AI review scores from a (optionally seeded) generator
pub struct AiReviewer {
    rng: Mutex<StdRng>,
}

impl AiReviewer {
    /// A fixed seed makes the draws reproducible
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng: Mutex::new(rng) }
    }

    pub fn review(&self, data_match_score: f64, mean_confidence: f64) -> u8 {
        let base = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(AI_BASE_MIN..=AI_BASE_MAX);
        ai_score(base, data_match_score, mean_confidence)
    }
}
