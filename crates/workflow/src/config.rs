//! Service configuration

use kycflow_scoring::ScoringConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::WorkflowResult;

/// Configuration for the case service
///
/// Every field has a default, so a partial JSON file is enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Risk weights and thresholds for the scoring engine
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Seed for the AI review draw; entropy when absent
    #[serde(default)]
    pub ai_seed: Option<u64>,

    /// Refuse uploads whose upstream quality check failed
    #[serde(default = "default_reject_failed_quality")]
    pub reject_failed_quality: bool,

    /// Accept uploads on approved or rejected cases
    #[serde(default)]
    pub allow_upload_after_decision: bool,

    /// Maximum number of cases returned by a listing
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
}

fn default_reject_failed_quality() -> bool {
    true
}

fn default_list_limit() -> usize {
    100
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            ai_seed: None,
            reject_failed_quality: default_reject_failed_quality(),
            allow_upload_after_decision: false,
            list_limit: default_list_limit(),
        }
    }
}

impl ServiceConfig {
    /// Load from a JSON file and validate the scoring section
    pub fn from_file(path: &Path) -> WorkflowResult<Self> {
        let content = std::fs::read_to_string(path).map_err(kycflow_scoring::ScoringError::from)?;
        let config: ServiceConfig =
            serde_json::from_str(&content).map_err(kycflow_scoring::ScoringError::from)?;
        config.scoring.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.ai_seed = Some(seed);
        self
    }
}
