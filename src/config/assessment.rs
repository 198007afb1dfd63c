//! Assessment tier thresholds

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::assessment::TierThresholds;

/// Overall-percentage lower bounds for each tier.
#[derive(Debug, Clone, Deserialize)]
pub struct AssessmentConfig {
    #[serde(default = "default_low")]
    pub low_priority_threshold: f64,

    #[serde(default = "default_moderate")]
    pub moderate_priority_threshold: f64,

    #[serde(default = "default_high")]
    pub high_priority_threshold: f64,
}

impl AssessmentConfig {
    pub fn thresholds(&self) -> TierThresholds {
        TierThresholds {
            low: self.low_priority_threshold,
            moderate: self.moderate_priority_threshold,
            high: self.high_priority_threshold,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.thresholds()
            .validate()
            .map_err(|_| ValidationError::UnorderedThresholds)
    }
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            low_priority_threshold: default_low(),
            moderate_priority_threshold: default_moderate(),
            high_priority_threshold: default_high(),
        }
    }
}

fn default_low() -> f64 {
    40.0
}

fn default_moderate() -> f64 {
    60.0
}

fn default_high() -> f64 {
    80.0
}
