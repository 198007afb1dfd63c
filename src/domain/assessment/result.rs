//! Assessment result types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::fact::FactValue;
use crate::domain::foundation::{Timestamp, ValidationError};

/// Ordered recommendation category derived from the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationTier {
    NotIndicated,
    LowPriority,
    ModeratePriority,
    HighPriority,
}

impl RecommendationTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationTier::NotIndicated => "not_indicated",
            RecommendationTier::LowPriority => "low_priority",
            RecommendationTier::ModeratePriority => "moderate_priority",
            RecommendationTier::HighPriority => "high_priority",
        }
    }

    /// Text used when a strategy has no recommendation for this tier.
    pub fn default_recommendation(&self) -> &'static str {
        match self {
            RecommendationTier::NotIndicated => {
                "Based on the information provided, no further action is indicated at this time."
            }
            RecommendationTier::LowPriority => {
                "Some criteria are met. Consider discussing these results at a routine visit."
            }
            RecommendationTier::ModeratePriority => {
                "Several criteria are met. A follow-up with a clinician is recommended."
            }
            RecommendationTier::HighPriority => {
                "Most criteria are met. Prompt referral to a specialist is recommended."
            }
        }
    }
}

impl fmt::Display for RecommendationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Percentage cut-offs for each tier, lower bound inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    pub low: f64,
    pub moderate: f64,
    pub high: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            low: 40.0,
            moderate: 60.0,
            high: 80.0,
        }
    }
}

impl TierThresholds {
    /// Step function from overall percentage to tier.
    pub fn tier_for(&self, percentage: f64) -> RecommendationTier {
        if percentage >= self.high {
            RecommendationTier::HighPriority
        } else if percentage >= self.moderate {
            RecommendationTier::ModeratePriority
        } else if percentage >= self.low {
            RecommendationTier::LowPriority
        } else {
            RecommendationTier::NotIndicated
        }
    }

    /// Thresholds must lie in [0, 100] and be non-decreasing.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [("low", self.low), ("moderate", self.moderate), ("high", self.high)] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ValidationError::out_of_range(field, 0.0, 100.0, value));
            }
        }
        if self.low > self.moderate || self.moderate > self.high {
            return Err(ValidationError::invalid_format(
                "thresholds",
                "must satisfy low <= moderate <= high",
            ));
        }
        Ok(())
    }
}

/// Whether the engine produced a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    Scored,
    /// The strategy carries no criteria; distinct from a zero score.
    NoCriteria,
}

/// Classification of a single criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionStatus {
    Met,
    NotMet,
    Indeterminate,
}

/// Result of evaluating one criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionOutcome {
    pub criterion_id: String,
    pub group: String,
    pub fact: String,
    pub status: CriterionStatus,
    /// Fact value the evaluator saw, when present.
    pub value: Option<FactValue>,
    /// Why the criterion was not met or could not be decided.
    pub reason: Option<String>,
}

/// Score of one criteria group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupScore {
    pub name: String,
    pub met: usize,
    pub total: usize,
    pub percentage: f64,
    pub outcomes: Vec<CriterionOutcome>,
}

/// Output of one assessment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub status: AssessmentStatus,
    pub groups: Vec<GroupScore>,
    pub met: usize,
    pub total: usize,
    pub percentage: f64,
    pub met_criteria: Vec<CriterionOutcome>,
    pub not_met_criteria: Vec<CriterionOutcome>,
    pub indeterminate_criteria: Vec<CriterionOutcome>,
    pub missing_required_facts: Vec<String>,
    /// `None` only for [`AssessmentStatus::NoCriteria`].
    pub tier: Option<RecommendationTier>,
    pub recommendation: Option<String>,
    pub summary: String,
    pub assessed_at: Timestamp,
}

impl AssessmentResult {
    pub fn is_scored(&self) -> bool {
        self.status == AssessmentStatus::Scored
    }

    /// Compares two results field by field, ignoring `assessed_at`.
    pub fn same_outcome(&self, other: &AssessmentResult) -> bool {
        let mut other = other.clone();
        other.assessed_at = self.assessed_at;
        *self == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_ordered() {
        assert!(RecommendationTier::NotIndicated < RecommendationTier::LowPriority);
        assert!(RecommendationTier::LowPriority < RecommendationTier::ModeratePriority);
        assert!(RecommendationTier::ModeratePriority < RecommendationTier::HighPriority);
    }

    #[test]
    fn default_thresholds_are_lower_bound_inclusive() {
        let t = TierThresholds::default();
        assert_eq!(t.tier_for(0.0), RecommendationTier::NotIndicated);
        assert_eq!(t.tier_for(39.9), RecommendationTier::NotIndicated);
        assert_eq!(t.tier_for(40.0), RecommendationTier::LowPriority);
        assert_eq!(t.tier_for(60.0), RecommendationTier::ModeratePriority);
        assert_eq!(t.tier_for(79.99), RecommendationTier::ModeratePriority);
        assert_eq!(t.tier_for(80.0), RecommendationTier::HighPriority);
        assert_eq!(t.tier_for(100.0), RecommendationTier::HighPriority);
    }

    #[test]
    fn validate_rejects_unordered_thresholds() {
        let t = TierThresholds {
            low: 70.0,
            moderate: 60.0,
            high: 80.0,
        };
        assert!(t.validate().is_err());
        let t = TierThresholds {
            low: 10.0,
            moderate: 60.0,
            high: 180.0,
        };
        assert!(t.validate().is_err());
        assert!(TierThresholds::default().validate().is_ok());
    }

    #[test]
    fn tier_serializes_snake_case() {
        let json = serde_json::to_string(&RecommendationTier::ModeratePriority).unwrap();
        assert_eq!(json, "\"moderate_priority\"");
    }
}
