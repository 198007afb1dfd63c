//! Assessment module - scores accumulated facts against strategy criteria.

mod engine;
mod result;

pub use engine::AssessmentEngine;
pub use result::{
    AssessmentResult, AssessmentStatus, CriterionOutcome, CriterionStatus, GroupScore, RecommendationTier,
    TierThresholds,
};
