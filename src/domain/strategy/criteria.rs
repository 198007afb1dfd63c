//! Declarative assessment criteria carried by a strategy.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::assessment::RecommendationTier;
use crate::domain::foundation::ValidationError;

/// Comparison operator for numeric criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOp {
    #[serde(rename = ">=", alias = "gte")]
    Gte,
    #[serde(rename = "<=", alias = "lte")]
    Lte,
    #[serde(rename = ">", alias = "gt")]
    Gt,
    #[serde(rename = "<", alias = "lt")]
    Lt,
    #[serde(rename = "=", alias = "eq", alias = "==")]
    Eq,
}

impl ComparisonOp {
    /// Applies the operator as `value <op> threshold`.
    pub fn compare(&self, value: f64, threshold: f64) -> bool {
        match self {
            ComparisonOp::Gte => value >= threshold,
            ComparisonOp::Lte => value <= threshold,
            ComparisonOp::Gt => value > threshold,
            ComparisonOp::Lt => value < threshold,
            ComparisonOp::Eq => (value - threshold).abs() < f64::EPSILON,
        }
    }

    /// Operator symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOp::Gte => ">=",
            ComparisonOp::Lte => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Lt => "<",
            ComparisonOp::Eq => "=",
        }
    }
}

/// Typed test applied to one fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Evaluator {
    Numeric { operator: ComparisonOp, threshold: f64 },
    /// Inclusive on both ends.
    Range { min: f64, max: f64 },
    Boolean { expected: bool },
    /// Text membership or list intersection, case-insensitive.
    OneOf { values: Vec<String> },
    Exists,
}

/// A single testable condition over one fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub id: String,
    pub fact: String,
    #[serde(flatten)]
    pub evaluator: Evaluator,
    #[serde(default)]
    pub description: Option<String>,
}

impl Criterion {
    pub fn new(id: impl Into<String>, fact: impl Into<String>, evaluator: Evaluator) -> Self {
        Self {
            id: id.into(),
            fact: fact.into(),
            evaluator,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Named list of criteria scored together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriteriaGroup {
    pub name: String,
    #[serde(default)]
    pub criteria: Vec<Criterion>,
}

impl CriteriaGroup {
    pub fn new(name: impl Into<String>, criteria: Vec<Criterion>) -> Self {
        Self {
            name: name.into(),
            criteria,
        }
    }
}

/// Everything the assessment engine needs from a strategy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AssessmentCriteria {
    /// Facts the strategy expects to collect; reported when missing.
    #[serde(default)]
    pub required_facts: Vec<String>,
    #[serde(default)]
    pub groups: Vec<CriteriaGroup>,
    /// Recommendation text per tier.
    #[serde(default)]
    pub recommendations: BTreeMap<RecommendationTier, String>,
}

impl AssessmentCriteria {
    /// Returns true when no group carries any criterion.
    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.criteria.is_empty())
    }

    /// Total number of criteria across groups.
    pub fn criterion_count(&self) -> usize {
        self.groups.iter().map(|g| g.criteria.len()).sum()
    }

    /// Checks criterion ids are unique and ranges are ordered.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut seen = std::collections::HashSet::new();
        for criterion in self.groups.iter().flat_map(|g| g.criteria.iter()) {
            if criterion.id.trim().is_empty() {
                return Err(ValidationError::empty_field("criterion.id"));
            }
            if criterion.fact.trim().is_empty() {
                return Err(ValidationError::empty_field("criterion.fact"));
            }
            if !seen.insert(criterion.id.as_str()) {
                return Err(ValidationError::invalid_format(
                    "criterion.id",
                    format!("duplicate criterion id '{}'", criterion.id),
                ));
            }
            if let Evaluator::Range { min, max } = criterion.evaluator {
                if min > max {
                    return Err(ValidationError::invalid_format(
                        "criterion.range",
                        format!("'{}' has min {} above max {}", criterion.id, min, max),
                    ));
                }
            }
        }
        Ok(())
    }
}
