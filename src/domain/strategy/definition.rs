//! Strategy configuration and the per-session snapshot.

use serde::{Deserialize, Serialize};

use super::{AssessmentCriteria, ExtractionRule};
use crate::domain::foundation::{DomainError, ErrorCode, KnowledgeSourceId, StrategyId, Timestamp, ValidationError};

/// Turn limit used when a strategy does not declare one.
pub const DEFAULT_MAX_TURNS: u32 = 20;

/// A versioned description of one assessment workflow.
///
/// Read-only from the engine's point of view. Sessions pin a
/// [`StrategySnapshot`] at start so later edits do not reach them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub id: StrategyId,
    #[serde(default = "default_version")]
    pub version: u32,
    pub name: String,
    pub goal: String,
    /// Overrides the template-derived opening message when set.
    #[serde(default)]
    pub opening_message: Option<String>,
    #[serde(default)]
    pub extraction_rules: Vec<ExtractionRule>,
    #[serde(default)]
    pub criteria: AssessmentCriteria,
    #[serde(default)]
    pub knowledge_source_ids: Vec<KnowledgeSourceId>,
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
}

fn default_version() -> u32 {
    1
}

fn default_max_turns() -> u32 {
    DEFAULT_MAX_TURNS
}

impl Strategy {
    /// Creates a strategy with no rules, criteria or sources.
    pub fn new(id: StrategyId, name: impl Into<String>, goal: impl Into<String>) -> Self {
        Self {
            id,
            version: default_version(),
            name: name.into(),
            goal: goal.into(),
            opening_message: None,
            extraction_rules: Vec::new(),
            criteria: AssessmentCriteria::default(),
            knowledge_source_ids: Vec::new(),
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    pub fn with_rule(mut self, rule: ExtractionRule) -> Self {
        self.extraction_rules.push(rule);
        self
    }

    pub fn with_criteria(mut self, criteria: AssessmentCriteria) -> Self {
        self.criteria = criteria;
        self
    }

    pub fn with_knowledge_source(mut self, id: KnowledgeSourceId) -> Self {
        self.knowledge_source_ids.push(id);
        self
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_opening_message(mut self, message: impl Into<String>) -> Self {
        self.opening_message = Some(message.into());
        self
    }

    /// Parses and validates a strategy document.
    pub fn from_yaml(source: &str) -> Result<Self, DomainError> {
        let strategy: Strategy = serde_yaml::from_str(source).map_err(|e| {
            DomainError::new(ErrorCode::InvalidFormat, format!("Invalid strategy document: {}", e))
        })?;
        strategy.validate()?;
        Ok(strategy)
    }

    /// Checks structural invariants.
    ///
    /// # Errors
    ///
    /// - `EmptyField` for a blank name or goal
    /// - `OutOfRange` when `max_turns` is zero
    /// - any rule or criteria validation failure
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        if self.goal.trim().is_empty() {
            return Err(ValidationError::empty_field("goal"));
        }
        if self.max_turns == 0 {
            return Err(ValidationError::out_of_range("max_turns", 1.0, f64::from(u32::MAX), 0.0));
        }
        for rule in &self.extraction_rules {
            rule.validate()?;
        }
        self.criteria.validate()
    }

    /// Pins a deep copy of this strategy.
    pub fn snapshot(&self) -> StrategySnapshot {
        StrategySnapshot {
            strategy: self.clone(),
            pinned_at: Timestamp::now(),
        }
    }
}

/// Immutable copy of a strategy held by a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySnapshot {
    strategy: Strategy,
    pinned_at: Timestamp,
}

impl StrategySnapshot {
    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn pinned_at(&self) -> &Timestamp {
        &self.pinned_at
    }

    pub fn id(&self) -> &StrategyId {
        &self.strategy.id
    }

    pub fn version(&self) -> u32 {
        self.strategy.version
    }

    pub fn name(&self) -> &str {
        &self.strategy.name
    }

    pub fn goal(&self) -> &str {
        &self.strategy.goal
    }

    pub fn extraction_rules(&self) -> &[ExtractionRule] {
        &self.strategy.extraction_rules
    }

    pub fn criteria(&self) -> &AssessmentCriteria {
        &self.strategy.criteria
    }

    pub fn knowledge_source_ids(&self) -> &[KnowledgeSourceId] {
        &self.strategy.knowledge_source_ids
    }

    pub fn max_turns(&self) -> u32 {
        self.strategy.max_turns
    }
}
