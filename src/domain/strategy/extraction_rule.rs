//! Extraction rule definitions.
//!
//! Rules are declared per strategy and pinned into the session snapshot.
//! The method is a closed enum; each variant maps to one extractor type.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::fact::{FactValue, Facts};
use crate::domain::foundation::ValidationError;

/// Default priority for rules that do not declare one.
pub const DEFAULT_RULE_PRIORITY: u32 = 100;

/// Declared type of an extracted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Integer,
    Float,
    Boolean,
    #[default]
    Text,
}

/// How a rule finds its value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Regular expression; capture group 1 (or the whole match) is the value.
    Pattern {
        pattern: String,
        #[serde(default)]
        value_type: ValueType,
    },
    /// Case-insensitive keyword presence.
    ///
    /// Produces `value` as text when set (categorical fact), otherwise `true`.
    Keyword {
        keywords: Vec<String>,
        #[serde(default)]
        value: Option<String>,
    },
    /// Delegates to the completion capability with a rule-specific prompt.
    ModelHybrid {
        prompt: String,
        #[serde(default)]
        value_type: ValueType,
    },
}

impl ExtractionMethod {
    /// Short method name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            ExtractionMethod::Pattern { .. } => "pattern",
            ExtractionMethod::Keyword { .. } => "keyword",
            ExtractionMethod::ModelHybrid { .. } => "model_hybrid",
        }
    }
}

/// Numeric bounds a value must respect to be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ValueConstraints {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl ValueConstraints {
    /// Creates bounds with both ends set.
    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Returns true if the value is inside the declared bounds (inclusive).
    pub fn allows(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    /// Returns true if a fact value passes the bounds; non-numeric values always pass.
    pub fn allows_value(&self, value: &FactValue) -> bool {
        match value {
            FactValue::Integer(_) | FactValue::Float(_) => {
                value.as_f64().map_or(false, |v| self.allows(v))
            }
            _ => true,
        }
    }
}

/// Condition gating whether a rule runs this turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "when", rename_all = "snake_case")]
pub enum TriggerCondition {
    FactPresent { fact: String },
    FactAbsent { fact: String },
    FactEquals { fact: String, value: FactValue },
}

impl TriggerCondition {
    /// Evaluates the condition against the facts known before this turn.
    pub fn is_satisfied(&self, facts: &Facts) -> bool {
        match self {
            TriggerCondition::FactPresent { fact } => facts.contains(fact),
            TriggerCondition::FactAbsent { fact } => !facts.contains(fact),
            TriggerCondition::FactEquals { fact, value } => facts.get(fact) == Some(value),
        }
    }
}

/// One declarative extraction rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRule {
    /// Fact name the rule produces.
    pub entity: String,
    #[serde(flatten)]
    pub method: ExtractionMethod,
    #[serde(default)]
    pub constraints: ValueConstraints,
    /// Lower value wins on key collisions.
    #[serde(default = "default_priority")]
    pub priority: u32,
    #[serde(default)]
    pub trigger: Option<TriggerCondition>,
}

fn default_priority() -> u32 {
    DEFAULT_RULE_PRIORITY
}

impl ExtractionRule {
    /// Creates a pattern rule.
    pub fn pattern(entity: impl Into<String>, pattern: impl Into<String>, value_type: ValueType) -> Self {
        Self::with_method(
            entity,
            ExtractionMethod::Pattern {
                pattern: pattern.into(),
                value_type,
            },
        )
    }

    /// Creates a keyword rule producing `true` on match.
    pub fn keyword(entity: impl Into<String>, keywords: &[&str]) -> Self {
        Self::with_method(
            entity,
            ExtractionMethod::Keyword {
                keywords: keywords.iter().map(|k| k.to_string()).collect(),
                value: None,
            },
        )
    }

    /// Creates a model-assisted rule.
    pub fn model_hybrid(entity: impl Into<String>, prompt: impl Into<String>, value_type: ValueType) -> Self {
        Self::with_method(
            entity,
            ExtractionMethod::ModelHybrid {
                prompt: prompt.into(),
                value_type,
            },
        )
    }

    fn with_method(entity: impl Into<String>, method: ExtractionMethod) -> Self {
        Self {
            entity: entity.into(),
            method,
            constraints: ValueConstraints::default(),
            priority: DEFAULT_RULE_PRIORITY,
            trigger: None,
        }
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets numeric bounds.
    pub fn with_constraints(mut self, constraints: ValueConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Sets a trigger condition.
    pub fn with_trigger(mut self, trigger: TriggerCondition) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Returns true if the rule should run given the facts known so far.
    pub fn is_triggered(&self, facts: &Facts) -> bool {
        self.trigger.as_ref().map_or(true, |t| t.is_satisfied(facts))
    }

    /// Checks the rule is well-formed.
    ///
    /// # Errors
    ///
    /// - `EmptyField` for a blank entity, pattern, keyword list or prompt
    /// - `InvalidFormat` for a pattern that does not compile or inverted bounds
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.entity.trim().is_empty() {
            return Err(ValidationError::empty_field("entity"));
        }
        if let (Some(min), Some(max)) = (self.constraints.min, self.constraints.max) {
            if min > max {
                return Err(ValidationError::invalid_format(
                    "constraints",
                    format!("min {} exceeds max {}", min, max),
                ));
            }
        }
        match &self.method {
            ExtractionMethod::Pattern { pattern, .. } => {
                if pattern.is_empty() {
                    return Err(ValidationError::empty_field("pattern"));
                }
                Regex::new(pattern)
                    .map_err(|e| ValidationError::invalid_format("pattern", e.to_string()))?;
            }
            ExtractionMethod::Keyword { keywords, .. } => {
                if keywords.iter().all(|k| k.trim().is_empty()) {
                    return Err(ValidationError::empty_field("keywords"));
                }
            }
            ExtractionMethod::ModelHybrid { prompt, .. } => {
                if prompt.trim().is_empty() {
                    return Err(ValidationError::empty_field("prompt"));
                }
            }
        }
        Ok(())
    }
}
