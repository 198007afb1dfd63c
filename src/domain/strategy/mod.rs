//! Strategy module - declarative assessment workflows.
//!
//! A strategy bundles the extraction rules, assessment criteria and
//! knowledge sources for one kind of intake conversation.

mod criteria;
mod extraction_rule;
mod definition;

pub use criteria::{AssessmentCriteria, ComparisonOp, CriteriaGroup, Criterion, Evaluator};
pub use extraction_rule::{
    ExtractionMethod, ExtractionRule, TriggerCondition, ValueConstraints, ValueType, DEFAULT_RULE_PRIORITY,
};
pub use definition::{Strategy, StrategySnapshot, DEFAULT_MAX_TURNS};
