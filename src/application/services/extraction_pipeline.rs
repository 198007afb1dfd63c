//! Extraction pipeline.
//!
//! Applies every triggered strategy rule to an utterance, merges the results
//! by priority, then lets the general extractors fill gaps. Never fails: each
//! rule's error is recorded as a diagnostic and the rule contributes nothing.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

use super::model_extractor::ModelExtractor;
use crate::domain::extraction::{
    ExtractionContext, ExtractionError, FactExtractor, GeneralExtractor, KeywordExtractor, PatternExtractor,
};
use crate::domain::fact::Facts;
use crate::domain::strategy::{ExtractionMethod, ExtractionRule};
use crate::ports::AIProvider;

/// What happened to one rule during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleStatus {
    Extracted,
    NoMatch,
    /// Produced a value, but a higher-priority rule already set the fact.
    Shadowed,
    NotTriggered,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleDiagnostic {
    pub entity: String,
    pub method: &'static str,
    pub status: RuleStatus,
}

/// Facts found in one utterance plus per-rule diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionOutcome {
    pub facts: Facts,
    pub diagnostics: Vec<RuleDiagnostic>,
}

impl ExtractionOutcome {
    pub fn failed_rules(&self) -> impl Iterator<Item = &RuleDiagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d.status, RuleStatus::Failed(_)))
    }
}

pub struct ExtractionPipeline {
    completion: Arc<dyn AIProvider>,
    extraction_timeout: Duration,
    general: GeneralExtractor,
}

impl ExtractionPipeline {
    pub fn new(completion: Arc<dyn AIProvider>, extraction_timeout: Duration) -> Self {
        Self {
            completion,
            extraction_timeout,
            general: GeneralExtractor::new(),
        }
    }

    /// Extracts facts from `utterance`.
    ///
    /// Triggers are evaluated against the facts known before this turn.
    /// Rules run concurrently but merge in ascending priority (stable for
    /// equal priorities), so the lowest priority number wins a collision.
    pub async fn extract(&self, utterance: &str, context: &ExtractionContext) -> ExtractionOutcome {
        let mut ordered: Vec<&ExtractionRule> = context.rules.iter().collect();
        ordered.sort_by_key(|rule| rule.priority);

        let (triggered, skipped): (Vec<&ExtractionRule>, Vec<&ExtractionRule>) =
            ordered.into_iter().partition(|rule| rule.is_triggered(&context.facts));

        let runs = triggered.iter().map(|rule| self.run_rule(rule, utterance, context));
        let results = join_all(runs).await;

        let mut outcome = ExtractionOutcome::default();
        for (rule, result) in triggered.iter().zip(results) {
            let status = match result {
                Ok(found) if found.is_empty() => RuleStatus::NoMatch,
                Ok(found) => {
                    let mut inserted = false;
                    for (name, value) in found.iter() {
                        inserted |= outcome.facts.insert_if_absent(name.clone(), value.clone());
                    }
                    if inserted {
                        RuleStatus::Extracted
                    } else {
                        RuleStatus::Shadowed
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        entity = %rule.entity,
                        method = rule.method.name(),
                        error = %err,
                        "Extraction rule failed, skipping"
                    );
                    RuleStatus::Failed(err.to_string())
                }
            };
            outcome.diagnostics.push(RuleDiagnostic {
                entity: rule.entity.clone(),
                method: rule.method.name(),
                status,
            });
        }

        for rule in skipped {
            outcome.diagnostics.push(RuleDiagnostic {
                entity: rule.entity.clone(),
                method: rule.method.name(),
                status: RuleStatus::NotTriggered,
            });
        }

        for (name, value) in self.general.extract_all(utterance).iter() {
            outcome.facts.insert_if_absent(name.clone(), value.clone());
        }

        tracing::debug!(
            rules = context.rules.len(),
            facts = outcome.facts.len(),
            "Extraction complete"
        );
        outcome
    }

    async fn run_rule(
        &self,
        rule: &ExtractionRule,
        utterance: &str,
        context: &ExtractionContext,
    ) -> Result<Facts, ExtractionError> {
        let extractor = self.extractor_for(rule)?;
        extractor.extract(utterance, context).await
    }

    fn extractor_for(&self, rule: &ExtractionRule) -> Result<Box<dyn FactExtractor>, ExtractionError> {
        Ok(match &rule.method {
            ExtractionMethod::Pattern { pattern, value_type } => Box::new(PatternExtractor::new(
                rule.entity.clone(),
                pattern,
                *value_type,
                rule.constraints,
            )?),
            ExtractionMethod::Keyword { keywords, value } => {
                Box::new(KeywordExtractor::new(rule.entity.clone(), keywords, value.clone())?)
            }
            ExtractionMethod::ModelHybrid { prompt, value_type } => Box::new(ModelExtractor::new(
                Arc::clone(&self.completion),
                rule.entity.clone(),
                prompt.clone(),
                *value_type,
                rule.constraints,
                self.extraction_timeout,
            )),
        })
    }
}
