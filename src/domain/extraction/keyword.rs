//! Keyword-based extraction.

use async_trait::async_trait;
use regex::Regex;

use super::{ExtractionContext, ExtractionError, FactExtractor};
use crate::domain::fact::{FactValue, Facts};

/// Marks a fact present when any keyword appears as a whole phrase.
///
/// Matching is case-insensitive and respects word boundaries, so "arm" does
/// not match "pharmacy". Produces `Text(value)` for categorical rules and
/// `Boolean(true)` otherwise.
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    entity: String,
    matcher: Option<Regex>,
    value: Option<String>,
}

impl KeywordExtractor {
    /// Builds the matcher from the keyword list.
    ///
    /// # Errors
    ///
    /// - `InvalidPattern` if the combined matcher cannot be built
    pub fn new(entity: impl Into<String>, keywords: &[String], value: Option<String>) -> Result<Self, ExtractionError> {
        let entity = entity.into();
        let alternatives: Vec<String> = keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(|k| regex::escape(k).replace(' ', r"\s+"))
            .collect();

        let matcher = if alternatives.is_empty() {
            None
        } else {
            let pattern = format!(r"(?i)\b(?:{})\b", alternatives.join("|"));
            Some(Regex::new(&pattern).map_err(|e| ExtractionError::InvalidPattern {
                entity: entity.clone(),
                reason: e.to_string(),
            })?)
        };

        Ok(Self { entity, matcher, value })
    }
}

#[async_trait]
impl FactExtractor for KeywordExtractor {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn extract(&self, utterance: &str, _context: &ExtractionContext) -> Result<Facts, ExtractionError> {
        let mut facts = Facts::new();
        if self.matcher.as_ref().is_some_and(|m| m.is_match(utterance)) {
            let value = match &self.value {
                Some(v) => FactValue::Text(v.clone()),
                None => FactValue::Boolean(true),
            };
            facts.insert(self.entity.clone(), value);
        }
        Ok(facts)
    }
}
