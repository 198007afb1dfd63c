//! Regex-based extraction.

use async_trait::async_trait;
use regex::Regex;

use super::cast::cast_text;
use super::{ExtractionContext, ExtractionError, FactExtractor};
use crate::domain::fact::Facts;
use crate::domain::strategy::{ValueConstraints, ValueType};

/// Extracts one fact from the first regex match.
///
/// Capture group 1 is the value when the pattern has one, otherwise the whole
/// match. Values that fail the cast or the bounds are discarded.
#[derive(Debug, Clone)]
pub struct PatternExtractor {
    entity: String,
    regex: Regex,
    value_type: ValueType,
    constraints: ValueConstraints,
}

impl PatternExtractor {
    /// Compiles the pattern.
    ///
    /// # Errors
    ///
    /// - `InvalidPattern` if the regex does not compile
    pub fn new(
        entity: impl Into<String>,
        pattern: &str,
        value_type: ValueType,
        constraints: ValueConstraints,
    ) -> Result<Self, ExtractionError> {
        let entity = entity.into();
        let regex = Regex::new(pattern).map_err(|e| ExtractionError::InvalidPattern {
            entity: entity.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            entity,
            regex,
            value_type,
            constraints,
        })
    }

    fn capture<'a>(&self, utterance: &'a str) -> Option<&'a str> {
        let captures = self.regex.captures(utterance)?;
        captures.get(1).or_else(|| captures.get(0)).map(|m| m.as_str())
    }
}

#[async_trait]
impl FactExtractor for PatternExtractor {
    fn name(&self) -> &str {
        "pattern"
    }

    async fn extract(&self, utterance: &str, _context: &ExtractionContext) -> Result<Facts, ExtractionError> {
        let mut facts = Facts::new();
        let Some(raw) = self.capture(utterance) else {
            return Ok(facts);
        };
        match cast_text(raw, self.value_type) {
            Some(value) if self.constraints.allows_value(&value) => {
                facts.insert(self.entity.clone(), value);
            }
            Some(value) => {
                tracing::debug!(entity = %self.entity, value = %value, "Pattern value outside bounds, discarded");
            }
            None => {
                tracing::debug!(entity = %self.entity, raw, "Pattern value failed type cast, discarded");
            }
        }
        Ok(facts)
    }
}
