//! Fact extraction primitives.
//!
//! Every extraction method implements [`FactExtractor`]. The pipeline in the
//! application layer picks one implementation per rule from the rule's
//! closed [`ExtractionMethod`](crate::domain::strategy::ExtractionMethod)
//! and merges the results by priority.

mod cast;
mod errors;
pub mod general;
mod json;
mod keyword;
mod pattern;

use async_trait::async_trait;

use crate::domain::fact::Facts;
use crate::domain::strategy::ExtractionRule;

pub use cast::{cast_json, cast_text};
pub use errors::ExtractionError;
pub use general::GeneralExtractor;
pub use json::extract_json_block;
pub use keyword::KeywordExtractor;
pub use pattern::PatternExtractor;

/// Inputs shared by every extractor for one utterance.
#[derive(Debug, Clone, Default)]
pub struct ExtractionContext {
    /// Facts known before this turn.
    pub facts: Facts,
    /// Rules from the session's strategy snapshot.
    pub rules: Vec<ExtractionRule>,
}

impl ExtractionContext {
    pub fn new(facts: Facts, rules: Vec<ExtractionRule>) -> Self {
        Self { facts, rules }
    }
}

/// One extraction method.
#[async_trait]
pub trait FactExtractor: Send + Sync {
    /// Method name for logs.
    fn name(&self) -> &str;

    /// Extracts facts from one utterance.
    ///
    /// An empty map means nothing was found. Errors are reported to the
    /// caller, which decides whether to degrade.
    async fn extract(&self, utterance: &str, context: &ExtractionContext) -> Result<Facts, ExtractionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fact_extractor_is_object_safe() {
        fn _accepts_dyn(_extractor: &dyn FactExtractor) {}
        _accepts_dyn(&GeneralExtractor::new());
    }
}
