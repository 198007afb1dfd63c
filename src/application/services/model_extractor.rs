//! Model-assisted extraction.
//!
//! Sends the rule prompt plus the utterance to the completion capability and
//! expects `{"value": ...}` back. Runs under its own timeout.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::extraction::{cast_json, extract_json_block, ExtractionContext, ExtractionError, FactExtractor};
use crate::domain::fact::Facts;
use crate::domain::strategy::{ValueConstraints, ValueType};
use crate::ports::{AIProvider, CompletionRequest, MessageRole, RequestMetadata, RequestPurpose};

const SYSTEM_PROMPT: &str = "You extract one fact from a patient's message. \
Respond with JSON only, in the form {\"value\": <value>}. \
Use null when the message does not state the fact.";

const EXTRACTION_MAX_TOKENS: u32 = 100;

pub struct ModelExtractor {
    completion: Arc<dyn AIProvider>,
    entity: String,
    prompt: String,
    value_type: ValueType,
    constraints: ValueConstraints,
    timeout: Duration,
}

impl ModelExtractor {
    pub fn new(
        completion: Arc<dyn AIProvider>,
        entity: impl Into<String>,
        prompt: impl Into<String>,
        value_type: ValueType,
        constraints: ValueConstraints,
        timeout: Duration,
    ) -> Self {
        Self {
            completion,
            entity: entity.into(),
            prompt: prompt.into(),
            value_type,
            constraints,
            timeout,
        }
    }

    fn request(&self, utterance: &str) -> CompletionRequest {
        let metadata = RequestMetadata {
            purpose: RequestPurpose::Extraction,
            ..Default::default()
        };
        CompletionRequest::new(metadata)
            .with_system_prompt(SYSTEM_PROMPT)
            .with_message(
                MessageRole::User,
                format!("{}\n\nPatient message: \"{}\"", self.prompt, utterance),
            )
            .with_max_tokens(EXTRACTION_MAX_TOKENS)
            .with_temperature(0.0)
    }

    fn parse(&self, content: &str) -> Result<Facts, ExtractionError> {
        let block = extract_json_block(content)
            .ok_or_else(|| ExtractionError::Malformed("no JSON object in response".to_string()))?;
        let parsed: serde_json::Value =
            serde_json::from_str(block).map_err(|e| ExtractionError::Malformed(e.to_string()))?;
        let raw = parsed
            .get("value")
            .ok_or_else(|| ExtractionError::Malformed("missing \"value\" key".to_string()))?;

        let mut facts = Facts::new();
        if raw.is_null() {
            return Ok(facts);
        }
        let value = cast_json(raw, self.value_type).ok_or_else(|| ExtractionError::TypeMismatch {
            expected: format!("{:?}", self.value_type).to_lowercase(),
            found: json_kind(raw).to_string(),
        })?;
        if self.constraints.allows_value(&value) {
            facts.insert(self.entity.clone(), value);
        } else {
            tracing::debug!(entity = %self.entity, value = %value, "Model value outside bounds, discarded");
        }
        Ok(facts)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[async_trait]
impl FactExtractor for ModelExtractor {
    fn name(&self) -> &str {
        "model_hybrid"
    }

    async fn extract(&self, utterance: &str, _context: &ExtractionContext) -> Result<Facts, ExtractionError> {
        let call = self.completion.complete(self.request(utterance));
        let response = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| ExtractionError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            })?
            .map_err(|e| ExtractionError::Capability(e.to_string()))?;
        self.parse(&response.content)
    }
}
