//! Capability configuration: completion and embedding providers.

use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Which implementation backs the completion and embedding ports.
///
/// Chosen once at startup; business logic never branches on it.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityMode {
    #[default]
    Mock,
    OpenAI,
}

/// AI provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub mode: CapabilityMode,

    /// OpenAI API key, required in `openai` mode
    pub openai_api_key: Option<Secret<String>>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_completion_model")]
    pub completion_model: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,

    /// Deadline for the reply completion
    #[serde(default = "default_completion_timeout_ms")]
    pub completion_timeout_ms: u64,

    /// Deadline for each model-assisted extraction rule
    #[serde(default = "default_extraction_timeout_ms")]
    pub extraction_timeout_ms: u64,

    /// Deadline for each embedding call
    #[serde(default = "default_embedding_timeout_ms")]
    pub embedding_timeout_ms: u64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum transport retries inside the OpenAI adapters
    #[serde(default = "default_retries")]
    pub max_retries: u32,
}

impl AiConfig {
    pub fn completion_timeout(&self) -> Duration {
        Duration::from_millis(self.completion_timeout_ms)
    }

    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_millis(self.extraction_timeout_ms)
    }

    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_millis(self.embedding_timeout_ms)
    }

    /// Check if OpenAI is configured
    pub fn has_openai(&self) -> bool {
        use secrecy::ExposeSecret;
        self.openai_api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().is_empty())
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.mode == CapabilityMode::OpenAI && !self.has_openai() {
            return Err(ValidationError::MissingRequired("OPENAI_API_KEY"));
        }
        if self.completion_timeout_ms == 0 {
            return Err(ValidationError::MustBePositive("completion_timeout_ms"));
        }
        if self.extraction_timeout_ms == 0 {
            return Err(ValidationError::MustBePositive("extraction_timeout_ms"));
        }
        if self.embedding_timeout_ms == 0 {
            return Err(ValidationError::MustBePositive("embedding_timeout_ms"));
        }
        if self.extraction_timeout_ms > self.completion_timeout_ms
            || self.embedding_timeout_ms > self.completion_timeout_ms
        {
            return Err(ValidationError::TimeoutOrdering);
        }
        if self.embedding_dimensions == 0 {
            return Err(ValidationError::MustBePositive("embedding_dimensions"));
        }
        if self.max_tokens == 0 {
            return Err(ValidationError::MustBePositive("max_tokens"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::OutOfRange {
                field: "temperature",
                min: 0.0,
                max: 2.0,
            });
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            mode: CapabilityMode::default(),
            openai_api_key: None,
            base_url: default_base_url(),
            completion_model: default_completion_model(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: default_embedding_dimensions(),
            completion_timeout_ms: default_completion_timeout_ms(),
            extraction_timeout_ms: default_extraction_timeout_ms(),
            embedding_timeout_ms: default_embedding_timeout_ms(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_retries: default_retries(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_completion_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_dimensions() -> usize {
    1536
}

fn default_completion_timeout_ms() -> u64 {
    30_000
}

fn default_extraction_timeout_ms() -> u64 {
    5_000
}

fn default_embedding_timeout_ms() -> u64 {
    5_000
}

fn default_max_tokens() -> u32 {
    500
}

fn default_temperature() -> f32 {
    0.7
}

fn default_retries() -> u32 {
    2
}
