//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `CARE_INTAKE` prefix and nested values use double underscores as separators.
//!
//! Every section has defaults, so an empty environment yields a working
//! mock-mode configuration. Components receive their section at construction.
//!
//! # Example
//!
//! ```no_run
//! use care_intake::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod ai;
mod assessment;
mod conversation;
mod error;
mod logging;
mod retrieval;
mod strategies;

pub use ai::{AiConfig, CapabilityMode};
pub use assessment::AssessmentConfig;
pub use conversation::ConversationConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;
pub use retrieval::RetrievalConfig;
pub use strategies::StrategiesConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Completion and embedding providers
    #[serde(default)]
    pub ai: AiConfig,

    /// Turn processing (history window, assessment trigger, fallback, idle timeout)
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Chunking, retrieval and indexing workers
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Tier thresholds
    #[serde(default)]
    pub assessment: AssessmentConfig,

    #[serde(default)]
    pub strategies: StrategiesConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `CARE_INTAKE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `CARE_INTAKE__AI__MODE=openai` -> `ai.mode = openai`
    /// - `CARE_INTAKE__RETRIEVAL__TOP_K=3` -> `retrieval.top_k = 3`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CARE_INTAKE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first section that fails.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ai.validate()?;
        self.conversation.validate()?;
        self.retrieval.validate()?;
        self.assessment.validate()?;
        self.strategies.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 5] = [
        "CARE_INTAKE__AI__MODE",
        "CARE_INTAKE__AI__OPENAI_API_KEY",
        "CARE_INTAKE__RETRIEVAL__TOP_K",
        "CARE_INTAKE__CONVERSATION__MIN_FACTS_FOR_ASSESSMENT",
        "CARE_INTAKE__ASSESSMENT__HIGH_PRIORITY_THRESHOLD",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_with_empty_environment_uses_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().unwrap();

        assert_eq!(config.ai.mode, CapabilityMode::Mock);
        assert_eq!(config.retrieval.top_k, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_nested_values() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("CARE_INTAKE__RETRIEVAL__TOP_K", "3");
        env::set_var("CARE_INTAKE__CONVERSATION__MIN_FACTS_FOR_ASSESSMENT", "1");
        env::set_var("CARE_INTAKE__ASSESSMENT__HIGH_PRIORITY_THRESHOLD", "90");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.conversation.min_facts_for_assessment, 1);
        assert_eq!(config.assessment.thresholds().high, 90.0);
    }

    #[test]
    fn test_openai_mode_without_key_fails_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("CARE_INTAKE__AI__MODE", "openai");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.ai.mode, CapabilityMode::OpenAI);
        assert!(config.validate().is_err());
    }
}
