//! Turn-processing configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationConfig {
    /// Prior messages included in each completion request
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Accumulated facts needed before the assessment engine runs
    #[serde(default = "default_min_facts")]
    pub min_facts_for_assessment: usize,

    /// Subtracted from 1.0 when the reply comes from the fallback responder
    #[serde(default = "default_fallback_penalty")]
    pub fallback_confidence_penalty: f64,

    /// Idle time after which open sessions are ended by the sweep
    #[serde(default = "default_session_timeout_mins")]
    pub session_timeout_mins: u64,
}

impl ConversationConfig {
    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_mins * 60)
    }

    /// Confidence recorded on fallback replies.
    pub fn fallback_confidence(&self) -> f64 {
        1.0 - self.fallback_confidence_penalty
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.history_window == 0 {
            return Err(ValidationError::MustBePositive("history_window"));
        }
        if self.min_facts_for_assessment == 0 {
            return Err(ValidationError::MustBePositive("min_facts_for_assessment"));
        }
        // A zero penalty would make fallback replies indistinguishable.
        if !(self.fallback_confidence_penalty > 0.0 && self.fallback_confidence_penalty <= 1.0) {
            return Err(ValidationError::OutOfRange {
                field: "fallback_confidence_penalty",
                min: 0.0,
                max: 1.0,
            });
        }
        if self.session_timeout_mins == 0 {
            return Err(ValidationError::MustBePositive("session_timeout_mins"));
        }
        Ok(())
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            min_facts_for_assessment: default_min_facts(),
            fallback_confidence_penalty: default_fallback_penalty(),
            session_timeout_mins: default_session_timeout_mins(),
        }
    }
}

fn default_history_window() -> usize {
    10
}

fn default_min_facts() -> usize {
    3
}

fn default_fallback_penalty() -> f64 {
    0.5
}

fn default_session_timeout_mins() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_defaults() {
        let config = ConversationConfig::default();
        assert_eq!(config.history_window, 10);
        assert_eq!(config.min_facts_for_assessment, 3);
        assert_eq!(config.fallback_confidence(), 0.5);
        assert_eq!(config.session_timeout(), Duration::from_secs(1800));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_penalty_must_be_positive() {
        let config = ConversationConfig {
            fallback_confidence_penalty: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
