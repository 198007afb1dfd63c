//! Strategy document location

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct StrategiesConfig {
    /// Directory holding one YAML file per strategy
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
}

impl StrategiesConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.directory.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("STRATEGIES__DIRECTORY"));
        }
        Ok(())
    }
}

impl Default for StrategiesConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
        }
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from("./strategies")
}
