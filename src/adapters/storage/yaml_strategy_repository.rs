//! File-backed strategy repository.
//!
//! Each strategy lives in `<dir>/<id>.yaml` (or `.yml`). Files are read on
//! every lookup so edits apply to sessions started afterwards; running
//! sessions keep their pinned snapshot.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::foundation::{DomainError, ErrorCode, StrategyId};
use crate::domain::strategy::Strategy;
use crate::ports::StrategyRepository;

const EXTENSIONS: [&str; 2] = ["yaml", "yml"];

#[derive(Debug, Clone)]
pub struct YamlStrategyRepository {
    base_path: PathBuf,
}

impl YamlStrategyRepository {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    async fn read_strategy(&self, path: &Path) -> Result<Strategy, DomainError> {
        let yaml = fs::read_to_string(path)
            .await
            .map_err(|e| DomainError::database(format!("Failed to read {}: {}", path.display(), e)))?;
        Strategy::from_yaml(&yaml).map_err(|e| e.with_detail("path", path.display().to_string()))
    }

    async fn strategy_files(&self) -> Result<Vec<PathBuf>, DomainError> {
        let mut entries = fs::read_dir(&self.base_path).await.map_err(|e| {
            DomainError::database(format!("Failed to list {}: {}", self.base_path.display(), e))
        })?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
        {
            let path = entry.path();
            let is_yaml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| EXTENSIONS.contains(&ext));
            if is_yaml {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl StrategyRepository for YamlStrategyRepository {
    async fn find_by_id(&self, id: &StrategyId) -> Result<Option<Strategy>, DomainError> {
        for ext in EXTENSIONS {
            let path = self.base_path.join(format!("{}.{}", id, ext));
            if !path.exists() {
                continue;
            }
            let strategy = self.read_strategy(&path).await?;
            if &strategy.id != id {
                return Err(DomainError::new(
                    ErrorCode::InvalidFormat,
                    format!("{} declares id '{}'", path.display(), strategy.id),
                ));
            }
            return Ok(Some(strategy));
        }
        Ok(None)
    }

    async fn list_ids(&self) -> Result<Vec<StrategyId>, DomainError> {
        let mut ids = Vec::new();
        for path in self.strategy_files().await? {
            match self.read_strategy(&path).await {
                Ok(strategy) => ids.push(strategy.id),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "Skipping unreadable strategy file");
                }
            }
        }
        Ok(ids)
    }
}
