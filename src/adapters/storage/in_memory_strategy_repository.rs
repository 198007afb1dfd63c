//! In-memory strategy repository for tests and embedded use.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, StrategyId};
use crate::domain::strategy::Strategy;
use crate::ports::StrategyRepository;

#[derive(Debug, Clone, Default)]
pub struct InMemoryStrategyRepository {
    strategies: Arc<RwLock<HashMap<StrategyId, Strategy>>>,
}

impl InMemoryStrategyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a strategy.
    pub async fn insert(&self, strategy: Strategy) {
        self.strategies.write().await.insert(strategy.id.clone(), strategy);
    }
}

#[async_trait]
impl StrategyRepository for InMemoryStrategyRepository {
    async fn find_by_id(&self, id: &StrategyId) -> Result<Option<Strategy>, DomainError> {
        Ok(self.strategies.read().await.get(id).cloned())
    }

    async fn list_ids(&self) -> Result<Vec<StrategyId>, DomainError> {
        let mut ids: Vec<StrategyId> = self.strategies.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
