//! Strategy repository port.
//!
//! Strategies are authored elsewhere; the engine only reads them.

use crate::domain::foundation::{DomainError, StrategyId};
use crate::domain::strategy::Strategy;
use async_trait::async_trait;

#[async_trait]
pub trait StrategyRepository: Send + Sync {
    /// Find a strategy with its full rule and criteria set.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &StrategyId) -> Result<Option<Strategy>, DomainError>;

    /// All known strategy ids.
    async fn list_ids(&self) -> Result<Vec<StrategyId>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn StrategyRepository) {}
    }
}
