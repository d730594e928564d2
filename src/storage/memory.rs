//! In-memory routing history, for tests and `--offline` dry runs

use super::HistoryStore;
use crate::routing::{AgentDomain, RoutingDecision};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Data is lost when the process terminates
pub struct InMemoryHistory<A: AgentDomain> {
    records: Arc<RwLock<Vec<RoutingDecision<A>>>>,
}

impl<A: AgentDomain> InMemoryHistory<A> {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: Vec<RoutingDecision<A>>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }
}

impl<A: AgentDomain> Default for InMemoryHistory<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<A: AgentDomain> HistoryStore<A> for InMemoryHistory<A> {
    async fn load(&self) -> Result<Vec<RoutingDecision<A>>> {
        let records = self.records.read().await.clone();
        tracing::debug!("[InMemoryHistory] Loaded {} records", records.len());
        Ok(records)
    }

    async fn save(&self, records: &[RoutingDecision<A>]) -> Result<()> {
        *self.records.write().await = records.to_vec();
        tracing::debug!("[InMemoryHistory] Saved {} records", records.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::FoodAgent;

    #[tokio::test]
    async fn test_save_replaces_log() {
        let store = InMemoryHistory::<FoodAgent>::new();
        assert!(store.load().await.unwrap().is_empty());

        let first = vec![RoutingDecision::new("a", FoodAgent::Restaurant, 0.9, "")];
        store.save(&first).await.unwrap();
        let second = vec![
            RoutingDecision::new("b", FoodAgent::Refrigerator, 0.5, ""),
            RoutingDecision::new("c", FoodAgent::RecipeSearch, 0.5, ""),
        ];
        store.save(&second).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].user_query, "b");
    }
}
