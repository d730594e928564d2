//! Routing History Storage Abstraction
//!
//! Information Hiding:
//! - Storage backend hidden behind trait
//! - Record encoding and on-disk layout are backend concerns
//! - Retention and ordering are decided by the history actor, not the store

use crate::routing::{AgentDomain, RoutingDecision};
use anyhow::Result;
use async_trait::async_trait;

pub mod filesystem;
pub mod memory;

pub use filesystem::JsonFileHistory;
pub use memory::InMemoryHistory;

/// Whole-log load and replace. Records are kept oldest first.
#[async_trait]
pub trait HistoryStore<A: AgentDomain>: Send + Sync {
    /// Returns an empty log when nothing has been persisted yet
    async fn load(&self) -> Result<Vec<RoutingDecision<A>>>;

    /// Replaces the persisted log with `records`
    async fn save(&self, records: &[RoutingDecision<A>]) -> Result<()>;
}
