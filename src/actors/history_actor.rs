//! History Actor
//!
//! Information Hiding:
//! - The routing log is owned by a single task; callers only hold a handle
//! - Append, truncation and persistence happen as one unit per message
//! - Storage backend is injected as a `HistoryStore`
//!
//! Serializing every request through one mailbox is what keeps concurrent
//! routes from losing each other's appends.

use crate::actors::messages::{HistoryMessage, Reply};
use crate::config::HistoryConfig;
use crate::error::RouterError;
use crate::routing::{empirical_distribution, retain_most_recent, statistics, AgentDomain, EmpiricalDistribution, HistoryStatistics, RoutingDecision};
use crate::storage::HistoryStore;
use tokio::sync::mpsc::{channel, Receiver, Sender};
use tokio::sync::oneshot;

#[derive(Clone)]
pub struct HistoryActorHandle<A: AgentDomain> {
    sender: Sender<HistoryMessage<A>>,
}

impl<A: AgentDomain> HistoryActorHandle<A> {
    pub fn new(store: Box<dyn HistoryStore<A>>, config: &HistoryConfig) -> Self {
        let (sender, receiver) = channel(config.channel_buffer_size.max(1));
        tokio::spawn(history_actor(receiver, store, config.max_records));
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> HistoryMessage<A>,
    ) -> Result<T, RouterError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|e| RouterError::Persistence(format!("history actor unavailable: {}", e)))?;
        rx.await
            .map_err(|_| RouterError::Persistence("history actor dropped the request".to_string()))?
    }

    /// Appends one decision; returns the log length after truncation
    pub async fn append(&self, decision: RoutingDecision<A>) -> Result<usize, RouterError> {
        self.request(|response| HistoryMessage::Append { decision, response }).await
    }

    /// Most recent `limit` records, oldest first; everything when `None`
    pub async fn load(&self, limit: Option<usize>) -> Result<Vec<RoutingDecision<A>>, RouterError> {
        self.request(|response| HistoryMessage::Load { limit, response }).await
    }

    pub async fn empirical(&self) -> Result<EmpiricalDistribution<A>, RouterError> {
        self.request(|response| HistoryMessage::Empirical { response }).await
    }

    pub async fn statistics(&self) -> Result<HistoryStatistics<A>, RouterError> {
        self.request(|response| HistoryMessage::Statistics { response }).await
    }

    /// Waits until every message queued before this one has been handled
    pub async fn shutdown(&self) {
        let (tx, rx) = oneshot::channel();
        if self.sender.send(HistoryMessage::Shutdown { response: tx }).await.is_ok() {
            let _ = rx.await;
        }
    }
}

async fn history_actor<A: AgentDomain>(
    mut receiver: Receiver<HistoryMessage<A>>,
    store: Box<dyn HistoryStore<A>>,
    max_records: usize,
) {
    tracing::debug!("[HistoryActor] Started (max_records={})", max_records);

    while let Some(message) = receiver.recv().await {
        match message {
            HistoryMessage::Append { decision, response } => {
                let _ = response.send(append(store.as_ref(), decision, max_records).await);
            }
            HistoryMessage::Load { limit, response } => {
                let result = load(store.as_ref()).await.map(|mut records| {
                    if let Some(limit) = limit {
                        retain_most_recent(&mut records, limit);
                    }
                    records
                });
                let _ = response.send(result);
            }
            HistoryMessage::Empirical { response } => {
                let result = load(store.as_ref()).await.map(|records| empirical_distribution(&records));
                let _ = response.send(result);
            }
            HistoryMessage::Statistics { response } => {
                let result = load(store.as_ref()).await.map(|records| statistics(&records));
                let _ = response.send(result);
            }
            HistoryMessage::Shutdown { response } => {
                tracing::debug!("[HistoryActor] Shutdown requested");
                let _ = response.send(());
                break;
            }
        }
    }

    tracing::debug!("[HistoryActor] Stopped");
}

async fn load<A: AgentDomain>(store: &dyn HistoryStore<A>) -> Result<Vec<RoutingDecision<A>>, RouterError> {
    store.load().await.map_err(|e| {
        tracing::error!("[HistoryActor] Load failed: {:#}", e);
        RouterError::Persistence(format!("{:#}", e))
    })
}

async fn append<A: AgentDomain>(
    store: &dyn HistoryStore<A>,
    decision: RoutingDecision<A>,
    max_records: usize,
) -> Result<usize, RouterError> {
    let mut records = load(store).await?;
    records.push(decision);
    retain_most_recent(&mut records, max_records);

    store.save(&records).await.map_err(|e| {
        tracing::error!("[HistoryActor] Save failed: {:#}", e);
        RouterError::Persistence(format!("{:#}", e))
    })?;

    tracing::debug!("[HistoryActor] Log now holds {} records", records.len());
    Ok(records.len())
}
