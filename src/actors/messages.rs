use crate::error::RouterError;
use crate::routing::{AgentDomain, EmpiricalDistribution, HistoryStatistics, RoutingDecision};
use tokio::sync::oneshot;

pub type Reply<T> = oneshot::Sender<Result<T, RouterError>>;

/// Requests served by the history actor, one at a time
#[derive(Debug)]
pub enum HistoryMessage<A: AgentDomain> {
    /// Append, truncate to the retention cap, persist. Replies with the log length.
    Append {
        decision: RoutingDecision<A>,
        response: Reply<usize>,
    },
    Load {
        limit: Option<usize>,
        response: Reply<Vec<RoutingDecision<A>>>,
    },
    Empirical {
        response: Reply<EmpiricalDistribution<A>>,
    },
    Statistics {
        response: Reply<HistoryStatistics<A>>,
    },
    Shutdown {
        response: oneshot::Sender<()>,
    },
}
