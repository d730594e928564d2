//! Convenience entry points over an explicit `Supervisor`

use crate::routing::{AgentDomain, RouteRequest, RouteResponse, Supervisor};

/// Routes a single query with the configured weights
pub async fn route<A: AgentDomain>(supervisor: &Supervisor<A>, query: impl Into<String>) -> RouteResponse<A> {
    supervisor.route(RouteRequest::new(query)).await
}

/// Batch processing utilities
pub mod batch {
    use super::*;
    use futures::stream::{self, StreamExt};

    /// Routes `queries` with at most `concurrency` in flight. Results come
    /// back in completion order, each paired with its input index.
    pub async fn route_queries<A: AgentDomain>(
        supervisor: &Supervisor<A>,
        queries: Vec<String>,
        concurrency: usize,
        offline: bool,
    ) -> Vec<(usize, RouteResponse<A>)> {
        stream::iter(queries.into_iter().enumerate())
            .map(|(index, query)| async move {
                let request = RouteRequest {
                    query,
                    offline,
                    ..RouteRequest::default()
                };
                (index, supervisor.route(request).await)
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await
    }
}
