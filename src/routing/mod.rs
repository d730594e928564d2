//! Weighted routing engine
//!
//! Pipeline per query: source → weights → prompt → model → extract → history.
//! Everything except the supervisor and the history actor is a pure function.

pub mod distribution;
pub mod domain;
pub mod extract;
pub mod history;
pub mod prompt;
pub mod source;
pub mod supervisor;
pub mod weights;

pub use distribution::{Distribution, EPSILON};
pub use domain::{agent_id, AgentDomain, AgentReply, PatternRule, WeightPreset, DEFAULT_PRESET};
pub use extract::{extract_agent, validate_record, DecisionMethod, DecisionRecord, Extracted};
pub use history::{
    empirical_distribution, query_patterns, retain_most_recent, statistics, AgentStatistics,
    EmpiricalDistribution, HistoryStatistics, QueryAgentShare, QueryPattern, RoutingDecision,
    TOP_QUERY_PATTERNS,
};
pub use prompt::{build_prompt, decision_schema};
pub use source::{keyword_pattern, BasePattern, DistributionSource, SourceMode};
pub use supervisor::{
    DecisionOutcome, RouteRequest, RouteResponse, RoutingMetadata, Supervisor, FALLBACK_CONFIDENCE,
    FALLBACK_REASON,
};
pub use weights::{apply_weights, weight_env_vars, WeightVector, WEIGHT_PREFIX};
