//! Routing decision history: record type and read-only aggregations
//!
//! The log itself is owned by the history actor; everything here is a pure
//! function of a loaded slice of records.

use super::distribution::Distribution;
use super::domain::{agent_id, AgentDomain};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Query patterns listed by `statistics`, most frequent first
pub const TOP_QUERY_PATTERNS: usize = 10;

/// One realized supervisor decision. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "A: AgentDomain")]
pub struct RoutingDecision<A: AgentDomain> {
    /// Written as RFC 3339 in UTC. Reading also accepts an explicit offset,
    /// or a naive `YYYY-MM-DDTHH:MM:SS[.fff]` (space separator allowed)
    /// which is taken as UTC.
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
    pub user_query: String,
    #[serde(with = "agent_id")]
    pub selected_agent: A,
    pub confidence: f64,
    pub reason: String,
}

impl<A: AgentDomain> RoutingDecision<A> {
    pub fn new(user_query: impl Into<String>, selected_agent: A, confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            user_query: user_query.into(),
            selected_agent,
            confidence: confidence.clamp(0.0, 1.0),
            reason: reason.into(),
        }
    }
}

mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .map(|dt| dt.and_utc())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("'{}' is not an ISO-8601 timestamp", raw)))
    }
}

/// Per-agent frequency over the whole log
#[derive(Debug, Clone, PartialEq)]
pub struct EmpiricalDistribution<A: AgentDomain> {
    pub counts: Vec<(A, usize)>,
    pub distribution: Distribution<A>,
    pub sample_size: usize,
}

impl<A: AgentDomain> EmpiricalDistribution<A> {
    pub fn empty() -> Self {
        empirical_distribution::<A>(&[])
    }

    pub fn count(&self, agent: A) -> usize {
        self.counts
            .iter()
            .find(|(a, _)| *a == agent)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    }
}

/// Counts each agent over `records`. With no records the distribution is
/// all zeros and `sample_size` is 0.
pub fn empirical_distribution<A: AgentDomain>(records: &[RoutingDecision<A>]) -> EmpiricalDistribution<A> {
    let counts: Vec<(A, usize)> = A::ALL
        .iter()
        .map(|agent| {
            let count = records.iter().filter(|r| r.selected_agent == *agent).count();
            (*agent, count)
        })
        .collect();

    let sample_size = records.len();
    let distribution = if sample_size == 0 {
        Distribution::zeros()
    } else {
        Distribution::from_pairs(
            counts
                .iter()
                .map(|(agent, count)| (*agent, *count as f64 / sample_size as f64)),
        )
    };

    EmpiricalDistribution {
        counts,
        distribution,
        sample_size,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound = "A: AgentDomain")]
pub struct AgentStatistics<A: AgentDomain> {
    #[serde(with = "agent_id")]
    pub agent: A,
    pub count: usize,
    pub percentage: f64,
    /// None when the agent was never selected
    pub mean_confidence: Option<f64>,
    /// Count minus the uniform expectation
    pub deviation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound = "A: AgentDomain")]
pub struct QueryAgentShare<A: AgentDomain> {
    #[serde(with = "agent_id")]
    pub agent: A,
    pub count: usize,
    /// Share of this query's decisions
    pub percentage: f64,
}

/// How consistently one repeated query was routed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound = "A: AgentDomain")]
pub struct QueryPattern<A: AgentDomain> {
    pub query: String,
    pub total: usize,
    /// Agents that received this query, most frequent first
    pub agents: Vec<QueryAgentShare<A>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound = "A: AgentDomain")]
pub struct HistoryStatistics<A: AgentDomain> {
    pub total: usize,
    pub expected_per_agent: f64,
    pub agents: Vec<AgentStatistics<A>>,
    pub first_timestamp: Option<DateTime<Utc>>,
    pub last_timestamp: Option<DateTime<Utc>>,
    pub unique_queries: usize,
    pub query_patterns: Vec<QueryPattern<A>>,
}

pub fn statistics<A: AgentDomain>(records: &[RoutingDecision<A>]) -> HistoryStatistics<A> {
    let total = records.len();
    let expected_per_agent = total as f64 / A::ALL.len() as f64;

    let agents = A::ALL
        .iter()
        .map(|agent| {
            let selected: Vec<f64> = records
                .iter()
                .filter(|r| r.selected_agent == *agent)
                .map(|r| r.confidence)
                .collect();
            let count = selected.len();

            AgentStatistics {
                agent: *agent,
                count,
                percentage: if total == 0 { 0.0 } else { count as f64 * 100.0 / total as f64 },
                mean_confidence: if count == 0 {
                    None
                } else {
                    Some(selected.iter().sum::<f64>() / count as f64)
                },
                deviation: count as f64 - expected_per_agent,
            }
        })
        .collect();

    let (unique_queries, query_patterns) = query_patterns(records, TOP_QUERY_PATTERNS);

    HistoryStatistics {
        total,
        expected_per_agent,
        agents,
        first_timestamp: records.first().map(|r| r.timestamp),
        last_timestamp: records.last().map(|r| r.timestamp),
        unique_queries,
        query_patterns,
    }
}

/// Groups records by exact query text. Returns the number of distinct
/// queries and the `limit` most frequent ones; ties keep first-seen order.
pub fn query_patterns<A: AgentDomain>(records: &[RoutingDecision<A>], limit: usize) -> (usize, Vec<QueryPattern<A>>) {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<A>)> = Vec::new();

    for record in records {
        let slot = *index.entry(record.user_query.as_str()).or_insert_with(|| {
            groups.push((record.user_query.as_str(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(record.selected_agent);
    }

    let unique = groups.len();
    groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    let patterns = groups
        .into_iter()
        .take(limit)
        .map(|(query, selected)| {
            let total = selected.len();
            let mut agents: Vec<QueryAgentShare<A>> = A::ALL
                .iter()
                .map(|agent| (*agent, selected.iter().filter(|a| *a == agent).count()))
                .filter(|(_, count)| *count > 0)
                .map(|(agent, count)| QueryAgentShare {
                    agent,
                    count,
                    percentage: count as f64 * 100.0 / total as f64,
                })
                .collect();
            agents.sort_by(|a, b| b.count.cmp(&a.count));

            QueryPattern {
                query: query.to_string(),
                total,
                agents,
            }
        })
        .collect();

    (unique, patterns)
}

/// Drops the oldest records so at most `max_records` remain
pub fn retain_most_recent<A: AgentDomain>(records: &mut Vec<RoutingDecision<A>>, max_records: usize) {
    if records.len() > max_records {
        let excess = records.len() - max_records;
        records.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::FoodAgent::{self, *};

    fn decision(agent: FoodAgent, confidence: f64) -> RoutingDecision<FoodAgent> {
        RoutingDecision::new("질문", agent, confidence, "테스트")
    }

    #[test]
    fn test_empirical_frequencies() {
        let records = vec![
            decision(HealthConsulting, 0.9),
            decision(HealthConsulting, 0.8),
            decision(Restaurant, 0.7),
            decision(HealthConsulting, 0.6),
        ];

        let empirical = empirical_distribution(&records);
        assert_eq!(empirical.sample_size, 4);
        assert_eq!(empirical.count(HealthConsulting), 3);
        assert_eq!(empirical.distribution.get(HealthConsulting), 0.75);
        assert_eq!(empirical.distribution.get(Refrigerator), 0.0);
        assert_eq!(empirical.counts.iter().map(|(_, c)| c).sum::<usize>(), 4);
    }

    #[test]
    fn test_empirical_of_empty_log() {
        let empirical = EmpiricalDistribution::<FoodAgent>::empty();
        assert_eq!(empirical.sample_size, 0);
        assert_eq!(empirical.distribution.total(), 0.0);
        assert_eq!(empirical.counts.len(), 4);
    }

    #[test]
    fn test_statistics_mean_confidence() {
        let records = vec![
            decision(RecipeSearch, 0.5),
            decision(RecipeSearch, 1.0),
            decision(Restaurant, 0.2),
            decision(Restaurant, 0.4),
        ];

        let stats = statistics(&records);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.expected_per_agent, 1.0);

        let recipe = stats.agents.iter().find(|s| s.agent == RecipeSearch).unwrap();
        assert_eq!(recipe.count, 2);
        assert_eq!(recipe.percentage, 50.0);
        assert_eq!(recipe.mean_confidence, Some(0.75));
        assert_eq!(recipe.deviation, 1.0);

        let fridge = stats.agents.iter().find(|s| s.agent == Refrigerator).unwrap();
        assert_eq!(fridge.mean_confidence, None);
        assert_eq!(fridge.deviation, -1.0);
    }

    #[test]
    fn test_retain_most_recent_keeps_tail_in_order() {
        let mut records: Vec<_> = (0..1005)
            .map(|i| RoutingDecision::new(format!("q{}", i), Restaurant, 0.5, ""))
            .collect();

        retain_most_recent(&mut records, 1000);
        assert_eq!(records.len(), 1000);
        assert_eq!(records[0].user_query, "q5");
        assert_eq!(records[999].user_query, "q1004");
    }

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(decision(Restaurant, 1.7).confidence, 1.0);
        assert_eq!(decision(Restaurant, -0.2).confidence, 0.0);
    }

    #[test]
    fn test_query_patterns_rank_by_frequency() {
        let mut records = vec![
            RoutingDecision::new("맛집", Restaurant, 0.9, ""),
            RoutingDecision::new("다이어트", HealthConsulting, 0.9, ""),
            RoutingDecision::new("다이어트", HealthConsulting, 0.8, ""),
            RoutingDecision::new("다이어트", RecipeSearch, 0.7, ""),
            RoutingDecision::new("다이어트", HealthConsulting, 0.6, ""),
            RoutingDecision::new("요리", RecipeSearch, 0.5, ""),
        ];
        records.extend((0..12).map(|i| RoutingDecision::new(format!("q{}", i), Refrigerator, 0.5, "")));

        let stats = statistics(&records);
        assert_eq!(stats.unique_queries, 15);
        assert_eq!(stats.query_patterns.len(), TOP_QUERY_PATTERNS);

        let diet = &stats.query_patterns[0];
        assert_eq!(diet.query, "다이어트");
        assert_eq!(diet.total, 4);
        assert_eq!(diet.agents.len(), 2);
        assert_eq!(diet.agents[0].agent, HealthConsulting);
        assert_eq!(diet.agents[0].count, 3);
        assert_eq!(diet.agents[0].percentage, 75.0);
        assert_eq!(diet.agents[1].agent, RecipeSearch);
        assert_eq!(diet.agents[1].percentage, 25.0);

        // Single-occurrence queries follow in first-seen order
        assert_eq!(stats.query_patterns[1].query, "맛집");
        assert_eq!(stats.query_patterns[2].query, "요리");
    }

    #[test]
    fn test_query_patterns_of_empty_log() {
        let (unique, patterns) = query_patterns::<FoodAgent>(&[], TOP_QUERY_PATTERNS);
        assert_eq!(unique, 0);
        assert!(patterns.is_empty());
    }

    #[test]
    fn test_naive_timestamp_is_read_as_utc() {
        let raw = r#"[
            {"timestamp": "2024-05-01T09:30:00.123456", "user_query": "a", "selected_agent": "음식점_추천_에이전트", "confidence": 0.8, "reason": ""},
            {"timestamp": "2024-05-01 09:30:00", "user_query": "b", "selected_agent": "음식점_추천_에이전트", "confidence": 0.8, "reason": ""},
            {"timestamp": "2024-05-01T18:30:00+09:00", "user_query": "c", "selected_agent": "음식점_추천_에이전트", "confidence": 0.8, "reason": ""},
            {"timestamp": "2024-05-01T09:30:00Z", "user_query": "d", "selected_agent": "음식점_추천_에이전트", "confidence": 0.8, "reason": ""}
        ]"#;
        let records: Vec<RoutingDecision<FoodAgent>> = serde_json::from_str(raw).unwrap();

        let expected = "2024-05-01T09:30:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(records[0].timestamp.timestamp(), expected.timestamp());
        assert_eq!(records[0].timestamp.timestamp_subsec_micros(), 123_456);
        assert_eq!(records[1].timestamp, expected);
        assert_eq!(records[2].timestamp, expected);
        assert_eq!(records[3].timestamp, expected);
    }

    #[test]
    fn test_unparseable_timestamp_is_rejected() {
        let raw = r#"{"timestamp": "yesterday", "user_query": "a", "selected_agent": "음식점_추천_에이전트", "confidence": 0.8, "reason": ""}"#;
        assert!(serde_json::from_str::<RoutingDecision<FoodAgent>>(raw).is_err());
    }

    #[test]
    fn test_record_field_names() {
        let json = serde_json::to_value(decision(HealthConsulting, 0.9)).unwrap();
        assert_eq!(json["selected_agent"], "건강식_컨설팅_에이전트");
        assert_eq!(json["user_query"], "질문");
        assert_eq!(json["reason"], "테스트");
        assert!(json["timestamp"].is_string());
    }
}
