//! Agent Domain Contract
//!
//! One routing engine serves every domain. A domain is a closed enum of
//! agents that carries its own keyword tables, descriptions, presets and
//! canned responder; the engine never sees free-text agent names.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;
use std::hash::Hash;

/// Keyword rule of the cold-start distribution source.
/// The first rule with any keyword contained in the query wins.
#[derive(Debug)]
pub struct PatternRule<A: 'static> {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    /// Unnormalized preset; agents left out get weight 0
    pub weights: &'static [(A, f64)],
}

/// Named weight multipliers selectable from config or the command line.
/// Agents left out keep 1.0.
#[derive(Debug)]
pub struct WeightPreset<A: 'static> {
    pub name: &'static str,
    pub weights: &'static [(A, f64)],
}

/// Preset name meaning "every agent at 1.0"
pub const DEFAULT_PRESET: &str = "default";

/// Canned payload produced by a downstream responder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentReply {
    pub agent: String,
    pub answer: String,
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub details: Value,
}

pub trait AgentDomain: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Short domain name used in logs and config
    const NAME: &'static str;
    /// Role line opening the supervisor prompt
    const TITLE: &'static str;
    /// Every agent, in enumeration order
    const ALL: &'static [Self];
    const PATTERN_RULES: &'static [PatternRule<Self>];
    /// Named presets besides `default`
    const WEIGHT_PRESETS: &'static [WeightPreset<Self>];
    /// Inclusive range of the simulated sample size
    const SAMPLE_RANGE: (u64, u64);

    /// Canonical id, the only spelling accepted from structured output
    fn id(self) -> &'static str;
    /// ASCII alias for configuration keys and CLI flags
    fn slug(self) -> &'static str;
    fn icon(self) -> &'static str;
    fn description(self) -> &'static str;
    /// Last-resort keywords for free-text extraction
    fn decision_keywords(self) -> &'static [&'static str];
    fn respond(self, query: &str) -> AgentReply;

    fn fallback() -> Self {
        Self::ALL[0]
    }

    /// Exact id match only
    fn from_id(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|agent| agent.id() == value)
    }

    fn preset(name: &str) -> Option<&'static WeightPreset<Self>> {
        let name = name.trim();
        Self::WEIGHT_PRESETS
            .iter()
            .find(|preset| preset.name.eq_ignore_ascii_case(name))
    }

    /// Id, or slug case-insensitively
    fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::from_id(value).or_else(|| {
            Self::ALL
                .iter()
                .copied()
                .find(|agent| agent.slug().eq_ignore_ascii_case(value))
        })
    }
}

/// Serde adapter storing an agent as its canonical id
pub mod agent_id {
    use super::AgentDomain;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<A: AgentDomain, S: Serializer>(agent: &A, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(agent.id())
    }

    pub fn deserialize<'de, A: AgentDomain, D: Deserializer<'de>>(deserializer: D) -> Result<A, D::Error> {
        let raw = String::deserialize(deserializer)?;
        A::from_id(&raw).ok_or_else(|| {
            D::Error::custom(format!("'{}' is not an agent of the {} domain", raw, A::NAME))
        })
    }
}
