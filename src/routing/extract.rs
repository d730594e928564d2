//! Decision Extractor - model output to exactly one agent
//!
//! Free-text stages, first success wins:
//! 1. `선택된 에이전트: <id>` label whose token is exactly an agent id
//! 2. verbatim agent id anywhere in the text, first in enumeration order
//! 3. per-agent decision keywords, first in enumeration order
//! 4. policy: fail (`Strict`) or the domain's first agent (`DefaultAgent`)
//!
//! Ties in stages 2 and 3 are broken by enumeration order, not relevance.
//! Structured output is validated against the same closed set.

use super::domain::AgentDomain;
use super::prompt::{CONFIDENCE_LABEL, REASON_LABEL, SELECTION_LABEL};
use crate::config::ExtractionPolicy;
use crate::error::RouterError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

static LABEL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"선택된\s*에이전트\s*:\s*(\w+)").expect("label pattern is valid")
});

static REASON_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"이유\s*:\s*(.+)").expect("reason pattern is valid"));

static CONFIDENCE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"확신도\s*:\s*([0-9]*\.?[0-9]+)").expect("confidence pattern is valid")
});

/// Which stage produced the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionMethod {
    Label,
    AgentName,
    Keyword,
    Default,
    Structured,
    Sampled,
}

impl DecisionMethod {
    /// Confidence assumed when the model states none
    fn default_confidence(self) -> f64 {
        match self {
            DecisionMethod::Label | DecisionMethod::Structured => 0.9,
            DecisionMethod::AgentName => 0.7,
            DecisionMethod::Keyword => 0.6,
            DecisionMethod::Default | DecisionMethod::Sampled => 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extracted<A: AgentDomain> {
    pub agent: A,
    pub method: DecisionMethod,
    pub confidence: f64,
    pub reason: String,
}

/// Free-text extraction
pub fn extract_agent<A: AgentDomain>(raw: &str, policy: ExtractionPolicy) -> Result<Extracted<A>, RouterError> {
    let (agent, method) = match identify::<A>(raw) {
        Some(found) => found,
        None => match policy {
            ExtractionPolicy::Strict => {
                tracing::debug!("[Extractor] No agent identified, strict policy");
                return Err(RouterError::Extraction);
            }
            ExtractionPolicy::DefaultAgent => {
                tracing::debug!("[Extractor] No agent identified, defaulting to {}", A::fallback().id());
                (A::fallback(), DecisionMethod::Default)
            }
        },
    };

    let confidence = CONFIDENCE_PATTERN
        .captures(raw)
        .and_then(|c| c[1].parse::<f64>().ok())
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or_else(|| method.default_confidence());

    let reason = REASON_PATTERN
        .captures(raw)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_else(|| summarize(raw));

    Ok(Extracted {
        agent,
        method,
        confidence,
        reason,
    })
}

fn identify<A: AgentDomain>(raw: &str) -> Option<(A, DecisionMethod)> {
    if let Some(captures) = LABEL_PATTERN.captures(raw) {
        let token = captures[1].trim();
        match A::from_id(token) {
            Some(agent) => return Some((agent, DecisionMethod::Label)),
            None => tracing::debug!("[Extractor] Label token '{}' is not an agent id", token),
        }
    }

    let lowered = raw.to_lowercase();

    let named = A::ALL.iter().copied().find(|agent| {
        let id = agent.id().to_lowercase();
        lowered.contains(&id) || lowered.contains(&id.replace('_', " "))
    });
    if let Some(agent) = named {
        return Some((agent, DecisionMethod::AgentName));
    }

    A::ALL
        .iter()
        .copied()
        .find(|agent| {
            agent
                .decision_keywords()
                .iter()
                .any(|kw| lowered.contains(&kw.to_lowercase()))
        })
        .map(|agent| (agent, DecisionMethod::Keyword))
}

fn summarize(raw: &str) -> String {
    let line = raw
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with(SELECTION_LABEL) && !line.starts_with(CONFIDENCE_LABEL) && !line.starts_with(REASON_LABEL))
        .unwrap_or("");
    line.chars().take(200).collect()
}

/// Shape of a structured decision before validation
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DecisionRecord {
    pub selected_agent: String,
    pub reason: String,
    pub confidence: f64,
}

/// Validates a structured record against the closed agent set and [0, 1] confidence
pub fn validate_record<A: AgentDomain>(value: &Value) -> Result<Extracted<A>, RouterError> {
    let record: DecisionRecord = serde_json::from_value(value.clone())
        .map_err(|e| RouterError::schema("$", e.to_string()))?;

    let agent = A::from_id(record.selected_agent.trim()).ok_or_else(|| {
        RouterError::schema(
            "selected_agent",
            format!("'{}' is not an agent of the {} domain", record.selected_agent, A::NAME),
        )
    })?;

    if !record.confidence.is_finite() || !(0.0..=1.0).contains(&record.confidence) {
        return Err(RouterError::schema(
            "confidence",
            format!("{} is outside [0, 1]", record.confidence),
        ));
    }

    Ok(Extracted {
        agent,
        method: DecisionMethod::Structured,
        confidence: record.confidence,
        reason: record.reason,
    })
}
