//! Per-agent weight multipliers
//!
//! Weights scale a base distribution before renormalization. They are
//! not probabilities: 1.0 leaves an agent untouched, 0.0 excludes it.

use super::distribution::Distribution;
use super::domain::{AgentDomain, DEFAULT_PRESET};
use crate::error::RouterError;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::ffi::OsString;

pub const WEIGHT_PREFIX: &str = "WEIGHT_";

#[derive(Debug, Clone, PartialEq)]
pub struct WeightVector<A: AgentDomain> {
    weights: Vec<(A, f64)>,
}

impl<A: AgentDomain> Default for WeightVector<A> {
    fn default() -> Self {
        Self {
            weights: A::ALL.iter().map(|agent| (*agent, 1.0)).collect(),
        }
    }
}

impl<A: AgentDomain> WeightVector<A> {
    pub fn get(&self, agent: A) -> f64 {
        self.weights
            .iter()
            .find(|(a, _)| *a == agent)
            .map(|(_, w)| *w)
            .unwrap_or(1.0)
    }

    pub fn set(&mut self, agent: A, weight: f64) -> Result<(), RouterError> {
        validate_weight(agent.id(), weight)?;
        if let Some(entry) = self.weights.iter_mut().find(|(a, _)| *a == agent) {
            entry.1 = weight;
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (A, f64)> + '_ {
        self.weights.iter().copied()
    }

    /// Named preset; `default` is every agent at 1.0
    pub fn preset(name: &str) -> Result<Self, RouterError> {
        if name.trim().eq_ignore_ascii_case(DEFAULT_PRESET) {
            return Ok(Self::default());
        }

        let preset = A::preset(name).ok_or_else(|| {
            let known: Vec<&str> = std::iter::once(DEFAULT_PRESET)
                .chain(A::WEIGHT_PRESETS.iter().map(|p| p.name))
                .collect();
            RouterError::Config(format!(
                "unknown weight preset '{}' for the {} domain (expected one of: {})",
                name.trim(),
                A::NAME,
                known.join(", ")
            ))
        })?;

        let mut weights = Self::default();
        for (agent, weight) in preset.weights {
            weights.set(*agent, *weight)?;
        }
        Ok(weights)
    }

    /// Reads `WEIGHT_<agent-id>` or `WEIGHT_<SLUG>` keys over these weights.
    /// Entries that do not parse or are negative keep the current value.
    pub fn with_env_vars<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(WEIGHT_PREFIX) else {
                continue;
            };
            let Some(agent) = A::parse(name) else {
                continue;
            };

            let current = self.get(agent);
            match parse_weight(agent.id(), &value).and_then(|w| self.set(agent, w)) {
                Ok(()) => tracing::debug!("[Weights] {} = {}", agent.id(), value.trim()),
                Err(e) => tracing::warn!("[Weights] Ignoring {}: {}, keeping {}", key, e, current),
            }
        }

        self
    }

    pub fn from_env_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self::default().with_env_vars(vars)
    }

    /// Applies request-time overrides on top of these weights.
    /// Any invalid entry rejects the whole override.
    pub fn with_overrides(&self, overrides: &[(String, String)]) -> Result<Self, RouterError> {
        let mut weights = self.clone();

        for (name, value) in overrides {
            let agent = A::parse(name).ok_or_else(|| RouterError::InvalidWeight {
                agent: name.clone(),
                reason: format!("not an agent of the {} domain", A::NAME),
            })?;
            let weight = parse_weight(agent.id(), value)?;
            weights.set(agent, weight)?;
        }

        Ok(weights)
    }
}

impl<A: AgentDomain> Serialize for WeightVector<A> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.weights.len()))?;
        for (agent, weight) in &self.weights {
            map.serialize_entry(agent.id(), weight)?;
        }
        map.end()
    }
}

/// `WEIGHT_*` entries of the process environment. Entries whose key or
/// value is not valid UTF-8 are skipped.
pub fn weight_env_vars() -> Vec<(String, String)> {
    utf8_weight_vars(std::env::vars_os())
}

fn utf8_weight_vars<I>(vars: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (Ok(key), Err(_)) if key.starts_with(WEIGHT_PREFIX) => {
                tracing::warn!("[Weights] Ignoring {}: value is not valid UTF-8", key);
                None
            }
            _ => None,
        })
        .filter(|(key, _)| key.starts_with(WEIGHT_PREFIX))
        .collect()
}

fn parse_weight(agent: &str, raw: &str) -> Result<f64, RouterError> {
    raw.trim().parse::<f64>().map_err(|_| RouterError::InvalidWeight {
        agent: agent.to_string(),
        reason: format!("'{}' is not a number", raw),
    })
}

fn validate_weight(agent: &str, weight: f64) -> Result<(), RouterError> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(RouterError::InvalidWeight {
            agent: agent.to_string(),
            reason: format!("{} must be a finite non-negative number", weight),
        });
    }
    Ok(())
}

/// Multiplies the base distribution by the weights and renormalizes.
/// Falls back to uniform when every weighted score is zero.
pub fn apply_weights<A: AgentDomain>(base: &Distribution<A>, weights: &WeightVector<A>) -> Distribution<A> {
    Distribution::from_pairs(
        A::ALL
            .iter()
            .map(|agent| (*agent, base.get(*agent) * weights.get(*agent))),
    )
    .normalized()
}
