//! Categorical distribution over a closed agent set
//!
//! Every agent of the domain always has an entry, in enumeration order.
//! Normalization never divides by zero: an all-zero distribution becomes
//! uniform.

use super::domain::AgentDomain;
use rand::distributions::WeightedIndex;
use rand::prelude::Distribution as _;
use rand::Rng;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Tolerance used when checking sums and uniformity
pub const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct Distribution<A: AgentDomain> {
    entries: Vec<(A, f64)>,
}

impl<A: AgentDomain> Distribution<A> {
    pub fn uniform() -> Self {
        let share = 1.0 / A::ALL.len() as f64;
        Self {
            entries: A::ALL.iter().map(|agent| (*agent, share)).collect(),
        }
    }

    pub fn zeros() -> Self {
        Self {
            entries: A::ALL.iter().map(|agent| (*agent, 0.0)).collect(),
        }
    }

    /// Builds a complete distribution; absent agents get 0 and invalid
    /// (negative, NaN, infinite) weights are stored as 0. Later pairs
    /// overwrite earlier ones for the same agent.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, f64)>,
    {
        let mut distribution = Self::zeros();
        for (agent, weight) in pairs {
            distribution.set(agent, weight);
        }
        distribution
    }

    fn set(&mut self, agent: A, weight: f64) {
        let weight = if weight.is_finite() && weight > 0.0 { weight } else { 0.0 };
        if let Some(entry) = self.entries.iter_mut().find(|(a, _)| *a == agent) {
            entry.1 = weight;
        }
    }

    pub fn get(&self, agent: A) -> f64 {
        self.entries
            .iter()
            .find(|(a, _)| *a == agent)
            .map(|(_, w)| *w)
            .unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (A, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }

    /// Rescales to sum 1.0, or uniform when there is no usable mass
    pub fn normalized(&self) -> Self {
        let total = self.total();
        if !(total.is_finite() && total > 0.0) {
            return Self::uniform();
        }
        Self {
            entries: self.entries.iter().map(|(a, w)| (*a, w / total)).collect(),
        }
    }

    /// Normalized and expressed out of 100
    pub fn to_percentages(&self) -> Self {
        let normalized = self.normalized();
        Self {
            entries: normalized.entries.iter().map(|(a, w)| (*a, w * 100.0)).collect(),
        }
    }

    /// True when no agent deviates from the uniform share by more than `tolerance`
    pub fn is_near_uniform(&self, tolerance: f64) -> bool {
        let share = 1.0 / A::ALL.len() as f64;
        self.normalized()
            .entries
            .iter()
            .all(|(_, w)| (w - share).abs() <= tolerance)
    }

    /// Highest weight, first in enumeration order on ties
    pub fn argmax(&self) -> A {
        let mut best = (A::fallback(), f64::NEG_INFINITY);
        for (agent, weight) in self.iter() {
            if weight > best.1 {
                best = (agent, weight);
            }
        }
        best.0
    }

    /// Draws one agent proportionally to the weights
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> A {
        let normalized = self.normalized();
        match WeightedIndex::new(normalized.entries.iter().map(|(_, w)| *w)) {
            Ok(index) => normalized.entries[index.sample(rng)].0,
            Err(_) => A::fallback(),
        }
    }
}

impl<A: AgentDomain> Serialize for Distribution<A> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (agent, weight) in &self.entries {
            map.serialize_entry(agent.id(), weight)?;
        }
        map.end()
    }
}
