//! Distribution Source - base categorical distribution for a query
//!
//! Information Hiding:
//! - Mode selection (history vs cold start) is internal
//! - Keyword preset tables come from the domain
//! - Simulated sample sizes are drawn from a seeded or entropy RNG
//!
//! Once the history holds `min_records` decisions the empirical frequencies
//! are used. Before that, the cold-start mode provides a base pattern whose
//! sample size is a SIMULATED statistic, not a measured one.

use super::distribution::Distribution;
use super::domain::AgentDomain;
use super::history::EmpiricalDistribution;
use crate::config::ColdStartMode;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Mutex;

/// Where a base pattern came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SourceMode {
    Keyword { rule: String },
    Simulated,
    History,
}

impl SourceMode {
    /// True when the sample size was measured rather than simulated
    pub fn is_measured(&self) -> bool {
        matches!(self, SourceMode::History)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BasePattern<A: AgentDomain> {
    pub distribution: Distribution<A>,
    pub sample_size: u64,
    pub mode: SourceMode,
}

pub const DEFAULT_RULE: &str = "default";

pub struct DistributionSource<A: AgentDomain> {
    cold_start: ColdStartMode,
    min_records: usize,
    rng: Mutex<StdRng>,
    _domain: PhantomData<A>,
}

impl<A: AgentDomain> DistributionSource<A> {
    pub fn new(cold_start: ColdStartMode, min_records: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            cold_start,
            min_records,
            rng: Mutex::new(rng),
            _domain: PhantomData,
        }
    }

    /// History-backed once warm, cold-start otherwise
    pub fn base_pattern(&self, query: &str, empirical: &EmpiricalDistribution<A>) -> BasePattern<A> {
        if empirical.sample_size >= self.min_records && empirical.sample_size > 0 {
            tracing::debug!(
                "[DistributionSource] Using history ({} records)",
                empirical.sample_size
            );
            return BasePattern {
                distribution: empirical.distribution.clone(),
                sample_size: empirical.sample_size as u64,
                mode: SourceMode::History,
            };
        }

        match self.cold_start {
            ColdStartMode::Keyword => {
                let (distribution, rule) = keyword_pattern::<A>(query);
                tracing::debug!("[DistributionSource] Keyword rule '{}' for query", rule);
                BasePattern {
                    distribution,
                    sample_size: self.simulated_sample_size(),
                    mode: SourceMode::Keyword {
                        rule: rule.to_string(),
                    },
                }
            }
            ColdStartMode::Simulated => self.simulated_pattern(),
        }
    }

    /// Weighted draw used for offline routing; shares the seeded RNG
    pub fn sample(&self, distribution: &Distribution<A>) -> A {
        match self.rng.lock() {
            Ok(mut rng) => distribution.sample(&mut *rng),
            Err(poisoned) => distribution.sample(&mut *poisoned.into_inner()),
        }
    }

    fn simulated_sample_size(&self) -> u64 {
        let (low, high) = A::SAMPLE_RANGE;
        match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(low..=high),
            Err(poisoned) => poisoned.into_inner().gen_range(low..=high),
        }
    }

    /// Simulates `sample_size` uniform picks and uses their counts
    fn simulated_pattern(&self) -> BasePattern<A> {
        let sample_size = self.simulated_sample_size();
        let mut counts = vec![0_u64; A::ALL.len()];

        {
            let mut rng = match self.rng.lock() {
                Ok(rng) => rng,
                Err(poisoned) => poisoned.into_inner(),
            };
            for _ in 0..sample_size {
                counts[rng.gen_range(0..A::ALL.len())] += 1;
            }
        }

        BasePattern {
            distribution: Distribution::from_pairs(
                A::ALL.iter().zip(&counts).map(|(agent, count)| (*agent, *count as f64)),
            ),
            sample_size,
            mode: SourceMode::Simulated,
        }
    }
}

/// First matching keyword rule wins (case-insensitive substring);
/// uniform with rule name `default` when nothing matches.
pub fn keyword_pattern<A: AgentDomain>(query: &str) -> (Distribution<A>, &'static str) {
    let query = query.to_lowercase();

    A::PATTERN_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|kw| query.contains(&kw.to_lowercase())))
        .map(|rule| (Distribution::from_pairs(rule.weights.iter().copied()), rule.name))
        .unwrap_or_else(|| (Distribution::uniform(), DEFAULT_RULE))
}
