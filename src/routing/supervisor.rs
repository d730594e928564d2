//! Supervisor - weighted routing pipeline
//!
//! Information Hiding:
//! - Distribution source, weighting, prompting and extraction are composed here
//! - Retry budget and backoff are private to the decision step
//! - History degrades to cold start when it cannot be read
//!
//! `route` never fails. Every internal failure is logged and folded into
//! either a resolved decision or the deterministic fallback.

use super::distribution::Distribution;
use super::domain::{agent_id, AgentDomain, AgentReply};
use super::extract::{extract_agent, validate_record, DecisionMethod, Extracted};
use super::history::{EmpiricalDistribution, RoutingDecision};
use super::prompt::{build_prompt, decision_schema};
use super::source::{DistributionSource, SourceMode};
use super::weights::{apply_weights, weight_env_vars, WeightVector};
use crate::actors::HistoryActorHandle;
use crate::config::{OutputMode, RoutingConfig, Settings};
use crate::core::llm::{LLMClient, LanguageModel};
use crate::error::RouterError;
use crate::storage::JsonFileHistory;
use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tokio::time::{sleep, Duration};

/// Rationale recorded when the attempt budget is exhausted
pub const FALLBACK_REASON: &str = "Routing fallback: model output could not be validated within the retry budget";

/// Rationale recorded when no model is configured
pub const NO_MODEL_REASON: &str = "Routing fallback: no language model configured";

pub const FALLBACK_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Clone, Default)]
pub struct RouteRequest {
    pub query: String,
    /// `(agent id or slug, value)` pairs layered over the configured weights
    pub weight_overrides: Vec<(String, String)>,
    /// Preset replacing the configured one for this request
    pub preset: Option<String>,
    /// Sample from the weighted distribution instead of asking the model
    pub offline: bool,
}

impl RouteRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    Resolved,
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
#[serde(bound = "A: AgentDomain")]
pub struct RoutingMetadata<A: AgentDomain> {
    pub source: SourceMode,
    /// Measured record count in history mode, simulated otherwise
    pub sample_size: u64,
    pub base_distribution: Distribution<A>,
    pub weight_preset: String,
    pub weights: WeightVector<A>,
    pub normalized_distribution: Distribution<A>,
    pub outcome: DecisionOutcome,
    pub method: DecisionMethod,
    pub confidence: f64,
    pub reason: String,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub persisted: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(bound = "A: AgentDomain")]
pub struct RouteResponse<A: AgentDomain> {
    pub query: String,
    #[serde(with = "agent_id")]
    pub selected_agent: A,
    pub reply: AgentReply,
    pub metadata: RoutingMetadata<A>,
}

struct Decision<A: AgentDomain> {
    extracted: Extracted<A>,
    outcome: DecisionOutcome,
    attempts: u32,
    raw_output: Option<String>,
}

pub struct Supervisor<A: AgentDomain> {
    model: Option<Arc<dyn LanguageModel>>,
    history: HistoryActorHandle<A>,
    source: DistributionSource<A>,
    default_weights: WeightVector<A>,
    /// `WEIGHT_*` pairs re-applied over a per-request preset
    weight_env: Vec<(String, String)>,
    config: RoutingConfig,
}

impl<A: AgentDomain> Supervisor<A> {
    pub fn new(
        model: Option<Arc<dyn LanguageModel>>,
        history: HistoryActorHandle<A>,
        default_weights: WeightVector<A>,
        config: RoutingConfig,
        min_records: usize,
    ) -> Self {
        let source = DistributionSource::new(config.cold_start, min_records, config.seed);
        Self {
            model,
            history,
            source,
            default_weights,
            weight_env: Vec::new(),
            config,
        }
    }

    pub fn with_weight_env(mut self, weight_env: Vec<(String, String)>) -> Self {
        self.weight_env = weight_env;
        self
    }

    /// JSON file history, the configured preset with `WEIGHT_*` environment
    /// weights over it, and the OpenAI client when `OPENAI_API_KEY` is set
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let weight_env = weight_env_vars();
        let default_weights =
            WeightVector::<A>::preset(&settings.routing.weight_preset)?.with_env_vars(weight_env.clone());
        tracing::info!("[Supervisor] Weight preset '{}'", settings.routing.weight_preset);

        let store = JsonFileHistory::<A>::new(settings.history.path.clone()).await?;
        let history = HistoryActorHandle::new(Box::new(store), &settings.history);

        let model: Option<Arc<dyn LanguageModel>> = match Settings::api_key() {
            Ok(api_key) => Some(Arc::new(LLMClient::new(api_key, settings.llm.clone())?)),
            Err(e) => {
                tracing::warn!("[Supervisor] {}; only offline routing will resolve", e);
                None
            }
        };

        Ok(Self::new(
            model,
            history,
            default_weights,
            settings.routing.clone(),
            settings.history.min_records,
        )
        .with_weight_env(weight_env))
    }

    pub fn history(&self) -> &HistoryActorHandle<A> {
        &self.history
    }

    pub fn default_weights(&self) -> &WeightVector<A> {
        &self.default_weights
    }

    /// Preset, then `WEIGHT_*` environment values, then `overrides`.
    /// Without a preset the configured weights are the base.
    pub fn resolve_weights(
        &self,
        preset: Option<&str>,
        overrides: &[(String, String)],
    ) -> Result<WeightVector<A>, RouterError> {
        match preset {
            Some(name) => WeightVector::preset(name)?
                .with_env_vars(self.weight_env.iter().cloned())
                .with_overrides(overrides),
            None => self.default_weights.with_overrides(overrides),
        }
    }

    pub async fn route(&self, request: RouteRequest) -> RouteResponse<A> {
        tracing::info!("[Supervisor] Routing query: {}", request.query);
        let mut warnings = Vec::new();

        let (weight_preset, weights) =
            match self.resolve_weights(request.preset.as_deref(), &request.weight_overrides) {
                Ok(weights) => {
                    let preset = request.preset.clone().unwrap_or_else(|| self.config.weight_preset.clone());
                    (preset, weights)
                }
                Err(e) => {
                    tracing::warn!("[Supervisor] Rejecting weight override ({}), using configured weights", e);
                    warnings.push(e.to_string());
                    (self.config.weight_preset.clone(), self.default_weights.clone())
                }
            };

        let empirical = match self.history.empirical().await {
            Ok(empirical) => empirical,
            Err(e) => {
                tracing::warn!("[Supervisor] History unavailable ({}), treating as cold", e);
                warnings.push(e.to_string());
                EmpiricalDistribution::empty()
            }
        };

        let base = self.source.base_pattern(&request.query, &empirical);
        let normalized = apply_weights(&base.distribution, &weights);
        tracing::debug!(
            "[Supervisor] Base pattern {:?} with sample size {}",
            base.mode,
            base.sample_size
        );

        let decision = if request.offline {
            self.sample_offline(&normalized)
        } else {
            let prompt = build_prompt(&request.query, &normalized, base.sample_size, self.config.output_mode);
            self.decide(&prompt).await
        };

        let selected = decision.extracted.agent;
        tracing::info!(
            "[Supervisor] Selected {} ({:?}, confidence {:.2}, {} attempt(s))",
            selected.id(),
            decision.outcome,
            decision.extracted.confidence,
            decision.attempts
        );

        let record = RoutingDecision::new(
            request.query.clone(),
            selected,
            decision.extracted.confidence,
            decision.extracted.reason.clone(),
        );
        let persisted = match self.history.append(record).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("[Supervisor] Decision not recorded: {}", e);
                warnings.push(e.to_string());
                false
            }
        };

        RouteResponse {
            reply: selected.respond(&request.query),
            query: request.query,
            selected_agent: selected,
            metadata: RoutingMetadata {
                source: base.mode,
                sample_size: base.sample_size,
                base_distribution: base.distribution,
                weight_preset,
                weights,
                normalized_distribution: normalized,
                outcome: decision.outcome,
                method: decision.extracted.method,
                confidence: decision.extracted.confidence,
                reason: decision.extracted.reason,
                attempts: decision.attempts,
                raw_output: decision.raw_output,
                warnings,
                persisted,
            },
        }
    }

    fn sample_offline(&self, normalized: &Distribution<A>) -> Decision<A> {
        let agent = self.source.sample(normalized);
        let probability = normalized.get(agent);

        Decision {
            extracted: Extracted {
                agent,
                method: DecisionMethod::Sampled,
                confidence: probability,
                reason: format!("Sampled offline with probability {:.1}%", probability * 100.0),
            },
            outcome: DecisionOutcome::Resolved,
            attempts: 0,
            raw_output: None,
        }
    }

    async fn decide(&self, prompt: &str) -> Decision<A> {
        let Some(model) = self.model.as_ref() else {
            tracing::warn!("[Supervisor] No language model configured, using fallback agent");
            return fallback(NO_MODEL_REASON, 0, None);
        };

        let max_attempts = self.config.max_attempts.max(1);
        let mut last_output = None;

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                let delay = backoff_delay(self.config.retry_base_delay_ms, attempt);
                tracing::warn!(
                    "[Supervisor] Retrying decision (attempt {}/{}) after {}ms delay",
                    attempt,
                    max_attempts,
                    delay
                );
                sleep(Duration::from_millis(delay)).await;
            }

            let result = match self.config.output_mode {
                OutputMode::Structured => {
                    let schema = decision_schema::<A>();
                    model.invoke_structured(prompt, &schema).await.and_then(|value| {
                        last_output = Some(value.to_string());
                        validate_record::<A>(&value)
                    })
                }
                OutputMode::Text => model.invoke(prompt).await.and_then(|raw| {
                    let extracted = extract_agent::<A>(&raw, self.config.extraction_policy);
                    last_output = Some(raw);
                    extracted
                }),
            };

            match result {
                Ok(extracted) if extracted.method == DecisionMethod::Default => {
                    return Decision {
                        extracted,
                        outcome: DecisionOutcome::Fallback,
                        attempts: attempt,
                        raw_output: last_output,
                    };
                }
                Ok(extracted) => {
                    return Decision {
                        extracted,
                        outcome: DecisionOutcome::Resolved,
                        attempts: attempt,
                        raw_output: last_output,
                    };
                }
                Err(e) if e.is_retryable() => {
                    tracing::warn!("[Supervisor] Attempt {}/{} failed: {}", attempt, max_attempts, e);
                }
                Err(e) => {
                    tracing::error!("[Supervisor] Unrecoverable decision error: {}", e);
                    return fallback(FALLBACK_REASON, attempt, last_output);
                }
            }
        }

        tracing::warn!("[Supervisor] Attempt budget exhausted, using fallback agent");
        fallback(FALLBACK_REASON, max_attempts, last_output)
    }
}

/// Delay before `attempt` (2-based): base, 2x base, 4x base and so on,
/// saturating at `u64::MAX` milliseconds
fn backoff_delay(base_ms: u64, attempt: u32) -> u64 {
    let factor = 2_u64.checked_pow(attempt.saturating_sub(2)).unwrap_or(u64::MAX);
    base_ms.saturating_mul(factor)
}

fn fallback<A: AgentDomain>(reason: &str, attempts: u32, raw_output: Option<String>) -> Decision<A> {
    Decision {
        extracted: Extracted {
            agent: A::fallback(),
            method: DecisionMethod::Default,
            confidence: FALLBACK_CONFIDENCE,
            reason: reason.to_string(),
        },
        outcome: DecisionOutcome::Fallback,
        attempts,
        raw_output,
    }
}
