//! Weighted Router - supervisor routing for LLM multi-agent systems
//!
//! A query is routed to exactly one agent of a closed domain. The supervisor
//! derives a base distribution (history once warm, keyword presets before),
//! applies per-agent weights, asks the model, validates its choice and folds
//! the decision back into a persisted history.

pub mod actors;
pub mod agents;
pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod routing;
pub mod storage;
pub mod utils;

pub use api::*;
pub use config::Settings;
pub use error::RouterError;

pub use agents::{FoodAgent, SportsAgent};
pub use crate::core::llm::{BlockingModel, JsonSchemaFormat, LLMClient, LanguageModel, ResponseFormat};
pub use routing::{
    AgentDomain, DecisionOutcome, Distribution, RouteRequest, RouteResponse, RoutingDecision, Supervisor,
    WeightVector,
};
