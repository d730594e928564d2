use anyhow::Result;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub llm: LLMConfig,
    pub routing: RoutingConfig,
    pub history: HistoryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub api_base: String,
    /// Passed straight to the HTTP client; the router adds no timeout of its own
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainKind {
    Sports,
    Food,
}

/// How the model is asked to answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// JSON schema constrained `{selected_agent, reason, confidence}`
    Structured,
    /// Free text with a `선택된 에이전트: <id>` label line
    Text,
}

/// What free-text extraction does when no stage identifies an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionPolicy {
    /// Fail the attempt; the supervisor retries and finally falls back
    Strict,
    /// Resolve to the domain's first agent immediately
    DefaultAgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColdStartMode {
    Keyword,
    Simulated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    pub domain: DomainKind,
    pub output_mode: OutputMode,
    pub extraction_policy: ExtractionPolicy,
    pub max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub cold_start: ColdStartMode,
    /// Named weight preset under the `WEIGHT_*` environment values
    pub weight_preset: String,
    /// Seeds the simulated statistics; entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    pub path: PathBuf,
    pub max_records: usize,
    pub min_records: usize,
    pub channel_buffer_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config_env = env::var("CONFIG_ENV").unwrap_or_else(|_| "default".to_string());

        let config = Self::defaults()?
            .add_source(File::with_name(&format!("config/{}", config_env)).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("llm.model", "gpt-4o-mini")?
            .set_default("llm.max_tokens", 1024_i64)?
            .set_default("llm.temperature", 0.1_f64)?
            .set_default("llm.api_base", "https://api.openai.com/v1")?
            .set_default("llm.request_timeout_ms", 60_000_i64)?
            .set_default("routing.domain", "food")?
            .set_default("routing.output_mode", "structured")?
            .set_default("routing.extraction_policy", "strict")?
            .set_default("routing.max_attempts", 3_i64)?
            .set_default("routing.retry_base_delay_ms", 500_i64)?
            .set_default("routing.cold_start", "keyword")?
            .set_default("routing.weight_preset", "default")?
            .set_default("history.path", "data/routing_history.json")?
            .set_default("history.max_records", 1000_i64)?
            .set_default("history.min_records", 5_i64)?
            .set_default("history.channel_buffer_size", 64_i64)?
            .set_default("logging.level", "info")
    }

    pub fn api_key() -> Result<String> {
        env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            llm: LLMConfig {
                model: "gpt-4o-mini".to_string(),
                max_tokens: 1024,
                temperature: 0.1,
                api_base: "https://api.openai.com/v1".to_string(),
                request_timeout_ms: 60_000,
            },
            routing: RoutingConfig::default(),
            history: HistoryConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/routing_history.json"),
            max_records: 1000,
            min_records: 5,
            channel_buffer_size: 64,
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            domain: DomainKind::Food,
            output_mode: OutputMode::Structured,
            extraction_policy: ExtractionPolicy::Strict,
            max_attempts: 3,
            retry_base_delay_ms: 500,
            cold_start: ColdStartMode::Keyword,
            weight_preset: "default".to_string(),
            seed: None,
        }
    }
}
