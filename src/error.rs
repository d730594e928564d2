//! Routing Error Taxonomy
//!
//! Information Hiding:
//! - Each failure class of the routing pipeline is a distinct variant
//! - Callers decide per variant whether to retry, degrade or surface
//! - Only `InvalidWeight` and `Config` ever reach the end user

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouterError {
    /// A weight override entry was non-numeric, negative or named an unknown agent
    #[error("invalid weight for '{agent}': {reason}")]
    InvalidWeight { agent: String, reason: String },

    /// Free-text output did not name any agent of the domain
    #[error("no valid agent could be extracted from model output")]
    Extraction,

    /// Structured output violated the decision schema
    #[error("schema validation failed on '{field}': {message}")]
    SchemaValidation { field: String, message: String },

    /// History could not be read or written
    #[error("history persistence failed: {0}")]
    Persistence(String),

    /// The language model call itself failed
    #[error("upstream model call failed: {0}")]
    Upstream(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl RouterError {
    pub fn schema(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether the supervisor may spend another attempt after this error
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Extraction | Self::SchemaValidation { .. } | Self::Upstream(_)
        )
    }
}

impl From<config::ConfigError> for RouterError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
