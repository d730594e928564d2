//! Language model capability
//!
//! Information Hiding:
//! - Chat-completions wire format is private to `LLMClient`
//! - Retries live in the supervisor; one call here is one HTTP attempt
//! - Blocking third-party clients are adapted onto the async trait

use crate::config::LLMConfig;
use crate::error::RouterError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    Text,
    JsonObject,
    JsonSchema {
        json_schema: JsonSchemaFormat,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSchemaFormat {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schema: Value,
    #[serde(default = "default_strict")]
    pub strict: bool,
}

fn default_strict() -> bool {
    true
}

/// Anything that turns a prompt into a completion
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Free-text completion
    async fn invoke(&self, prompt: &str) -> Result<String, RouterError>;

    /// Completion constrained to `schema`. The default asks for free text
    /// and parses it as JSON.
    async fn invoke_structured(&self, prompt: &str, schema: &JsonSchemaFormat) -> Result<Value, RouterError> {
        tracing::debug!("[LanguageModel] No native schema support for '{}'", schema.name);
        let raw = self.invoke(prompt).await?;
        parse_json(&raw)
    }
}

fn parse_json(raw: &str) -> Result<Value, RouterError> {
    let trimmed = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    serde_json::from_str(trimmed).map_err(|e| RouterError::schema("$", format!("not valid JSON: {}", e)))
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

/// OpenAI-compatible chat-completions client
pub struct LLMClient {
    client: Client,
    api_key: String,
    config: LLMConfig,
}

impl LLMClient {
    pub fn new(api_key: String, config: LLMConfig) -> Result<Self, RouterError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| RouterError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'))
    }

    pub async fn chat_with_format(
        &self,
        messages: Vec<ChatMessage>,
        response_format: Option<ResponseFormat>,
    ) -> Result<String, RouterError> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            response_format,
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("[LLMClient] HTTP request failed: {}", e);
                RouterError::Upstream(format!("HTTP request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!("[LLMClient] API returned error status {}: {}", status, error_text);
            return Err(RouterError::Upstream(format!("API error {}: {}", status, error_text)));
        }

        let chat_response = response.json::<ChatResponse>().await.map_err(|e| {
            tracing::warn!("[LLMClient] Failed to decode response body: {}", e);
            RouterError::Upstream(format!("Response decode error: {}", e))
        })?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| RouterError::Upstream("response contained no choices".to_string()))
    }
}

#[async_trait]
impl LanguageModel for LLMClient {
    async fn invoke(&self, prompt: &str) -> Result<String, RouterError> {
        self.chat_with_format(vec![ChatMessage::user(prompt)], None).await
    }

    async fn invoke_structured(&self, prompt: &str, schema: &JsonSchemaFormat) -> Result<Value, RouterError> {
        let format = ResponseFormat::JsonSchema {
            json_schema: schema.clone(),
        };
        let raw = self
            .chat_with_format(vec![ChatMessage::user(prompt)], Some(format))
            .await?;
        parse_json(&raw)
    }
}

type BlockingFn = dyn Fn(&str) -> anyhow::Result<String> + Send + Sync;

/// Runs a synchronous completion function on the blocking pool
#[derive(Clone)]
pub struct BlockingModel {
    inner: Arc<BlockingFn>,
}

impl BlockingModel {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }
}

#[async_trait]
impl LanguageModel for BlockingModel {
    async fn invoke(&self, prompt: &str) -> Result<String, RouterError> {
        let inner = Arc::clone(&self.inner);
        let prompt = prompt.to_string();

        tokio::task::spawn_blocking(move || (*inner)(&prompt))
            .await
            .map_err(|e| RouterError::Upstream(format!("blocking model task failed: {}", e)))?
            .map_err(|e| RouterError::Upstream(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(api_base: String) -> LLMConfig {
        LLMConfig {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 256,
            temperature: 0.7,
            api_base,
            request_timeout_ms: 5_000,
        }
    }

    fn completion(content: &str) -> Value {
        json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
    }

    #[tokio::test]
    async fn test_invoke_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("선택된 에이전트: 축구_에이전트")))
            .expect(1)
            .mount(&server)
            .await;

        let client = LLMClient::new("test-key".to_string(), config(server.uri())).unwrap();
        let text = client.invoke("prompt").await.unwrap();
        assert_eq!(text, "선택된 에이전트: 축구_에이전트");
    }

    #[tokio::test]
    async fn test_error_status_is_upstream_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(1)
            .mount(&server)
            .await;

        let client = LLMClient::new("k".to_string(), config(server.uri())).unwrap();
        let err = client.invoke("prompt").await.unwrap_err();
        assert!(matches!(err, RouterError::Upstream(ref msg) if msg.contains("503")));
    }

    #[tokio::test]
    async fn test_structured_parses_json_content() {
        let server = MockServer::start().await;
        let body = r#"{"selected_agent":"야구_에이전트","reason":"타격","confidence":0.8}"#;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(body)))
            .mount(&server)
            .await;

        let client = LLMClient::new("k".to_string(), config(server.uri())).unwrap();
        let schema = JsonSchemaFormat {
            name: "routing_decision".to_string(),
            description: None,
            schema: json!({"type": "object"}),
            strict: true,
        };
        let value = client.invoke_structured("prompt", &schema).await.unwrap();
        assert_eq!(value["selected_agent"], "야구_에이전트");
    }

    #[tokio::test]
    async fn test_structured_non_json_is_schema_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("그냥 텍스트")))
            .mount(&server)
            .await;

        let client = LLMClient::new("k".to_string(), config(server.uri())).unwrap();
        let schema = JsonSchemaFormat {
            name: "routing_decision".to_string(),
            description: None,
            schema: json!({}),
            strict: true,
        };
        let err = client.invoke_structured("prompt", &schema).await.unwrap_err();
        assert!(matches!(err, RouterError::SchemaValidation { .. }));
    }

    #[tokio::test]
    async fn test_blocking_model_runs_closure() {
        let model = BlockingModel::new(|prompt: &str| Ok(format!("echo: {}", prompt.len())));
        assert_eq!(model.invoke("abc").await.unwrap(), "echo: 3");

        let failing = BlockingModel::new(|_: &str| Err(anyhow::anyhow!("socket closed")));
        assert!(matches!(failing.invoke("x").await, Err(RouterError::Upstream(_))));
    }

    #[tokio::test]
    async fn test_default_structured_parses_fenced_json() {
        let model = BlockingModel::new(|_: &str| Ok("```json\n{\"a\": 1}\n```".to_string()));
        let schema = JsonSchemaFormat {
            name: "x".to_string(),
            description: None,
            schema: json!({}),
            strict: false,
        };
        assert_eq!(model.invoke_structured("p", &schema).await.unwrap()["a"], 1);
    }
}
