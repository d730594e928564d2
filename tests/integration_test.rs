//! Integration tests for the weighted router
//!
//! These tests verify the routing pipeline without requiring API keys

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tempfile::tempdir;
use weighted_router::actors::HistoryActorHandle;
use weighted_router::config::{HistoryConfig, OutputMode, RoutingConfig};
use weighted_router::routing::{
    AgentDomain, DecisionOutcome, RouteRequest, RoutingDecision, SourceMode, Supervisor, WeightVector,
    FALLBACK_CONFIDENCE, FALLBACK_REASON,
};
use weighted_router::storage::{HistoryStore, JsonFileHistory};
use weighted_router::{batch, BlockingModel, FoodAgent, LanguageModel, RouterError, SportsAgent};

/// Always answers with the same text
struct FixedModel {
    reply: String,
    calls: AtomicU32,
}

impl FixedModel {
    fn new(reply: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.into(),
            calls: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl LanguageModel for FixedModel {
    async fn invoke(&self, _prompt: &str) -> Result<String, RouterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

fn routing(output_mode: OutputMode) -> RoutingConfig {
    RoutingConfig {
        output_mode,
        retry_base_delay_ms: 1,
        seed: Some(11),
        ..RoutingConfig::default()
    }
}

async fn file_supervisor<A: AgentDomain>(
    path: std::path::PathBuf,
    model: Option<Arc<dyn LanguageModel>>,
    output_mode: OutputMode,
) -> Supervisor<A> {
    let history_config = HistoryConfig {
        path: path.clone(),
        ..HistoryConfig::default()
    };
    let store = JsonFileHistory::<A>::new(path).await.unwrap();
    let history = HistoryActorHandle::new(Box::new(store), &history_config);
    Supervisor::new(model, history, WeightVector::default(), routing(output_mode), history_config.min_records)
}

#[tokio::test]
async fn test_diet_query_end_to_end() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("routing_history.json");
    let model = FixedModel::new("선택된 에이전트: 건강식_컨설팅_에이전트\n이유: 다이어트 관련 질문\n확신도: 0.92");
    let supervisor = file_supervisor::<FoodAgent>(path.clone(), Some(model.clone()), OutputMode::Text).await;

    let response = supervisor
        .route(RouteRequest::new("다이어트에 좋은 음식 추천해줘"))
        .await;

    assert_eq!(response.selected_agent, FoodAgent::HealthConsulting);
    assert_eq!(response.metadata.outcome, DecisionOutcome::Resolved);
    assert_eq!(response.metadata.confidence, 0.92);
    assert_eq!(
        response.metadata.source,
        SourceMode::Keyword {
            rule: "다이어트".to_string()
        }
    );
    assert!(!response.reply.answer.is_empty());
    supervisor.history().shutdown().await;

    let store = JsonFileHistory::<FoodAgent>::new(path).await.unwrap();
    let records = store.load().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].selected_agent, FoodAgent::HealthConsulting);
    assert_eq!(records[0].user_query, "다이어트에 좋은 음식 추천해줘");
}

#[tokio::test]
async fn test_history_survives_restart_and_warms_source() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("routing_history.json");

    {
        let supervisor = file_supervisor::<SportsAgent>(path.clone(), None, OutputMode::Text).await;
        for _ in 0..5 {
            supervisor
                .route(RouteRequest {
                    query: "테니스".to_string(),
                    weight_overrides: vec![
                        ("soccer".to_string(), "0".to_string()),
                        ("basketball".to_string(), "0".to_string()),
                        ("baseball".to_string(), "0".to_string()),
                    ],
                    offline: true,
                    ..RouteRequest::default()
                })
                .await;
        }
        supervisor.history().shutdown().await;
    }

    let supervisor = file_supervisor::<SportsAgent>(path, None, OutputMode::Text).await;
    let response = supervisor
        .route(RouteRequest {
            query: "축구".to_string(),
            offline: true,
            ..RouteRequest::default()
        })
        .await;

    assert_eq!(response.metadata.source, SourceMode::History);
    assert_eq!(response.metadata.sample_size, 5);
    assert_eq!(response.metadata.base_distribution.get(SportsAgent::Tennis), 1.0);
    assert_eq!(response.selected_agent, SportsAgent::Tennis);
}

#[tokio::test]
async fn test_truncation_keeps_most_recent_thousand() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("routing_history.json");

    let seed: Vec<_> = (0..1000)
        .map(|i| RoutingDecision::new(format!("q{}", i), FoodAgent::Restaurant, 0.5, ""))
        .collect();
    JsonFileHistory::<FoodAgent>::new(path.clone())
        .await
        .unwrap()
        .save(&seed)
        .await
        .unwrap();

    let supervisor = file_supervisor::<FoodAgent>(path, None, OutputMode::Text).await;
    for i in 0..3 {
        supervisor
            .route(RouteRequest {
                query: format!("new{}", i),
                offline: true,
                ..RouteRequest::default()
            })
            .await;
    }

    let records = supervisor.history().load(None).await.unwrap();
    assert_eq!(records.len(), 1000);
    assert_eq!(records[0].user_query, "q3");
    assert_eq!(records[999].user_query, "new2");
}

#[tokio::test]
async fn test_structured_mode_falls_back_after_three_failures() {
    let dir = tempdir().unwrap();
    let model = FixedModel::new(json!({"selected_agent": "soccer", "reason": "x", "confidence": 0.9}).to_string());
    let supervisor = file_supervisor::<SportsAgent>(
        dir.path().join("h.json"),
        Some(model.clone()),
        OutputMode::Structured,
    )
    .await;

    let response = supervisor.route(RouteRequest::new("축구 경기 보고 싶어")).await;

    assert_eq!(model.calls.load(Ordering::SeqCst), 3);
    assert_eq!(response.selected_agent, SportsAgent::fallback());
    assert_eq!(response.metadata.outcome, DecisionOutcome::Fallback);
    assert_eq!(response.metadata.confidence, FALLBACK_CONFIDENCE);
    assert_eq!(response.metadata.reason, FALLBACK_REASON);
}

#[tokio::test]
async fn test_blocking_model_and_concurrent_batch() {
    let dir = tempdir().unwrap();
    let model = BlockingModel::new(|_prompt: &str| {
        std::thread::sleep(std::time::Duration::from_millis(5));
        Ok(r#"{"selected_agent": "레시피_검색_에이전트", "reason": "요리", "confidence": 0.8}"#.to_string())
    });
    let supervisor = file_supervisor::<FoodAgent>(
        dir.path().join("h.json"),
        Some(Arc::new(model)),
        OutputMode::Structured,
    )
    .await;

    let queries: Vec<String> = (0..20).map(|i| format!("요리 {}", i)).collect();
    let results = batch::route_queries(&supervisor, queries, 8, false).await;

    assert_eq!(results.len(), 20);
    assert!(results
        .iter()
        .all(|(_, r)| r.selected_agent == FoodAgent::RecipeSearch));

    let stats = supervisor.history().statistics().await.unwrap();
    assert_eq!(stats.total, 20);
    let recipe = stats
        .agents
        .iter()
        .find(|a| a.agent == FoodAgent::RecipeSearch)
        .unwrap();
    assert_eq!(recipe.count, 20);
    assert_eq!(recipe.percentage, 100.0);
}
