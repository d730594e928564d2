//! JSON File Routing History
//!
//! Information Hiding:
//! - File path and JSON array layout hidden from users
//! - Writes go to a sibling temp file and are renamed into place
//! - Records that no longer decode are skipped, not fatal

use super::HistoryStore;
use crate::routing::{AgentDomain, RoutingDecision};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::fs;

/// The whole log as one pretty-printed JSON array, oldest first
pub struct JsonFileHistory<A: AgentDomain> {
    path: PathBuf,
    _domain: PhantomData<A>,
}

impl<A: AgentDomain> JsonFileHistory<A> {
    pub async fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create history directory")?;
        }

        Ok(Self {
            path,
            _domain: PhantomData,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl<A: AgentDomain> HistoryStore<A> for JsonFileHistory<A> {
    async fn load(&self) -> Result<Vec<RoutingDecision<A>>> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            tracing::debug!("[JsonFileHistory] {:?} does not exist, starting empty", self.path);
            return Ok(Vec::new());
        }

        let json = fs::read_to_string(&self.path)
            .await
            .context(format!("Failed to read history file: {:?}", self.path))?;

        let raw: Vec<Value> = match serde_json::from_str(&json) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("[JsonFileHistory] {:?} is not a JSON array ({}), starting empty", self.path, e);
                return Ok(Vec::new());
            }
        };

        let total = raw.len();
        let records: Vec<RoutingDecision<A>> = raw
            .into_iter()
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect();

        if records.len() < total {
            tracing::warn!(
                "[JsonFileHistory] Skipped {} undecodable records in {:?}",
                total - records.len(),
                self.path
            );
        }

        tracing::debug!("[JsonFileHistory] Loaded {} records from {:?}", records.len(), self.path);
        Ok(records)
    }

    async fn save(&self, records: &[RoutingDecision<A>]) -> Result<()> {
        let json = serde_json::to_string_pretty(records).context("Failed to serialize routing history")?;
        let temp = self.temp_path();

        fs::write(&temp, json)
            .await
            .context(format!("Failed to write history file: {:?}", temp))?;
        fs::rename(&temp, &self.path)
            .await
            .context(format!("Failed to move history file into place: {:?}", self.path))?;

        tracing::debug!("[JsonFileHistory] Saved {} records to {:?}", records.len(), self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::FoodAgent;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileHistory::<FoodAgent>::new(temp_dir.path().join("history.json"))
            .await
            .unwrap();

        let records = vec![
            RoutingDecision::new("다이어트 식단", FoodAgent::HealthConsulting, 0.9, "건강"),
            RoutingDecision::new("데이트 맛집", FoodAgent::Restaurant, 0.8, "외식"),
        ];
        store.save(&records).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, records);
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty_and_creates_parent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("history.json");
        let store = JsonFileHistory::<FoodAgent>::new(path).await.unwrap();

        assert!(temp_dir.path().join("nested").is_dir());
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = JsonFileHistory::<FoodAgent>::new(path).await.unwrap();
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bad_records_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history.json");
        std::fs::write(
            &path,
            r#"[
                {"timestamp": "2024-01-01T00:00:00Z", "user_query": "q1", "selected_agent": "레시피_검색_에이전트", "confidence": 0.7, "reason": "r"},
                {"timestamp": "2024-01-01T00:01:00Z", "user_query": "q2", "selected_agent": "디저트_에이전트", "confidence": 0.7, "reason": "r"},
                {"user_query": "q3"}
            ]"#,
        )
        .unwrap();

        let store = JsonFileHistory::<FoodAgent>::new(path).await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].selected_agent, FoodAgent::RecipeSearch);
    }

    #[tokio::test]
    async fn test_persistence_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history.json");

        {
            let store = JsonFileHistory::<FoodAgent>::new(path.clone()).await.unwrap();
            let records = vec![RoutingDecision::new("냉장고 정리", FoodAgent::Refrigerator, 0.6, "")];
            store.save(&records).await.unwrap();
        }

        {
            let store = JsonFileHistory::<FoodAgent>::new(path).await.unwrap();
            let loaded = store.load().await.unwrap();
            assert_eq!(loaded.len(), 1);
            assert_eq!(loaded[0].user_query, "냉장고 정리");
        }
    }
}
