//! In-Memory Repository Implementations
//!
//! Thread-safe, in-memory implementation of `ForecastRepository` backed by
//! `Arc<RwLock>`. Runs are lost on restart; use the SQLite repository when
//! they must survive.

use crate::domain::forecasting::ForecastRun;
use crate::domain::repositories::ForecastRepository;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory implementation of ForecastRepository
/// Suitable for testing and single-instance deployments
pub struct InMemoryForecastRepository {
    runs: Arc<RwLock<Vec<ForecastRun>>>,
}

impl InMemoryForecastRepository {
    pub fn new() -> Self {
        Self {
            runs: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryForecastRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ForecastRepository for InMemoryForecastRepository {
    async fn save(&self, run: &ForecastRun) -> Result<()> {
        self.runs.write().await.push(run.clone());
        Ok(())
    }

    async fn find_recent(&self, coin_id: &str, limit: usize) -> Result<Vec<ForecastRun>> {
        let runs = self.runs.read().await;
        Ok(runs
            .iter()
            .rev()
            .filter(|r| r.coin_id == coin_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.runs.read().await.len())
    }
}
