//! Repository Pattern Abstractions
//!
//! Persistence of completed forecast runs sits behind `ForecastRepository`
//! so the forecasting core never depends on a storage engine.
//!
//! Saving is best-effort from the service's point of view: an error here is
//! logged and never changes the returned forecast.
//!
//! # Example
//!
//! ```rust,no_run
//! use pricecast::domain::repositories::ForecastRepository;
//! use pricecast::infrastructure::InMemoryForecastRepository;
//!
//! # async {
//! let repo = InMemoryForecastRepository::new();
//! let recent = repo.find_recent("bitcoin", 10).await;
//! # };
//! ```

use crate::domain::forecasting::ForecastRun;
use anyhow::Result;
use async_trait::async_trait;

/// Repository for persisting and retrieving forecast runs
#[async_trait]
pub trait ForecastRepository: Send + Sync {
    /// Save a completed forecast run
    async fn save(&self, run: &ForecastRun) -> Result<()>;

    /// Most recent runs for a coin, newest first
    async fn find_recent(&self, coin_id: &str, limit: usize) -> Result<Vec<ForecastRun>>;

    /// Count total number of stored runs
    async fn count(&self) -> Result<usize>;
}
