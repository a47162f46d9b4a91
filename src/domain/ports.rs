use crate::domain::errors::UpstreamFetchError;
use crate::domain::market::history::HistoricalPoint;
use async_trait::async_trait;

/// Outcome of a history fetch; failures are values, not panics.
pub type HistoryFetch = Result<Vec<HistoricalPoint>, UpstreamFetchError>;

// Need async_trait for async functions in traits
#[async_trait]
pub trait HistoricalDataProvider: Send + Sync {
    /// Daily history for `coin_id` covering the last `days` days.
    async fn fetch_history(&self, coin_id: &str, days: u32) -> HistoryFetch;

    fn name(&self) -> &str;
}
