use crate::domain::forecasting::{ForecastResult, ForecastRun, ModelType};
use crate::domain::repositories::ForecastRepository;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

/// Forecast runs in SQLite, the result kept as a JSON document column.
pub struct SqliteForecastRepository {
    pool: SqlitePool,
}

impl SqliteForecastRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_row(row: &SqliteRow) -> Result<ForecastRun> {
        let id: String = row.try_get("id")?;
        let model_type: String = row.try_get("model_type")?;
        let days: i64 = row.try_get("days")?;
        let result_json: String = row.try_get("result_json")?;
        let created_at: i64 = row.try_get("created_at")?;

        let result: ForecastResult =
            serde_json::from_str(&result_json).context("Failed to decode stored forecast")?;

        Ok(ForecastRun {
            id: Uuid::parse_str(&id).context("Invalid forecast id")?,
            coin_id: row.try_get("coin_id")?,
            symbol: row.try_get("symbol")?,
            model_type: ModelType::from_str(&model_type)?,
            days: u32::try_from(days).context("Invalid stored horizon")?,
            current_price: row.try_get("current_price")?,
            result,
            created_at: DateTime::from_timestamp_millis(created_at)
                .context("Invalid stored timestamp")?,
        })
    }
}

#[async_trait]
impl ForecastRepository for SqliteForecastRepository {
    async fn save(&self, run: &ForecastRun) -> Result<()> {
        let result_json =
            serde_json::to_string(&run.result).context("Failed to encode forecast result")?;

        sqlx::query(
            r#"
            INSERT INTO forecasts (id, coin_id, symbol, model_type, days, current_price, result_json, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(run.id.to_string())
        .bind(&run.coin_id)
        .bind(&run.symbol)
        .bind(run.model_type.to_string())
        .bind(i64::from(run.days))
        .bind(run.current_price)
        .bind(result_json)
        .bind(run.created_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .context("Failed to save forecast run")?;

        debug!("Persisted forecast {} for {}", run.id, run.coin_id);
        Ok(())
    }

    async fn find_recent(&self, coin_id: &str, limit: usize) -> Result<Vec<ForecastRun>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM forecasts
            WHERE coin_id = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(coin_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .context("Failed to load forecast runs")?;

        rows.iter().map(Self::map_row).collect()
    }

    async fn count(&self) -> Result<usize> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM forecasts")
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.try_get("count")?;
        Ok(count.max(0) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::forecasting::{ENSEMBLE_LABEL, ForecastMetrics, ForecastPoint, ForecastRequest};
    use crate::infrastructure::persistence::Database;
    use chrono::NaiveDate;

    fn run(coin_id: &str, days: u32) -> ForecastRun {
        let request = ForecastRequest {
            coin_id: coin_id.to_string(),
            symbol: "BTC".to_string(),
            historical_data: Vec::new(),
            current_price: 42_000.0,
            forecast_days: Some(days),
            model_type: Some(ModelType::Arima),
        };
        let result = ForecastResult {
            predictions: vec![ForecastPoint {
                date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                price: 42_100.5,
                confidence: 72,
                model: ENSEMBLE_LABEL.to_string(),
            }],
            accuracy: 71.25,
            model_type: ENSEMBLE_LABEL.to_string(),
            metrics: ForecastMetrics {
                mse: 0.01,
                mae: 0.05,
                rmse: 0.1,
                r2: 0.8,
            },
        };
        ForecastRun::new(&request, days, result)
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let db = Database::in_memory().await.unwrap();
        let repo = SqliteForecastRepository::new(db.pool.clone());

        let saved = run("bitcoin", 1);
        repo.save(&saved).await.unwrap();
        repo.save(&run("ethereum", 2)).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 2);

        let loaded = repo.find_recent("bitcoin", 5).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, saved.id);
        assert_eq!(loaded[0].model_type, ModelType::Arima);
        assert_eq!(loaded[0].result, saved.result);
        assert_eq!(
            loaded[0].created_at.timestamp_millis(),
            saved.created_at.timestamp_millis()
        );
    }

    #[tokio::test]
    async fn test_find_recent_orders_newest_first() {
        let db = Database::in_memory().await.unwrap();
        let repo = SqliteForecastRepository::new(db.pool.clone());

        for days in 1..=3 {
            repo.save(&run("bitcoin", days)).await.unwrap();
        }

        let recent = repo.find_recent("bitcoin", 2).await.unwrap();
        let days: Vec<u32> = recent.iter().map(|r| r.days).collect();
        assert_eq!(days, vec![3, 2]);
    }
}
