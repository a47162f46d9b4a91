//! Offline history from a CSV file with `date,price,volume` columns.
//!
//! Empty cells are gaps. The coin id passed to `fetch_history` is only used
//! in error messages; one file holds one asset.

use crate::domain::errors::UpstreamFetchError;
use crate::domain::market::{HistoricalPoint, normalize_history};
use crate::domain::ports::{HistoricalDataProvider, HistoryFetch};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::io::Read;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Deserialize)]
struct CsvRecord {
    date: NaiveDate,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    volume: Option<f64>,
}

pub struct CsvHistoryProvider {
    path: PathBuf,
}

impl CsvHistoryProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl HistoricalDataProvider for CsvHistoryProvider {
    async fn fetch_history(&self, coin_id: &str, days: u32) -> HistoryFetch {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| UpstreamFetchError::Transport {
                reason: format!("{}: {}", self.path.display(), e),
            })?;

        let mut points = parse_history_csv(coin_id, bytes.as_slice())?;
        let keep = (days as usize).max(1);
        if points.len() > keep {
            points.drain(..points.len() - keep);
        }

        info!(
            "CsvHistoryProvider: loaded {} points from {}",
            points.len(),
            self.path.display()
        );
        Ok(points)
    }

    fn name(&self) -> &str {
        "CSV"
    }
}

pub fn parse_history_csv<R: Read>(coin_id: &str, reader: R) -> HistoryFetch {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut raw = Vec::new();
    for record in csv_reader.deserialize::<CsvRecord>() {
        let record = record.map_err(|e| UpstreamFetchError::Malformed {
            reason: e.to_string(),
        })?;
        raw.push(HistoricalPoint {
            date: record.date,
            price: record.price,
            volume: record.volume,
            change24h: None,
        });
    }

    let points = normalize_history(&raw);
    if points.is_empty() {
        return Err(UpstreamFetchError::Empty {
            coin_id: coin_id.to_string(),
        });
    }
    Ok(points)
}
