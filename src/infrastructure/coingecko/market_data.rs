use crate::config::CoinGeckoConfig;
use crate::domain::errors::UpstreamFetchError;
use crate::domain::market::{HistoricalPoint, normalize_history};
use crate::domain::ports::{HistoricalDataProvider, HistoryFetch};
use crate::infrastructure::core::http_client_factory::{HttpClientFactory, build_url_with_query};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// `/coins/{id}/market_chart` payload: `[timestamp_ms, value]` pairs.
#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    prices: Vec<[f64; 2]>,
    #[serde(default)]
    total_volumes: Vec<[f64; 2]>,
}

/// Daily price history from the CoinGecko public API.
pub struct CoinGeckoHistoryProvider {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: Option<String>,
    vs_currency: String,
}

impl CoinGeckoHistoryProvider {
    pub fn new(config: &CoinGeckoConfig) -> Self {
        Self {
            client: HttpClientFactory::create_client(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            vs_currency: config.vs_currency.clone(),
        }
    }

    fn market_chart_url(&self, coin_id: &str, days: u32) -> String {
        let days = days.to_string();
        build_url_with_query(
            &format!("{}/coins/{}/market_chart", self.base_url, coin_id),
            &[
                ("vs_currency", self.vs_currency.as_str()),
                ("days", days.as_str()),
                ("interval", "daily"),
            ],
        )
    }
}

#[async_trait]
impl HistoricalDataProvider for CoinGeckoHistoryProvider {
    async fn fetch_history(&self, coin_id: &str, days: u32) -> HistoryFetch {
        let url = self.market_chart_url(coin_id, days);
        info!("CoinGecko: fetching {} days of history for {}", days, coin_id);

        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header("x-cg-demo-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| UpstreamFetchError::Transport {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("CoinGecko: {} returned HTTP {}", coin_id, status);
            return Err(UpstreamFetchError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| UpstreamFetchError::Transport {
                reason: e.to_string(),
            })?;

        let points = parse_market_chart(coin_id, &body)?;
        debug!("CoinGecko: {} daily points for {}", points.len(), coin_id);
        Ok(points)
    }

    fn name(&self) -> &str {
        "CoinGecko"
    }
}

/// Converts a market_chart body into one point per calendar day.
///
/// Later samples of the same day win, `change24h` is the percent change
/// from the previous day.
pub fn parse_market_chart(coin_id: &str, body: &str) -> HistoryFetch {
    let chart: MarketChartResponse =
        serde_json::from_str(body).map_err(|e| UpstreamFetchError::Malformed {
            reason: e.to_string(),
        })?;

    let volumes: HashMap<NaiveDate, f64> = chart
        .total_volumes
        .iter()
        .filter_map(|[ts, volume]| Some((day_of(*ts)?, *volume)))
        .collect();

    let raw: Vec<HistoricalPoint> = chart
        .prices
        .iter()
        .map(|[ts, price]| {
            let date = day_of(*ts).ok_or_else(|| UpstreamFetchError::Malformed {
                reason: format!("invalid timestamp {}", ts),
            })?;
            Ok(HistoricalPoint {
                date,
                price: Some(*price),
                volume: volumes.get(&date).copied(),
                change24h: None,
            })
        })
        .collect::<Result<_, UpstreamFetchError>>()?;

    let mut points = normalize_history(&raw);
    if points.is_empty() {
        return Err(UpstreamFetchError::Empty {
            coin_id: coin_id.to_string(),
        });
    }

    for i in 1..points.len() {
        if let (Some(prev), Some(curr)) = (points[i - 1].valid_price(), points[i].valid_price()) {
            points[i].change24h = Some((curr - prev) / prev * 100.0);
        }
    }
    Ok(points)
}

fn day_of(timestamp_ms: f64) -> Option<NaiveDate> {
    if !timestamp_ms.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(timestamp_ms as i64).map(|dt| dt.date_naive())
}
