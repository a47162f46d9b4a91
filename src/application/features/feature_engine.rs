use super::indicators::{
    RSI_PERIOD, fill_gaps, pct_change, relative_strength_index, rolling_mean, rolling_std,
};
use crate::domain::errors::ForecastError;
use crate::domain::forecasting::{FeatureSeries, FeatureVector};
use crate::domain::market::{HistoricalPoint, normalize_history};
use chrono::NaiveDate;
use statrs::statistics::{Data, Distribution};
use tracing::debug;

/// Minimum usable history required before any model is trained.
pub const DEFAULT_MIN_POINTS: usize = 100;

const VOLATILITY_WINDOW: usize = 20;
const SMA_FAST: usize = 20;
const SMA_SLOW: usize = 50;

/// Turns raw daily history into gap-free feature rows.
///
/// Days are sorted and de-duplicated (last occurrence wins). Missing prices
/// are carried forward; leading days with no price at all are not usable and
/// are dropped. Missing volumes take the mean of the known volumes.
#[derive(Debug, Clone)]
pub struct FeatureEngine {
    min_points: usize,
}

impl Default for FeatureEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_POINTS)
    }
}

impl FeatureEngine {
    pub fn new(min_points: usize) -> Self {
        Self { min_points }
    }

    pub fn build(&self, history: &[HistoricalPoint]) -> Result<FeatureSeries, ForecastError> {
        let normalized = normalize_history(history);

        let mut dates: Vec<NaiveDate> = Vec::with_capacity(normalized.len());
        let mut prices: Vec<f64> = Vec::with_capacity(normalized.len());
        let mut volumes: Vec<Option<f64>> = Vec::with_capacity(normalized.len());

        let mut last_price: Option<f64> = None;
        for point in &normalized {
            if let Some(price) = point.valid_price() {
                last_price = Some(price);
            }
            let Some(price) = last_price else {
                continue;
            };
            dates.push(point.date);
            prices.push(price);
            volumes.push(point.valid_volume());
        }

        if prices.len() < self.min_points {
            return Err(ForecastError::InsufficientData {
                required: self.min_points,
                available: prices.len(),
            });
        }

        let known_volumes: Vec<f64> = volumes.iter().flatten().copied().collect();
        let volume_fill = if known_volumes.is_empty() {
            0.0
        } else {
            Data::new(known_volumes).mean().unwrap_or(0.0)
        };
        let volumes: Vec<f64> = volumes
            .into_iter()
            .map(|v| v.unwrap_or(volume_fill))
            .collect();

        let price_column: Vec<Option<f64>> = prices.iter().copied().map(Some).collect();
        let volatility = fill_gaps(rolling_std(&pct_change(&prices), VOLATILITY_WINDOW));
        let sma20 = fill_gaps(rolling_mean(&price_column, SMA_FAST));
        let sma50 = fill_gaps(rolling_mean(&price_column, SMA_SLOW));
        let rsi = fill_gaps(relative_strength_index(&prices, RSI_PERIOD));

        let rows = (0..prices.len())
            .map(|i| FeatureVector {
                price: prices[i],
                volume: volumes[i],
                volatility: volatility[i],
                sma20: sma20[i],
                sma50: sma50[i],
                rsi: rsi[i],
            })
            .collect();

        debug!(
            "FeatureEngine: {} usable days from {} raw points ({} dropped)",
            prices.len(),
            history.len(),
            normalized.len() - prices.len()
        );

        Ok(FeatureSeries { dates, rows })
    }
}
