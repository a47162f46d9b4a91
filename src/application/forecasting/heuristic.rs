//! Fast heuristic forecasts used instead of full training
//!
//! Two cheap generators stand in for the trained models: a drift walk for
//! the statistical family and a momentum/mean-reversion walk for the
//! sequence family. Neither learns anything, so confidence decays on a
//! fixed schedule.

use crate::domain::forecasting::{
    ForecastMetrics, ForecastPoint, ForecastResult, ModelType, PRICE_FLOOR,
};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Accuracy reported for every heuristic forecast.
pub const HEURISTIC_ACCURACY: f64 = 75.0;

const DRIFT_LOOKBACK: usize = 5;
const DRIFT_NOISE: f64 = 0.25;
const MOMENTUM_LOOKBACK: usize = 10;
const MOMENTUM_WEIGHT: f64 = 0.01;
const REVERSION_WEIGHT: f64 = 0.05;
const MOMENTUM_NOISE: f64 = 0.02;
const MIN_DENOMINATOR: f64 = 1e-8;

/// Which heuristic stands in for which model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeuristicVariant {
    Drift,
    Momentum,
}

impl HeuristicVariant {
    pub fn label(&self) -> &'static str {
        match self {
            HeuristicVariant::Drift => ModelType::Arima.label(),
            HeuristicVariant::Momentum => ModelType::Lstm.label(),
        }
    }
}

impl From<ModelType> for HeuristicVariant {
    fn from(model_type: ModelType) -> Self {
        match model_type {
            ModelType::Arima => HeuristicVariant::Drift,
            ModelType::Lstm => HeuristicVariant::Momentum,
        }
    }
}

/// Fixed confidence schedule, `step` is 1-based.
pub fn heuristic_confidence(step: usize) -> u8 {
    let decayed = 90_i64 - 5 * step as i64;
    decayed.max(50) as u8
}

/// Average recent day-over-day change plus proportional uniform noise.
///
/// Fewer than five prices are replaced by five copies of `current_price`.
pub fn drift_path(prices: &[f64], current_price: f64, days: usize, rng: &mut StdRng) -> Vec<f64> {
    let padded;
    let history = if prices.len() < DRIFT_LOOKBACK {
        padded = vec![current_price; DRIFT_LOOKBACK];
        &padded[..]
    } else {
        prices
    };

    let diffs: Vec<f64> = history.windows(2).map(|w| w[1] - w[0]).collect();
    let recent = &diffs[diffs.len().saturating_sub(DRIFT_LOOKBACK)..];
    let drift = if recent.is_empty() {
        0.0
    } else {
        recent.iter().sum::<f64>() / recent.len() as f64
    };

    let mut price = current_price;
    (0..days)
        .map(|_| {
            let noise = rng.random_range(-DRIFT_NOISE..=DRIFT_NOISE) * drift.abs();
            price = (price + drift + noise).max(PRICE_FLOOR);
            price
        })
        .collect()
}

/// Momentum of the trailing window plus pull toward its mean and noise.
pub fn momentum_path(
    prices: &[f64],
    current_price: f64,
    days: usize,
    rng: &mut StdRng,
) -> Vec<f64> {
    let fallback = [current_price];
    let window = if prices.is_empty() {
        &fallback[..]
    } else {
        &prices[prices.len().saturating_sub(MOMENTUM_LOOKBACK)..]
    };

    let first = window[0];
    let last = window[window.len() - 1];
    let momentum = (last - first) / first.max(MIN_DENOMINATOR);
    let mean = window.iter().sum::<f64>() / window.len() as f64;

    let mut price = current_price;
    (0..days)
        .map(|_| {
            let reversion = REVERSION_WEIGHT * (mean - price) / price.max(MIN_DENOMINATOR);
            let noise = rng.random_range(-MOMENTUM_NOISE..=MOMENTUM_NOISE);
            price = (price * (1.0 + MOMENTUM_WEIGHT * momentum + reversion + noise)).max(PRICE_FLOOR);
            price
        })
        .collect()
}

/// Seeded generator for heuristic forecasts.
#[derive(Debug, Clone, Default)]
pub struct HeuristicForecaster {
    seed: Option<u64>,
}

impl HeuristicForecaster {
    /// `seed` fixes the noise; `None` draws a fresh seed per forecast.
    pub fn new(seed: Option<u64>) -> Self {
        Self { seed }
    }

    pub fn forecast(
        &self,
        variant: HeuristicVariant,
        prices: &[f64],
        current_price: f64,
        dates: &[NaiveDate],
    ) -> ForecastResult {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::rng().random()),
        };

        let days = dates.len();
        let path = match variant {
            HeuristicVariant::Drift => drift_path(prices, current_price, days, &mut rng),
            HeuristicVariant::Momentum => momentum_path(prices, current_price, days, &mut rng),
        };
        debug!(
            "HeuristicForecaster: {:?} path over {} days from {} prices",
            variant,
            days,
            prices.len()
        );

        let label = variant.label();
        let predictions = dates
            .iter()
            .zip(path)
            .enumerate()
            .map(|(i, (date, price))| ForecastPoint {
                date: *date,
                price,
                confidence: heuristic_confidence(i + 1),
                model: label.to_string(),
            })
            .collect();

        ForecastResult {
            predictions,
            accuracy: HEURISTIC_ACCURACY,
            model_type: label.to_string(),
            metrics: ForecastMetrics::default(),
        }
    }
}
