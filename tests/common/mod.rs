#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use pricecast::application::forecasting::sequence::SequenceModelConfig;
use pricecast::application::forecasting::{ForecastMode, ForecastSettings};
use pricecast::domain::forecasting::{ForecastRequest, ModelType};
use pricecast::domain::market::HistoricalPoint;
use std::time::Duration as StdDuration;

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

pub fn history(prices: &[f64]) -> Vec<HistoricalPoint> {
    prices
        .iter()
        .enumerate()
        .map(|(i, p)| HistoricalPoint::new(start_date() + Duration::days(i as i64), *p))
        .collect()
}

pub fn request(prices: &[f64], days: u32, model_type: Option<ModelType>) -> ForecastRequest {
    ForecastRequest {
        coin_id: "bitcoin".to_string(),
        symbol: "BTC".to_string(),
        historical_data: history(prices),
        current_price: *prices.last().unwrap(),
        forecast_days: Some(days),
        model_type,
    }
}

/// Small network so trained-path tests stay fast.
pub fn small_network() -> SequenceModelConfig {
    SequenceModelConfig {
        window: 10,
        hidden_units: 6,
        layers: 2,
        dense_units: 4,
        epochs: 3,
        batch_size: 16,
        patience: 2,
        learning_rate: 0.01,
        ..SequenceModelConfig::default()
    }
}

pub fn trained_settings() -> ForecastSettings {
    ForecastSettings {
        mode: ForecastMode::Trained,
        training_budget: StdDuration::from_secs(300),
        heuristic_seed: Some(11),
        sequence: small_network(),
        ..ForecastSettings::default()
    }
}

pub fn linear_prices(days: usize) -> Vec<f64> {
    (0..days)
        .map(|i| 100.0 + i as f64 + 0.5 * (0.9 * i as f64).sin())
        .collect()
}

/// Full-size network with the production training schedule.
pub fn converged_settings() -> ForecastSettings {
    ForecastSettings {
        training_budget: StdDuration::from_secs(600),
        sequence: SequenceModelConfig::default(),
        ..trained_settings()
    }
}
