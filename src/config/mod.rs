//! Configuration module for Pricecast.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: Forecast, Sequence model, Storage, and Market data.

mod forecast_config;
mod market_data_config;
mod sequence_config;
mod storage_config;

pub use forecast_config::ForecastEnvConfig;
pub use market_data_config::CoinGeckoConfig;
pub use sequence_config::SequenceEnvConfig;
pub use storage_config::StorageEnvConfig;

use crate::application::forecasting::ForecastSettings;
use anyhow::{Context, Result};
use std::env;
use std::fmt::Display;
use std::str::FromStr;

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub forecast: ForecastEnvConfig,
    pub sequence: SequenceEnvConfig,
    pub storage: StorageEnvConfig,
    pub coingecko: CoinGeckoConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let forecast = ForecastEnvConfig::from_env().context("Failed to load forecast config")?;
        let sequence = SequenceEnvConfig::from_env().context("Failed to load LSTM config")?;
        let storage = StorageEnvConfig::from_env();
        let coingecko = CoinGeckoConfig::from_env();

        Ok(Self {
            forecast,
            sequence,
            storage,
            coingecko,
        })
    }

    pub fn to_forecast_settings(&self) -> ForecastSettings {
        ForecastSettings {
            mode: self.forecast.mode,
            default_days: self.forecast.default_days,
            training_budget: self.forecast.training_budget,
            min_history_points: self.forecast.min_history_points,
            parallel_training: self.forecast.parallel_training,
            heuristic_seed: self.forecast.heuristic_seed,
            sequence: self.sequence.to_model_config(),
        }
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr + Display,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<T>()
        .context(format!("Failed to parse {}", key))
}

fn parse_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<bool>()
        .unwrap_or(default)
}
