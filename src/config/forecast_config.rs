//! Forecast service configuration parsing from environment variables.

use super::{parse_bool, parse_var};
use crate::application::features::DEFAULT_MIN_POINTS;
use crate::application::forecasting::ForecastMode;
use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Forecast environment configuration
#[derive(Debug, Clone)]
pub struct ForecastEnvConfig {
    pub mode: ForecastMode,
    pub default_days: u32,
    pub training_budget: Duration,
    pub min_history_points: usize,
    pub parallel_training: bool,
    pub heuristic_seed: Option<u64>,
}

impl ForecastEnvConfig {
    pub fn from_env() -> Result<Self> {
        let mode_str = env::var("FORECAST_MODE").unwrap_or_else(|_| "trained".to_string());
        let mode = ForecastMode::from_str(&mode_str)?;

        let default_days = parse_var("FORECAST_DEFAULT_DAYS", 7u32)?;
        if default_days == 0 {
            anyhow::bail!("FORECAST_DEFAULT_DAYS must be positive");
        }

        let heuristic_seed = match env::var("HEURISTIC_SEED") {
            Ok(raw) => Some(
                raw.parse::<u64>()
                    .context("Failed to parse HEURISTIC_SEED")?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            mode,
            default_days,
            training_budget: Duration::from_secs(parse_var("TRAINING_BUDGET_SECS", 120u64)?),
            min_history_points: parse_var("MIN_HISTORY_POINTS", DEFAULT_MIN_POINTS)?,
            parallel_training: parse_bool("PARALLEL_TRAINING", true),
            heuristic_seed,
        })
    }
}
