use crate::domain::market::history::HistoricalPoint;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Label shared by every point of a trained-ensemble forecast.
pub const ENSEMBLE_LABEL: &str = "LSTM-ARIMA Ensemble";

/// Smallest price any forecaster may emit.
pub const PRICE_FLOOR: f64 = 0.0001;

/// Caller-facing model family selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ModelType {
    #[default]
    #[serde(rename = "LSTM")]
    Lstm,
    #[serde(rename = "ARIMA")]
    Arima,
}

impl ModelType {
    pub fn label(&self) -> &'static str {
        match self {
            ModelType::Lstm => "LSTM",
            ModelType::Arima => "ARIMA",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for ModelType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LSTM" => Ok(ModelType::Lstm),
            "ARIMA" => Ok(ModelType::Arima),
            _ => anyhow::bail!("Invalid model type: {}. Must be 'LSTM' or 'ARIMA'", s),
        }
    }
}

/// Inbound forecast request, as produced by the transport layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub coin_id: String,
    pub symbol: String,
    pub historical_data: Vec<HistoricalPoint>,
    pub current_price: f64,
    #[serde(default)]
    pub forecast_days: Option<u32>,
    #[serde(default)]
    pub model_type: Option<ModelType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub price: f64,
    pub confidence: u8,
    pub model: String,
}

/// Validation metrics of the model that produced a forecast
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastMetrics {
    pub mse: f64,
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResult {
    pub predictions: Vec<ForecastPoint>,
    pub accuracy: f64,
    pub model_type: String,
    pub metrics: ForecastMetrics,
}

impl ForecastResult {
    pub fn horizon(&self) -> usize {
        self.predictions.len()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.predictions.iter().map(|p| p.price).collect()
    }
}

/// A completed forecast as handed to the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRun {
    pub id: Uuid,
    pub coin_id: String,
    pub symbol: String,
    pub model_type: ModelType,
    pub days: u32,
    pub current_price: f64,
    pub result: ForecastResult,
    pub created_at: DateTime<Utc>,
}

impl ForecastRun {
    pub fn new(request: &ForecastRequest, days: u32, result: ForecastResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            coin_id: request.coin_id.clone(),
            symbol: request.symbol.clone(),
            model_type: request.model_type.unwrap_or_default(),
            days,
            current_price: request.current_price,
            result,
            created_at: Utc::now(),
        }
    }
}
