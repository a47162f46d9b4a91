use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of engineered features per day.
pub const FEATURE_COUNT: usize = 6;

/// Column index of the price inside a feature row.
pub const PRICE_FEATURE: usize = 0;

/// Engineered features for a single historical day. All fields are finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub price: f64,
    pub volume: f64,
    pub volatility: f64,
    pub sma20: f64,
    pub sma50: f64,
    pub rsi: f64,
}

impl FeatureVector {
    /// Fixed column order: price, volume, volatility, sma20, sma50, rsi.
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.price,
            self.volume,
            self.volatility,
            self.sma20,
            self.sma50,
            self.rsi,
        ]
    }
}

/// Gap-free feature rows aligned with their calendar days.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSeries {
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<FeatureVector>,
}

impl FeatureSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.price).collect()
    }

    /// Row-major matrix view, one `[f64; FEATURE_COUNT]` per day.
    pub fn matrix(&self) -> Vec<[f64; FEATURE_COUNT]> {
        self.rows.iter().map(FeatureVector::to_array).collect()
    }
}
