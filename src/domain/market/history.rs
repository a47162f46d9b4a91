use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of raw market history.
///
/// `price` is optional on the wire so that gaps can be expressed; a
/// non-finite or non-positive price counts as missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub date: NaiveDate,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub change24h: Option<f64>,
}

impl HistoricalPoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self {
            date,
            price: Some(price),
            volume: None,
            change24h: None,
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Price if it is usable (finite and strictly positive).
    pub fn valid_price(&self) -> Option<f64> {
        self.price.filter(|p| p.is_finite() && *p > 0.0)
    }

    /// Volume if it is usable (finite and non-negative).
    pub fn valid_volume(&self) -> Option<f64> {
        self.volume.filter(|v| v.is_finite() && *v >= 0.0)
    }
}

/// Sorts points by date and keeps the last occurrence of each duplicated day.
pub fn normalize_history(points: &[HistoricalPoint]) -> Vec<HistoricalPoint> {
    let mut sorted = points.to_vec();
    // Stable sort keeps arrival order among equal dates
    sorted.sort_by_key(|p| p.date);

    let mut out: Vec<HistoricalPoint> = Vec::with_capacity(sorted.len());
    for point in sorted {
        match out.last_mut() {
            Some(last) if last.date == point.date => *last = point,
            _ => out.push(point),
        }
    }
    out
}

/// Prices that are usable as-is, in date order.
pub fn known_prices(points: &[HistoricalPoint]) -> Vec<f64> {
    normalize_history(points)
        .iter()
        .filter_map(HistoricalPoint::valid_price)
        .collect()
}
