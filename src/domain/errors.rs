use crate::domain::forecasting::order::ModelOrder;
use thiserror::Error;

/// Errors surfaced to the caller of a forecast
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Insufficient data: need at least {required} usable points, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Model not trained: {model} prediction requested before training completed")]
    ModelNotTrained { model: String },

    #[error("Invalid forecast request: {reason}")]
    InvalidInput { reason: String },

    #[error("Statistical model fit failed for order {order}: {source}")]
    StatisticalFit {
        order: ModelOrder,
        #[source]
        source: FitError,
    },

    #[error("Training failed: {reason}")]
    Training { reason: String },

    #[error("Forecast cancelled before training completed")]
    Cancelled,
}

/// Reasons a single ARIMA fit can fail.
///
/// During order search these are recorded per order and skipped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("need {needed} observations, have {available}")]
    InsufficientObservations { needed: usize, available: usize },

    #[error("singular normal equations")]
    Singular,

    #[error("moving-average polynomial is not invertible")]
    NonInvertible,

    #[error("non-finite residuals")]
    NonFinite,

    #[error("cancelled")]
    Cancelled,
}

/// Failure reported by a historical data provider.
///
/// Providers return this as a value; the forecast service turns it into
/// an input-validation failure.
#[derive(Debug, Clone, Error)]
pub enum UpstreamFetchError {
    #[error("Upstream returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Upstream request failed: {reason}")]
    Transport { reason: String },

    #[error("Malformed upstream payload: {reason}")]
    Malformed { reason: String },

    #[error("Upstream returned no data for {coin_id}")]
    Empty { coin_id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_data_formatting() {
        let error = ForecastError::InsufficientData {
            required: 100,
            available: 42,
        };

        let msg = error.to_string();
        assert!(msg.contains("100"));
        assert!(msg.contains("42"));
    }

    #[test]
    fn test_statistical_fit_formatting() {
        let error = ForecastError::StatisticalFit {
            order: ModelOrder::new(1, 1, 1),
            source: FitError::Singular,
        };

        let msg = error.to_string();
        assert!(msg.contains("(1,1,1)"));
        assert!(msg.contains("singular"));
    }

    #[test]
    fn test_upstream_error_formatting() {
        let error = UpstreamFetchError::Http {
            status: 429,
            body: "rate limited".to_string(),
        };

        assert!(error.to_string().contains("429"));
    }
}
