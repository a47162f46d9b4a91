use super::arima::ArimaFit;
use super::order_search::{fit_candidates, select_lowest_aic};
use crate::application::forecasting::cancellation::CancellationFlag;
use crate::domain::errors::{FitError, ForecastError};
use crate::domain::forecasting::ModelOrder;
use tracing::{debug, info, warn};

/// Selects and fits an ARIMA model by AIC over the standard order grid.
#[derive(Debug, Clone)]
pub struct StatisticalForecaster {
    orders: Vec<ModelOrder>,
}

impl Default for StatisticalForecaster {
    fn default() -> Self {
        Self {
            orders: ModelOrder::grid(),
        }
    }
}

impl StatisticalForecaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit all candidate orders and keep the lowest-AIC model.
    ///
    /// When no candidate fits, the default order is fitted directly and its
    /// failure is surfaced as `ForecastError::StatisticalFit`.
    pub fn train(
        &self,
        prices: &[f64],
        cancel: &CancellationFlag,
    ) -> Result<TrainedStatisticalModel, ForecastError> {
        if cancel.is_cancelled() {
            return Err(ForecastError::Cancelled);
        }

        let outcomes = fit_candidates(prices, &self.orders, cancel);
        for outcome in &outcomes {
            if let Err(e) = &outcome.result {
                debug!("StatisticalForecaster: order {} skipped: {}", outcome.order, e);
            }
        }

        if cancel.is_cancelled() {
            return Err(ForecastError::Cancelled);
        }

        let fit = match select_lowest_aic(outcomes) {
            Some(fit) => fit,
            None => {
                warn!(
                    "StatisticalForecaster: no candidate order fitted, falling back to {}",
                    ModelOrder::DEFAULT
                );
                ArimaFit::fit(prices, ModelOrder::DEFAULT).map_err(|source| match source {
                    FitError::Cancelled => ForecastError::Cancelled,
                    source => ForecastError::StatisticalFit {
                        order: ModelOrder::DEFAULT,
                        source,
                    },
                })?
            }
        };

        let accuracy = fit.accuracy();
        info!(
            "StatisticalForecaster: selected ARIMA{} (AIC {:.2}, accuracy {:.2}%)",
            fit.order, fit.aic, accuracy
        );

        Ok(TrainedStatisticalModel { fit, accuracy })
    }
}

/// A fitted statistical model ready to forecast.
#[derive(Debug, Clone)]
pub struct TrainedStatisticalModel {
    fit: ArimaFit,
    accuracy: f64,
}

impl TrainedStatisticalModel {
    pub fn order(&self) -> ModelOrder {
        self.fit.order
    }

    /// In-sample accuracy in `[50, 90]`
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    pub fn forecast(&self, days: usize) -> Vec<f64> {
        self.fit.forecast(days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::forecasting::PRICE_FLOOR;

    #[test]
    fn test_constant_series_forecasts_flat() {
        let prices = vec![250.0; 120];
        let model = StatisticalForecaster::new()
            .train(&prices, &CancellationFlag::new())
            .unwrap();

        // Only the parameter-free orders avoid singular regressions here
        assert_eq!((model.order().p, model.order().q), (0, 0));
        assert_eq!(model.forecast(7), vec![250.0; 7]);
    }

    #[test]
    fn test_trending_series_keeps_rising() {
        let prices: Vec<f64> = (0..150)
            .map(|i| 1000.0 + 5.0 * i as f64 + 3.0 * (i as f64 * 0.9).sin())
            .collect();
        let model = StatisticalForecaster::new()
            .train(&prices, &CancellationFlag::new())
            .unwrap();

        let forecast = model.forecast(7);
        assert_eq!(forecast.len(), 7);
        assert!(forecast.iter().all(|p| *p >= PRICE_FLOOR && p.is_finite()));
        assert!(forecast[6] > prices[0]);
        assert!((50.0..=90.0).contains(&model.accuracy()));
    }

    #[test]
    fn test_cancelled_before_start() {
        let flag = CancellationFlag::new();
        flag.cancel();
        let result = StatisticalForecaster::new().train(&[1.0; 120], &flag);
        assert!(matches!(result, Err(ForecastError::Cancelled)));
    }

    #[test]
    fn test_unfittable_series_reports_default_order() {
        let result = StatisticalForecaster::new().train(&[1.0, 2.0, 3.0], &CancellationFlag::new());
        match result {
            Err(ForecastError::StatisticalFit { order, .. }) => {
                assert_eq!(order, ModelOrder::DEFAULT)
            }
            other => panic!("expected StatisticalFit, got {:?}", other),
        }
    }
}
