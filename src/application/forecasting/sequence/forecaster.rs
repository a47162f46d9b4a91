use super::dataset::{WindowedDataset, training_windows};
use super::early_stopping::{EarlyStopping, EpochVerdict};
use super::network::{NetworkShape, SequenceNetwork};
use super::optimizer::Adam;
use super::scaler::MinMaxScaler;
use crate::application::forecasting::cancellation::CancellationFlag;
use crate::application::forecasting::metrics::regression_metrics;
use crate::domain::errors::ForecastError;
use crate::domain::forecasting::{
    FEATURE_COUNT, FeatureSeries, ForecastMetrics, PRICE_FEATURE, PRICE_FLOOR,
};
use ndarray::{Array2, s};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

/// Hyper-parameters of the sequence model.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceModelConfig {
    pub window: usize,
    pub hidden_units: usize,
    pub layers: usize,
    pub dense_units: usize,
    pub dropout: f64,
    pub epochs: usize,
    pub batch_size: usize,
    pub patience: usize,
    pub learning_rate: f64,
    pub validation_split: f64,
    pub seed: u64,
}

impl Default for SequenceModelConfig {
    fn default() -> Self {
        Self {
            window: 60,
            hidden_units: 50,
            layers: 3,
            dense_units: 25,
            dropout: 0.2,
            epochs: 100,
            batch_size: 32,
            patience: 10,
            learning_rate: 0.001,
            validation_split: 0.2,
            seed: 42,
        }
    }
}

impl SequenceModelConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.window == 0 {
            return Err("window must be at least 1".to_string());
        }
        if self.hidden_units == 0 || self.layers == 0 || self.dense_units == 0 {
            return Err("network dimensions must be non-zero".to_string());
        }
        if self.batch_size == 0 {
            return Err("batch size must be at least 1".to_string());
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(format!("dropout {} outside [0, 1)", self.dropout));
        }
        if !(0.0..1.0).contains(&self.validation_split) {
            return Err(format!(
                "validation split {} outside [0, 1)",
                self.validation_split
            ));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(format!("learning rate {} must be positive", self.learning_rate));
        }
        Ok(())
    }

    fn shape(&self) -> NetworkShape {
        NetworkShape {
            input_size: FEATURE_COUNT,
            hidden_units: self.hidden_units,
            layers: self.layers,
            dense_units: self.dense_units,
            dropout: self.dropout,
        }
    }
}

/// Trains the LSTM sequence model on engineered features.
#[derive(Debug, Clone, Default)]
pub struct SequenceForecaster {
    config: SequenceModelConfig,
}

impl SequenceForecaster {
    pub fn new(config: SequenceModelConfig) -> Self {
        Self { config }
    }

    pub fn train(
        &self,
        features: &FeatureSeries,
        cancel: &CancellationFlag,
    ) -> Result<TrainedSequenceModel, ForecastError> {
        let config = &self.config;
        config
            .validate()
            .map_err(|reason| ForecastError::Training { reason })?;

        let rows = features.matrix();
        let window = config.window;
        if rows.len() <= window {
            return Err(ForecastError::InsufficientData {
                required: window + 1,
                available: rows.len(),
            });
        }

        let total_windows = rows.len() - window;
        let n_train = training_windows(total_windows, config.validation_split);
        // Scaling statistics come from rows seen by training windows and targets
        let scaler = MinMaxScaler::fit(&rows[..n_train + window]);
        let scaled = scaler.transform(&rows);
        let dataset = WindowedDataset::from_rows(&scaled, window);
        let (train_set, validation_set) = dataset.split_at(n_train);
        let monitor = if validation_set.is_empty() {
            &train_set
        } else {
            &validation_set
        };

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut network = SequenceNetwork::new(config.shape(), &mut rng);
        let mut optimizer = Adam::new(&network, config.learning_rate);
        let mut stopper = EarlyStopping::new(config.patience);

        debug!(
            "SequenceForecaster: {} training windows, {} validation windows",
            train_set.len(),
            validation_set.len()
        );

        let mut epochs_run = 0;
        for epoch in 0..config.epochs {
            let train_loss = run_epoch(
                &mut network,
                &mut optimizer,
                &train_set,
                config.batch_size,
                &mut rng,
                cancel,
            )?;
            epochs_run = epoch + 1;

            let monitored = mean_squared_error(&network, monitor);
            debug!(
                "SequenceForecaster: epoch {} train_loss={:.6} monitored_loss={:.6}",
                epoch + 1,
                train_loss,
                monitored
            );

            if stopper.observe(epoch, monitored, &network) == EpochVerdict::Stop {
                info!(
                    "SequenceForecaster: early stop after {} epochs (best epoch {})",
                    epochs_run,
                    stopper.best_epoch() + 1
                );
                break;
            }
        }
        stopper.restore_best(&mut network);

        let predictions: Vec<f64> = (0..monitor.len())
            .map(|i| network.predict(monitor.window(i)))
            .collect();
        let metrics = regression_metrics(monitor.targets().as_slice().unwrap_or(&[]), &predictions);
        let accuracy = (100.0 - metrics.mae * 100.0).clamp(50.0, 95.0);

        info!(
            "SequenceForecaster: trained {} epochs, mae={:.4}, r2={:.4}, accuracy={:.2}%",
            epochs_run, metrics.mae, metrics.r2, accuracy
        );

        let last_window = scaled.slice(s![rows.len() - window.., ..]).to_owned();

        Ok(TrainedSequenceModel {
            network,
            scaler,
            last_window,
            metrics,
            accuracy,
            epochs_run,
        })
    }
}

fn run_epoch(
    network: &mut SequenceNetwork,
    optimizer: &mut Adam,
    data: &WindowedDataset,
    batch_size: usize,
    rng: &mut StdRng,
    cancel: &CancellationFlag,
) -> Result<f64, ForecastError> {
    let mut total_loss = 0.0;

    for start in (0..data.len()).step_by(batch_size) {
        if cancel.is_cancelled() {
            return Err(ForecastError::Cancelled);
        }

        let end = (start + batch_size).min(data.len());
        let scale = 1.0 / (end - start) as f64;
        let mut grads = network.zeros_like();

        for i in start..end {
            let target = data.target(i);
            let predicted =
                network.accumulate_gradients(data.window(i), target, scale, rng, &mut grads);
            total_loss += (predicted - target).powi(2);
        }

        optimizer.step(network, &grads);
    }

    Ok(total_loss / data.len().max(1) as f64)
}

fn mean_squared_error(network: &SequenceNetwork, data: &WindowedDataset) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let total: f64 = (0..data.len())
        .map(|i| (network.predict(data.window(i)) - data.target(i)).powi(2))
        .sum();
    total / data.len() as f64
}

/// A trained sequence model with its scaler and the last observed window.
#[derive(Debug, Clone)]
pub struct TrainedSequenceModel {
    network: SequenceNetwork,
    scaler: MinMaxScaler,
    last_window: Array2<f64>,
    metrics: ForecastMetrics,
    accuracy: f64,
    epochs_run: usize,
}

impl TrainedSequenceModel {
    /// Validation accuracy in `[50, 95]`
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    pub fn metrics(&self) -> ForecastMetrics {
        self.metrics
    }

    pub fn epochs_run(&self) -> usize {
        self.epochs_run
    }

    /// Self-feeding multi-step forecast in native price units.
    pub fn forecast(&self, days: usize) -> Vec<f64> {
        let mut window = self.last_window.clone();
        (0..days)
            .map(|_| {
                let next = self.network.predict(window.view());
                roll_window(&mut window, next, &self.scaler)
            })
            .collect()
    }
}

/// Append a row carrying `scaled_price` and the latest other features, drop
/// the oldest row, and return the price in native units.
fn roll_window(window: &mut Array2<f64>, scaled_price: f64, scaler: &MinMaxScaler) -> f64 {
    let steps = window.nrows();
    if steps > 0 {
        let mut newest = window.row(steps - 1).to_owned();
        newest[PRICE_FEATURE] = scaled_price;
        let shifted = window.slice(s![1.., ..]).to_owned();
        window.slice_mut(s![..steps - 1, ..]).assign(&shifted);
        window.row_mut(steps - 1).assign(&newest);
    }
    scaler.unscale(PRICE_FEATURE, scaled_price).max(PRICE_FLOOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::forecasting::FeatureVector;
    use chrono::{Duration, NaiveDate};

    fn tiny_config() -> SequenceModelConfig {
        SequenceModelConfig {
            window: 8,
            hidden_units: 4,
            layers: 2,
            dense_units: 3,
            epochs: 4,
            batch_size: 8,
            patience: 2,
            learning_rate: 0.01,
            ..SequenceModelConfig::default()
        }
    }

    fn series(prices: &[f64]) -> FeatureSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        FeatureSeries {
            dates: (0..prices.len())
                .map(|i| start + Duration::days(i as i64))
                .collect(),
            rows: prices
                .iter()
                .map(|&price| FeatureVector {
                    price,
                    volume: 1_000.0,
                    volatility: 0.0,
                    sma20: price,
                    sma50: price,
                    rsi: 50.0,
                })
                .collect(),
        }
    }

    #[test]
    fn test_constant_series_forecasts_the_constant() {
        let model = SequenceForecaster::new(tiny_config())
            .train(&series(&[73.5; 40]), &CancellationFlag::new())
            .unwrap();

        assert_eq!(model.forecast(5), vec![73.5; 5]);
        assert_eq!(model.metrics().mae, 0.0);
        assert_eq!(model.accuracy(), 95.0);
    }

    #[test]
    fn test_forecast_is_positive_and_finite() {
        let prices: Vec<f64> = (0..60)
            .map(|i| 100.0 + 10.0 * (i as f64 * 0.3).sin())
            .collect();
        let model = SequenceForecaster::new(tiny_config())
            .train(&series(&prices), &CancellationFlag::new())
            .unwrap();

        let forecast = model.forecast(6);
        assert_eq!(forecast.len(), 6);
        assert!(forecast.iter().all(|p| p.is_finite() && *p >= PRICE_FLOOR));
        assert!((50.0..=95.0).contains(&model.accuracy()));
        assert!(model.epochs_run() >= 1 && model.epochs_run() <= 4);
    }

    #[test]
    fn test_training_is_reproducible() {
        let prices: Vec<f64> = (0..50).map(|i| 20.0 + i as f64 * 0.5).collect();
        let forecaster = SequenceForecaster::new(tiny_config());

        let first = forecaster.train(&series(&prices), &CancellationFlag::new()).unwrap();
        let second = forecaster.train(&series(&prices), &CancellationFlag::new()).unwrap();
        assert_eq!(first.forecast(3), second.forecast(3));
    }

    #[test]
    fn test_short_series_is_insufficient() {
        let result = SequenceForecaster::new(tiny_config())
            .train(&series(&[1.0; 8]), &CancellationFlag::new());
        assert!(matches!(
            result,
            Err(ForecastError::InsufficientData { required: 9, available: 8 })
        ));
    }

    #[test]
    fn test_cancellation_stops_training() {
        let flag = CancellationFlag::new();
        flag.cancel();
        let result = SequenceForecaster::new(tiny_config()).train(&series(&[5.0; 30]), &flag);
        assert!(matches!(result, Err(ForecastError::Cancelled)));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = SequenceModelConfig {
            dropout: 1.0,
            ..tiny_config()
        };
        let result = SequenceForecaster::new(config).train(&series(&[5.0; 30]), &CancellationFlag::new());
        assert!(matches!(result, Err(ForecastError::Training { .. })));
    }

    #[test]
    fn test_roll_window_shifts_and_unscales() {
        let scaler = MinMaxScaler::fit(&[[10.0, 0.0, 0.0, 0.0, 0.0, 0.0], [20.0, 1.0, 1.0, 1.0, 1.0, 1.0]]);
        let mut window = Array2::from_shape_fn((3, FEATURE_COUNT), |(t, k)| (t * 10 + k) as f64);

        let price = roll_window(&mut window, 0.5, &scaler);
        assert_eq!(price, 15.0);
        assert_eq!(window[[0, 1]], 11.0);
        assert_eq!(window[[2, PRICE_FEATURE]], 0.5);
        assert_eq!(window[[2, 1]], 21.0);
    }
}
