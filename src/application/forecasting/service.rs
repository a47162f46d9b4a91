//! Forecast orchestration
//!
//! Validates a request, derives features, trains both models on the blocking
//! pool under a time budget and blends them. When training is disabled or
//! the budget runs out, the fast heuristic variant answers instead.

use super::cancellation::{CancelOnDrop, CancellationFlag};
use super::heuristic::{HeuristicForecaster, HeuristicVariant};
use super::sequence::{SequenceForecaster, SequenceModelConfig};
use super::session::ForecastSession;
use super::statistical::StatisticalForecaster;
use crate::application::features::{DEFAULT_MIN_POINTS, FeatureEngine};
use crate::domain::errors::ForecastError;
use crate::domain::forecasting::{
    FeatureSeries, ForecastRequest, ForecastResult, ForecastRun, ModelType,
};
use crate::domain::market::{HistoricalPoint, known_prices, normalize_history};
use crate::domain::ports::HistoricalDataProvider;
use crate::domain::repositories::ForecastRepository;
use chrono::{Days, NaiveDate};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;
use tracing::{info, warn};

/// Longest horizon a request may ask for.
pub const MAX_FORECAST_DAYS: u32 = 365;

/// Days of history fetched when forecasting straight from a provider.
pub const HISTORY_LOOKBACK_DAYS: u32 = 365;

/// How forecasts are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForecastMode {
    /// Train the statistical and sequence models and blend them
    #[default]
    Trained,
    /// Skip training and use the heuristic variant directly
    Heuristic,
}

impl FromStr for ForecastMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trained" => Ok(ForecastMode::Trained),
            "heuristic" => Ok(ForecastMode::Heuristic),
            _ => anyhow::bail!(
                "Invalid FORECAST_MODE: {}. Must be 'trained' or 'heuristic'",
                s
            ),
        }
    }
}

/// Runtime knobs of the forecast service.
#[derive(Debug, Clone)]
pub struct ForecastSettings {
    pub mode: ForecastMode,
    pub default_days: u32,
    pub training_budget: Duration,
    pub min_history_points: usize,
    pub parallel_training: bool,
    pub heuristic_seed: Option<u64>,
    pub sequence: SequenceModelConfig,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            mode: ForecastMode::Trained,
            default_days: 7,
            training_budget: Duration::from_secs(120),
            min_history_points: DEFAULT_MIN_POINTS,
            parallel_training: true,
            heuristic_seed: None,
            sequence: SequenceModelConfig::default(),
        }
    }
}

pub struct ForecastService {
    settings: ForecastSettings,
    feature_engine: FeatureEngine,
    statistical: StatisticalForecaster,
    sequence: SequenceForecaster,
    heuristic: HeuristicForecaster,
    repository: Option<Arc<dyn ForecastRepository>>,
    history_provider: Option<Arc<dyn HistoricalDataProvider>>,
}

impl ForecastService {
    pub fn new(settings: ForecastSettings) -> Self {
        Self {
            feature_engine: FeatureEngine::new(settings.min_history_points),
            statistical: StatisticalForecaster::new(),
            sequence: SequenceForecaster::new(settings.sequence.clone()),
            heuristic: HeuristicForecaster::new(settings.heuristic_seed),
            repository: None,
            history_provider: None,
            settings,
        }
    }

    /// Persist every completed forecast (best-effort).
    pub fn with_repository(mut self, repository: Arc<dyn ForecastRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Source used by [`ForecastService::forecast_coin`].
    pub fn with_history_provider(mut self, provider: Arc<dyn HistoricalDataProvider>) -> Self {
        self.history_provider = Some(provider);
        self
    }

    pub fn settings(&self) -> &ForecastSettings {
        &self.settings
    }

    pub async fn forecast(&self, request: &ForecastRequest) -> Result<ForecastResult, ForecastError> {
        let days = self.validate(request)?;
        let history = normalize_history(&request.historical_data);
        let dates = forecast_dates(&history, days)?;
        let model_type = request.model_type.unwrap_or_default();

        info!(
            "ForecastService: {} ({}) {} days, mode={:?}, model_type={}",
            request.coin_id, request.symbol, days, self.settings.mode, model_type
        );

        let result = match self.settings.mode {
            ForecastMode::Heuristic => self.heuristic.forecast(
                HeuristicVariant::from(model_type),
                &known_prices(&history),
                request.current_price,
                &dates,
            ),
            ForecastMode::Trained => {
                let features = self.feature_engine.build(&history)?;
                match self.train_within_budget(features).await? {
                    Some(session) => session.predict(&dates)?,
                    None => {
                        warn!(
                            "ForecastService: training budget of {:?} exhausted for {}, using {} heuristic",
                            self.settings.training_budget,
                            request.coin_id,
                            HeuristicVariant::from(model_type).label()
                        );
                        self.heuristic.forecast(
                            HeuristicVariant::from(model_type),
                            &known_prices(&history),
                            request.current_price,
                            &dates,
                        )
                    }
                }
            }
        };

        info!(
            "ForecastService: {} forecast ready ({} points, accuracy {:.2})",
            result.model_type,
            result.horizon(),
            result.accuracy
        );

        self.persist(request, days, &result).await;
        Ok(result)
    }

    /// Fetch history from the configured provider, then forecast.
    ///
    /// Provider failures are reported as invalid input.
    pub async fn forecast_coin(
        &self,
        coin_id: &str,
        symbol: &str,
        forecast_days: Option<u32>,
        model_type: Option<ModelType>,
    ) -> Result<ForecastResult, ForecastError> {
        let provider = self
            .history_provider
            .as_ref()
            .ok_or_else(|| ForecastError::InvalidInput {
                reason: "no historical data provider configured".to_string(),
            })?;

        let historical_data = provider
            .fetch_history(coin_id, HISTORY_LOOKBACK_DAYS)
            .await
            .map_err(|e| ForecastError::InvalidInput {
                reason: format!("{} history unavailable: {}", provider.name(), e),
            })?;

        let current_price = known_prices(&historical_data)
            .last()
            .copied()
            .ok_or_else(|| ForecastError::InvalidInput {
                reason: format!("no usable prices for {}", coin_id),
            })?;

        let request = ForecastRequest {
            coin_id: coin_id.to_string(),
            symbol: symbol.to_string(),
            historical_data,
            current_price,
            forecast_days,
            model_type,
        };
        self.forecast(&request).await
    }

    fn validate(&self, request: &ForecastRequest) -> Result<u32, ForecastError> {
        let days = request.forecast_days.unwrap_or(self.settings.default_days);
        if days == 0 || days > MAX_FORECAST_DAYS {
            return Err(ForecastError::InvalidInput {
                reason: format!(
                    "forecast_days must be between 1 and {}, got {}",
                    MAX_FORECAST_DAYS, days
                ),
            });
        }
        if request.historical_data.is_empty() {
            return Err(ForecastError::InvalidInput {
                reason: "historical_data is empty".to_string(),
            });
        }
        if !(request.current_price.is_finite() && request.current_price > 0.0) {
            return Err(ForecastError::InvalidInput {
                reason: format!("current_price must be positive, got {}", request.current_price),
            });
        }
        Ok(days)
    }

    /// Train both models, or return `None` when the budget expires first.
    ///
    /// Expiry and dropping this future both raise the cancellation flag so
    /// the blocking training work stops at its next checkpoint.
    async fn train_within_budget(
        &self,
        features: FeatureSeries,
    ) -> Result<Option<ForecastSession>, ForecastError> {
        if self.settings.training_budget.is_zero() {
            return Ok(None);
        }

        let cancel = CancellationFlag::new();
        let guard = CancelOnDrop::new(cancel.clone());
        let outcome = tokio::time::timeout(
            self.settings.training_budget,
            self.train_session(features, cancel.clone()),
        )
        .await;
        guard.disarm();

        match outcome {
            Ok(session) => session.map(Some),
            Err(_) => {
                cancel.cancel();
                Ok(None)
            }
        }
    }

    async fn train_session(
        &self,
        features: FeatureSeries,
        cancel: CancellationFlag,
    ) -> Result<ForecastSession, ForecastError> {
        let prices = features.prices();
        let statistical = self.statistical.clone();
        let sequence = self.sequence.clone();

        let (statistical_model, sequence_model) = if self.settings.parallel_training {
            join_cancelling(
                cancel,
                move |cancel| statistical.train(&prices, cancel),
                move |cancel| sequence.train(&features, cancel),
            )
            .await?
        } else {
            tokio::task::spawn_blocking(move || {
                let statistical_model = statistical.train(&prices, &cancel)?;
                let sequence_model = sequence.train(&features, &cancel)?;
                Ok::<_, ForecastError>((statistical_model, sequence_model))
            })
            .await
            .map_err(training_crashed)??
        };

        Ok(ForecastSession::with_models(statistical_model, sequence_model))
    }

    async fn persist(&self, request: &ForecastRequest, days: u32, result: &ForecastResult) {
        let Some(repository) = &self.repository else {
            return;
        };

        let run = ForecastRun::new(request, days, result.clone());
        if let Err(e) = repository.save(&run).await {
            warn!(
                "ForecastService: failed to persist forecast for {}: {:#}",
                request.coin_id, e
            );
        }
    }
}

/// Runs both trainings on the blocking pool. The first one to fail raises
/// the shared flag so the other stops at its next checkpoint.
async fn join_cancelling<A, B, FA, FB>(
    cancel: CancellationFlag,
    left: FA,
    right: FB,
) -> Result<(A, B), ForecastError>
where
    A: Send + 'static,
    B: Send + 'static,
    FA: FnOnce(&CancellationFlag) -> Result<A, ForecastError> + Send + 'static,
    FB: FnOnce(&CancellationFlag) -> Result<B, ForecastError> + Send + 'static,
{
    let left_task = tokio::task::spawn_blocking(cancel_on_failure(cancel.clone(), left));
    let right_task = tokio::task::spawn_blocking(cancel_on_failure(cancel, right));

    let (left, right) = tokio::try_join!(left_task, right_task).map_err(training_crashed)?;
    match (left, right) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        // Report the root failure, not the cancellation it caused
        (Err(e), Err(ForecastError::Cancelled)) | (Err(ForecastError::Cancelled), Err(e)) => {
            Err(e)
        }
        (Err(e), _) | (_, Err(e)) => Err(e),
    }
}

fn cancel_on_failure<T, F>(
    cancel: CancellationFlag,
    train: F,
) -> impl FnOnce() -> Result<T, ForecastError> + Send + 'static
where
    T: Send + 'static,
    F: FnOnce(&CancellationFlag) -> Result<T, ForecastError> + Send + 'static,
{
    move || {
        let outcome = train(&cancel);
        if outcome.is_err() {
            cancel.cancel();
        }
        outcome
    }
}

fn training_crashed(error: JoinError) -> ForecastError {
    ForecastError::Training {
        reason: error.to_string(),
    }
}

/// The `days` calendar days following the last historical date.
fn forecast_dates(history: &[HistoricalPoint], days: u32) -> Result<Vec<NaiveDate>, ForecastError> {
    let last = history
        .last()
        .map(|p| p.date)
        .ok_or_else(|| ForecastError::InvalidInput {
            reason: "historical_data is empty".to_string(),
        })?;

    (1..=u64::from(days))
        .map(|offset| {
            last.checked_add_days(Days::new(offset))
                .ok_or_else(|| ForecastError::InvalidInput {
                    reason: format!("forecast date overflow after {}", last),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::FitError;
    use crate::domain::forecasting::ModelOrder;
    use std::time::Instant;

    fn request(prices: &[f64], days: Option<u32>) -> ForecastRequest {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        ForecastRequest {
            coin_id: "bitcoin".to_string(),
            symbol: "BTC".to_string(),
            historical_data: prices
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    HistoricalPoint::new(start + chrono::Duration::days(i as i64), *p)
                })
                .collect(),
            current_price: prices.last().copied().unwrap_or(1.0),
            forecast_days: days,
            model_type: None,
        }
    }

    fn heuristic_service() -> ForecastService {
        ForecastService::new(ForecastSettings {
            mode: ForecastMode::Heuristic,
            heuristic_seed: Some(7),
            ..ForecastSettings::default()
        })
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!(ForecastMode::from_str("Trained").unwrap(), ForecastMode::Trained);
        assert_eq!(ForecastMode::from_str("heuristic").unwrap(), ForecastMode::Heuristic);
        assert!(ForecastMode::from_str("fast").is_err());
    }

    #[test]
    fn test_forecast_dates_follow_last_history_day() {
        let history = request(&[1.0, 2.0, 3.0], None).historical_data;
        let dates = forecast_dates(&history, 3).unwrap();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 6).unwrap(),
            ]
        );
    }

    #[tokio::test]
    async fn test_rejects_invalid_requests() {
        let service = heuristic_service();

        let zero_days = request(&[1.0; 10], Some(0));
        assert!(matches!(
            service.forecast(&zero_days).await,
            Err(ForecastError::InvalidInput { .. })
        ));

        let too_long = request(&[1.0; 10], Some(366));
        assert!(matches!(
            service.forecast(&too_long).await,
            Err(ForecastError::InvalidInput { .. })
        ));

        let empty = request(&[], Some(3));
        assert!(matches!(
            service.forecast(&empty).await,
            Err(ForecastError::InvalidInput { .. })
        ));

        let mut bad_price = request(&[1.0; 10], Some(3));
        bad_price.current_price = 0.0;
        assert!(matches!(
            service.forecast(&bad_price).await,
            Err(ForecastError::InvalidInput { .. })
        ));
    }

    #[tokio::test]
    async fn test_default_horizon_applies() {
        let result = heuristic_service()
            .forecast(&request(&[10.0; 20], None))
            .await
            .unwrap();
        assert_eq!(result.horizon(), 7);
        assert_eq!(result.model_type, ModelType::Lstm.label());
    }

    #[tokio::test]
    async fn test_forecast_coin_without_provider_is_invalid_input() {
        let result = heuristic_service()
            .forecast_coin("bitcoin", "BTC", Some(3), None)
            .await;
        assert!(matches!(result, Err(ForecastError::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn test_failed_training_stops_its_sibling() {
        let started = Instant::now();
        let outcome = join_cancelling(
            CancellationFlag::new(),
            |_| {
                Err::<(), _>(ForecastError::StatisticalFit {
                    order: ModelOrder::DEFAULT,
                    source: FitError::Singular,
                })
            },
            |cancel| {
                let deadline = Instant::now() + Duration::from_secs(10);
                while !cancel.is_cancelled() && Instant::now() < deadline {
                    std::thread::sleep(Duration::from_millis(1));
                }
                if cancel.is_cancelled() {
                    Err(ForecastError::Cancelled)
                } else {
                    Ok(())
                }
            },
        )
        .await;

        assert!(matches!(
            outcome,
            Err(ForecastError::StatisticalFit {
                source: FitError::Singular,
                ..
            })
        ));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
