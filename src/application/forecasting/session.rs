use super::confidence::{base_accuracy, ensemble_confidence, overall_accuracy};
use super::ensemble::blend;
use super::sequence::TrainedSequenceModel;
use super::statistical::TrainedStatisticalModel;
use crate::domain::errors::ForecastError;
use crate::domain::forecasting::{ENSEMBLE_LABEL, ForecastPoint, ForecastResult, PRICE_FLOOR};
use chrono::NaiveDate;

/// Trained models owned by a single forecast request.
///
/// Nothing here is shared between requests; the session is dropped once the
/// forecast has been produced.
#[derive(Debug, Default)]
pub struct ForecastSession {
    statistical: Option<TrainedStatisticalModel>,
    sequence: Option<TrainedSequenceModel>,
}

impl ForecastSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_models(statistical: TrainedStatisticalModel, sequence: TrainedSequenceModel) -> Self {
        Self {
            statistical: Some(statistical),
            sequence: Some(sequence),
        }
    }

    pub fn is_trained(&self) -> bool {
        self.statistical.is_some() && self.sequence.is_some()
    }

    /// Blend both models into one forecast, one point per date.
    pub fn predict(&self, dates: &[NaiveDate]) -> Result<ForecastResult, ForecastError> {
        let statistical = self
            .statistical
            .as_ref()
            .ok_or_else(|| ForecastError::ModelNotTrained {
                model: "ARIMA".to_string(),
            })?;
        let sequence = self
            .sequence
            .as_ref()
            .ok_or_else(|| ForecastError::ModelNotTrained {
                model: "LSTM".to_string(),
            })?;

        let days = dates.len();
        let blended = blend(&sequence.forecast(days), &statistical.forecast(days));
        let base = base_accuracy(sequence.accuracy(), statistical.accuracy());

        let predictions = dates
            .iter()
            .zip(blended)
            .enumerate()
            .map(|(i, (date, price))| ForecastPoint {
                date: *date,
                price: price.max(PRICE_FLOOR),
                confidence: ensemble_confidence(base, i, days),
                model: ENSEMBLE_LABEL.to_string(),
            })
            .collect();

        Ok(ForecastResult {
            predictions,
            accuracy: overall_accuracy(base),
            model_type: ENSEMBLE_LABEL.to_string(),
            metrics: sequence.metrics(),
        })
    }
}
