//! AIC grid search over candidate ARIMA orders

use super::arima::ArimaFit;
use crate::application::forecasting::cancellation::CancellationFlag;
use crate::domain::errors::FitError;
use crate::domain::forecasting::ModelOrder;
use rayon::prelude::*;

/// Result of fitting one candidate order.
///
/// Failed fits are kept so callers can report why an order was skipped.
#[derive(Debug, Clone)]
pub struct OrderFitOutcome {
    pub order: ModelOrder,
    pub result: Result<ArimaFit, FitError>,
}

/// Fit every candidate order in parallel.
///
/// Fits are independent; a set cancellation flag turns every fit that has
/// not started yet into `FitError::Cancelled`.
pub fn fit_candidates(
    series: &[f64],
    orders: &[ModelOrder],
    cancel: &CancellationFlag,
) -> Vec<OrderFitOutcome> {
    orders
        .par_iter()
        .map(|&order| {
            let result = if cancel.is_cancelled() {
                Err(FitError::Cancelled)
            } else {
                ArimaFit::fit(series, order)
            };
            OrderFitOutcome { order, result }
        })
        .collect()
}

/// Successful fit with the lowest AIC; ties go to the earlier candidate.
pub fn select_lowest_aic(outcomes: Vec<OrderFitOutcome>) -> Option<ArimaFit> {
    outcomes
        .into_iter()
        .filter_map(|outcome| outcome.result.ok())
        .filter(|fit| fit.aic.is_finite())
        .reduce(|best, candidate| {
            if candidate.aic.total_cmp(&best.aic).is_lt() {
                candidate
            } else {
                best
            }
        })
}
