//! ARIMA(p, d, q) estimation and forecasting
//!
//! - **I**: the series is differenced `d` times; a constant is estimated
//!   only for undifferenced series.
//! - **AR only** (`q = 0`): conditional least squares on lagged values.
//! - **ARMA** (`q > 0`): Hannan–Rissanen. A long autoregression supplies
//!   innovation estimates, which then enter the final regression as
//!   moving-average regressors.
//!
//! Residuals are recomputed by conditional sum of squares from `t = p`
//! onward, and the Gaussian log-likelihood of those residuals drives AIC.

use super::least_squares::ordinary_least_squares;
use crate::domain::errors::FitError;
use crate::domain::forecasting::{ModelOrder, PRICE_FLOOR};
use std::f64::consts::PI;

const SIGMA2_FLOOR: f64 = 1e-12;

/// Observations beyond the parameter count that a fit needs.
const SLACK_OBSERVATIONS: usize = 10;

/// A fitted ARIMA model with enough state to forecast ahead.
#[derive(Debug, Clone)]
pub struct ArimaFit {
    pub order: ModelOrder,
    pub constant: f64,
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub sigma2: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    /// Mean absolute one-step error on the original price scale
    pub mae: f64,
    /// Mean of the prices those errors were measured against
    pub mean_level: f64,
    differenced: Vec<f64>,
    residuals: Vec<f64>,
    /// Last value of the series at each differencing depth `0..d`
    anchors: Vec<f64>,
}

impl ArimaFit {
    pub fn fit(series: &[f64], order: ModelOrder) -> Result<Self, FitError> {
        let needed = order.p + order.d + order.q + SLACK_OBSERVATIONS;
        if series.len() < needed {
            return Err(FitError::InsufficientObservations {
                needed,
                available: series.len(),
            });
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(FitError::NonFinite);
        }

        let mut anchors = Vec::with_capacity(order.d);
        let mut differenced = series.to_vec();
        for _ in 0..order.d {
            anchors.push(*differenced.last().ok_or(FitError::NonFinite)?);
            differenced = difference(&differenced);
        }

        let with_constant = order.d == 0;
        let (constant, ar, ma) = if order.q == 0 {
            estimate_ar(&differenced, order.p, with_constant)?
        } else {
            estimate_hannan_rissanen(&differenced, order.p, order.q, with_constant)?
        };

        if ma.iter().map(|t| t.abs()).sum::<f64>() >= 1.0 {
            return Err(FitError::NonInvertible);
        }

        let residuals = css_residuals(&differenced, constant, &ar, &ma);
        let scored = &residuals[order.p..];
        if scored.is_empty() {
            return Err(FitError::InsufficientObservations {
                needed: order.p + 1,
                available: differenced.len(),
            });
        }
        if scored.iter().any(|e| !e.is_finite()) {
            return Err(FitError::NonFinite);
        }

        let n = scored.len() as f64;
        let sigma2 = (scored.iter().map(|e| e * e).sum::<f64>() / n).max(SIGMA2_FLOOR);
        let log_likelihood = -n / 2.0 * ((2.0 * PI * sigma2).ln() + 1.0);
        let k = (order.p + order.q + usize::from(with_constant) + 1) as f64;
        let aic = 2.0 * k - 2.0 * log_likelihood;

        // One-step level error equals the differenced-scale residual, so the
        // fitted price at series index t + d is series[t + d] - e[t].
        let levels = &series[order.p + order.d..];
        let mae = scored.iter().map(|e| e.abs()).sum::<f64>() / n;
        let mean_level = levels.iter().sum::<f64>() / levels.len() as f64;

        Ok(Self {
            order,
            constant,
            ar,
            ma,
            sigma2,
            log_likelihood,
            aic,
            mae,
            mean_level,
            differenced,
            residuals,
            anchors,
        })
    }

    /// In-sample accuracy score: `100 - MAE / mean_price * 100`, bounded to
    /// `[50, 90]`.
    pub fn accuracy(&self) -> f64 {
        if self.mean_level.abs() < f64::EPSILON {
            return 50.0;
        }
        (100.0 - self.mae / self.mean_level * 100.0).clamp(50.0, 90.0)
    }

    /// Recursive multi-step forecast on the original scale.
    ///
    /// Future innovations are zero. Output is floored at the minimum price.
    pub fn forecast(&self, steps: usize) -> Vec<f64> {
        if steps == 0 {
            return Vec::new();
        }

        let mut values = self.differenced.clone();
        let mut errors = self.residuals.clone();
        let start = values.len();

        for _ in 0..steps {
            let t = values.len();
            let mut next = self.constant;
            for (i, phi) in self.ar.iter().enumerate() {
                next += phi * lagged(&values, t, i + 1);
            }
            for (j, theta) in self.ma.iter().enumerate() {
                next += theta * lagged(&errors, t, j + 1);
            }
            values.push(next);
            errors.push(0.0);
        }

        let mut path = values[start..].to_vec();
        for anchor in self.anchors.iter().rev() {
            path = integrate(*anchor, &path);
        }

        path.into_iter().map(|p| p.max(PRICE_FLOOR)).collect()
    }
}

fn difference(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

fn integrate(anchor: f64, increments: &[f64]) -> Vec<f64> {
    let mut level = anchor;
    increments
        .iter()
        .map(|delta| {
            level += delta;
            level
        })
        .collect()
}

/// `values[t - lag]`, or zero before the start of the series.
fn lagged(values: &[f64], t: usize, lag: usize) -> f64 {
    t.checked_sub(lag).map_or(0.0, |idx| values[idx])
}

fn regressor_row(
    values: &[f64],
    innovations: &[f64],
    t: usize,
    p: usize,
    q: usize,
    with_constant: bool,
) -> Vec<f64> {
    let mut row = Vec::with_capacity(p + q + 1);
    if with_constant {
        row.push(1.0);
    }
    row.extend((1..=p).map(|i| values[t - i]));
    row.extend((1..=q).map(|j| innovations[t - j]));
    row
}

fn split_coefficients(beta: Vec<f64>, p: usize, with_constant: bool) -> (f64, Vec<f64>, Vec<f64>) {
    let (constant, rest) = if with_constant {
        (beta[0], &beta[1..])
    } else {
        (0.0, &beta[..])
    };
    (constant, rest[..p].to_vec(), rest[p..].to_vec())
}

fn estimate_ar(
    values: &[f64],
    p: usize,
    with_constant: bool,
) -> Result<(f64, Vec<f64>, Vec<f64>), FitError> {
    let (rows, target): (Vec<_>, Vec<_>) = (p..values.len())
        .map(|t| (regressor_row(values, &[], t, p, 0, with_constant), values[t]))
        .unzip();
    let beta = ordinary_least_squares(&rows, &target)?;
    if beta.is_empty() {
        return Ok((0.0, vec![0.0; p], Vec::new()));
    }
    Ok(split_coefficients(beta, p, with_constant))
}

fn estimate_hannan_rissanen(
    values: &[f64],
    p: usize,
    q: usize,
    with_constant: bool,
) -> Result<(f64, Vec<f64>, Vec<f64>), FitError> {
    let long_order = ((p.max(q) + 4).min(values.len() / 5)).max(1);
    let (long_constant, long_ar, _) = estimate_ar(values, long_order, with_constant)?;

    let mut innovations = vec![0.0; values.len()];
    for t in long_order..values.len() {
        let mut predicted = long_constant;
        for (i, phi) in long_ar.iter().enumerate() {
            predicted += phi * values[t - i - 1];
        }
        innovations[t] = values[t] - predicted;
    }

    let start = p.max(long_order + q);
    if start >= values.len() {
        return Err(FitError::InsufficientObservations {
            needed: start + 1,
            available: values.len(),
        });
    }
    let (rows, target): (Vec<_>, Vec<_>) = (start..values.len())
        .map(|t| (regressor_row(values, &innovations, t, p, q, with_constant), values[t]))
        .unzip();
    let beta = ordinary_least_squares(&rows, &target)?;
    Ok(split_coefficients(beta, p, with_constant))
}

/// Conditional-sum-of-squares residuals. Entries before `t = p` are zero.
fn css_residuals(values: &[f64], constant: f64, ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let p = ar.len();
    let mut residuals = vec![0.0; values.len()];
    for t in p..values.len() {
        let mut predicted = constant;
        for (i, phi) in ar.iter().enumerate() {
            predicted += phi * values[t - i - 1];
        }
        for (j, theta) in ma.iter().enumerate() {
            predicted += theta * lagged(&residuals, t, j + 1);
        }
        residuals[t] = values[t] - predicted;
    }
    residuals
}
