use crate::domain::forecasting::ForecastMetrics;

/// Regression metrics of `predicted` against `actual`.
///
/// R² is 0 when the actual values have no variance. Empty input yields
/// all-zero metrics.
pub fn regression_metrics(actual: &[f64], predicted: &[f64]) -> ForecastMetrics {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return ForecastMetrics::default();
    }

    let pairs = actual.iter().zip(predicted).take(n);
    let (sq_sum, abs_sum) = pairs.fold((0.0, 0.0), |(sq, abs), (a, p)| {
        let err = a - p;
        (sq + err * err, abs + err.abs())
    });

    let mse = sq_sum / n as f64;
    let mae = abs_sum / n as f64;

    let mean = actual[..n].iter().sum::<f64>() / n as f64;
    let ss_tot: f64 = actual[..n].iter().map(|a| (a - mean).powi(2)).sum();
    let r2 = if ss_tot == 0.0 { 0.0 } else { 1.0 - sq_sum / ss_tot };

    ForecastMetrics {
        mse,
        mae,
        rmse: mse.sqrt(),
        r2,
    }
}
