use crate::domain::forecasting::FEATURE_COUNT;
use ndarray::Array2;

/// Per-feature min-max scaling to `[0, 1]` over the fitted rows.
///
/// A feature with zero range is shifted by its minimum and left unscaled,
/// so `unscale(scale(x)) == x` holds for every feature.
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxScaler {
    mins: [f64; FEATURE_COUNT],
    ranges: [f64; FEATURE_COUNT],
}

impl MinMaxScaler {
    pub fn fit(rows: &[[f64; FEATURE_COUNT]]) -> Self {
        let mut mins = [f64::INFINITY; FEATURE_COUNT];
        let mut maxs = [f64::NEG_INFINITY; FEATURE_COUNT];
        for row in rows {
            for (k, value) in row.iter().enumerate() {
                mins[k] = mins[k].min(*value);
                maxs[k] = maxs[k].max(*value);
            }
        }

        let mut ranges = [1.0; FEATURE_COUNT];
        for k in 0..FEATURE_COUNT {
            if !mins[k].is_finite() || !maxs[k].is_finite() {
                mins[k] = 0.0;
                continue;
            }
            let range = maxs[k] - mins[k];
            if range > 0.0 {
                ranges[k] = range;
            }
        }

        Self { mins, ranges }
    }

    pub fn scale(&self, feature: usize, value: f64) -> f64 {
        (value - self.mins[feature]) / self.ranges[feature]
    }

    pub fn unscale(&self, feature: usize, value: f64) -> f64 {
        value * self.ranges[feature] + self.mins[feature]
    }

    /// Scale every row into a `rows × FEATURE_COUNT` matrix.
    pub fn transform(&self, rows: &[[f64; FEATURE_COUNT]]) -> Array2<f64> {
        Array2::from_shape_fn((rows.len(), FEATURE_COUNT), |(i, k)| {
            self.scale(k, rows[i][k])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::forecasting::PRICE_FEATURE;

    fn row(price: f64, volume: f64) -> [f64; FEATURE_COUNT] {
        [price, volume, 0.5, price, price, 50.0]
    }

    #[test]
    fn test_fitted_rows_land_in_unit_interval() {
        let rows = vec![row(10.0, 100.0), row(20.0, 300.0), row(15.0, 200.0)];
        let scaler = MinMaxScaler::fit(&rows);
        let scaled = scaler.transform(&rows);

        assert!(scaled.iter().all(|v| (0.0..=1.0).contains(v)));
        assert_eq!(scaled[[0, PRICE_FEATURE]], 0.0);
        assert_eq!(scaled[[1, PRICE_FEATURE]], 1.0);
        assert_eq!(scaled[[2, PRICE_FEATURE]], 0.5);
    }

    #[test]
    fn test_unscale_inverts_scale() {
        let rows = vec![row(27_000.0, 1e9), row(31_500.25, 4e9), row(29_100.75, 2e9)];
        let scaler = MinMaxScaler::fit(&rows);

        for value in [27_000.0, 28_123.456, 31_500.25, 35_000.0] {
            let restored = scaler.unscale(PRICE_FEATURE, scaler.scale(PRICE_FEATURE, value));
            assert!((restored - value).abs() < 1e-9 * value, "{} -> {}", value, restored);
        }
    }

    #[test]
    fn test_zero_range_feature_round_trips_exactly() {
        let rows = vec![row(42.0, 0.0); 5];
        let scaler = MinMaxScaler::fit(&rows);

        assert_eq!(scaler.scale(PRICE_FEATURE, 42.0), 0.0);
        assert_eq!(scaler.unscale(PRICE_FEATURE, 0.0), 42.0);
        assert_eq!(scaler.unscale(PRICE_FEATURE, scaler.scale(PRICE_FEATURE, 43.5)), 43.5);
    }
}
