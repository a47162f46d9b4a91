use crate::domain::forecasting::PRICE_FEATURE;
use ndarray::{Array1, Array2, Array3, ArrayView2, s};

/// Overlapping fixed-length windows over scaled feature rows.
///
/// Window `i` covers rows `[i, i + window)`; its target is the scaled price
/// of row `i + window`.
#[derive(Debug, Clone)]
pub struct WindowedDataset {
    inputs: Array3<f64>,
    targets: Array1<f64>,
}

impl WindowedDataset {
    pub fn from_rows(scaled: &Array2<f64>, window: usize) -> Self {
        let samples = scaled.nrows().saturating_sub(window);
        let features = scaled.ncols();

        let inputs = Array3::from_shape_fn((samples, window, features), |(i, t, k)| {
            scaled[[i + t, k]]
        });
        let targets = Array1::from_shape_fn(samples, |i| scaled[[i + window, PRICE_FEATURE]]);

        Self { inputs, targets }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn window(&self, index: usize) -> ArrayView2<'_, f64> {
        self.inputs.slice(s![index, .., ..])
    }

    pub fn target(&self, index: usize) -> f64 {
        self.targets[index]
    }

    pub fn targets(&self) -> &Array1<f64> {
        &self.targets
    }

    /// Chronological split: the first `at` windows, then the rest.
    pub fn split_at(&self, at: usize) -> (Self, Self) {
        let at = at.min(self.len());
        (
            Self {
                inputs: self.inputs.slice(s![..at, .., ..]).to_owned(),
                targets: self.targets.slice(s![..at]).to_owned(),
            },
            Self {
                inputs: self.inputs.slice(s![at.., .., ..]).to_owned(),
                targets: self.targets.slice(s![at..]).to_owned(),
            },
        )
    }
}

/// Number of training windows for a chronological split, at least one.
pub fn training_windows(total: usize, validation_split: f64) -> usize {
    let train = ((1.0 - validation_split) * total as f64).floor() as usize;
    train.clamp(1, total.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::forecasting::FEATURE_COUNT;

    fn ramp(rows: usize) -> Array2<f64> {
        Array2::from_shape_fn((rows, FEATURE_COUNT), |(i, k)| (i * 10 + k) as f64)
    }

    #[test]
    fn test_windows_and_targets_line_up() {
        let dataset = WindowedDataset::from_rows(&ramp(10), 3);
        assert_eq!(dataset.len(), 7);

        let first = dataset.window(0);
        assert_eq!(first.shape(), &[3, FEATURE_COUNT]);
        assert_eq!(first[[2, PRICE_FEATURE]], 20.0);
        assert_eq!(dataset.target(0), 30.0);
        assert_eq!(dataset.target(6), 90.0);
    }

    #[test]
    fn test_split_preserves_order() {
        let dataset = WindowedDataset::from_rows(&ramp(15), 5);
        let (train, validation) = dataset.split_at(training_windows(dataset.len(), 0.2));

        assert_eq!(train.len(), 8);
        assert_eq!(validation.len(), 2);
        assert_eq!(validation.target(0), 130.0);
    }

    #[test]
    fn test_training_windows_never_zero() {
        assert_eq!(training_windows(1, 0.2), 1);
        assert_eq!(training_windows(40, 0.2), 32);
        assert_eq!(training_windows(3, 0.9), 1);
    }

    #[test]
    fn test_too_few_rows_gives_empty_dataset() {
        let dataset = WindowedDataset::from_rows(&ramp(3), 5);
        assert!(dataset.is_empty());
    }
}
