//! Rolling-window indicators over daily price series
//!
//! Every function returns one entry per input element; `None` marks a
//! value that is undefined (window warm-up, missing inputs). A window that
//! contains a missing value is itself missing.

use statrs::statistics::{Data, Distribution};

/// Default RSI smoothing period
pub const RSI_PERIOD: usize = 14;

/// Percent change between consecutive values. The first entry is undefined,
/// as is any change from a zero base.
pub fn pct_change(values: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        if i == 0 || values[i - 1] == 0.0 {
            out.push(None);
        } else {
            out.push(Some((values[i] - values[i - 1]) / values[i - 1]));
        }
    }
    out
}

/// Apply `reducer` to every full trailing window of `window` values.
fn rolling<F>(values: &[Option<f64>], window: usize, reducer: F) -> Vec<Option<f64>>
where
    F: Fn(Vec<f64>) -> Option<f64>,
{
    if window == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let slice = &values[i + 1 - window..=i];
            let collected: Option<Vec<f64>> = slice.iter().copied().collect();
            collected.and_then(&reducer)
        })
        .collect()
}

/// Trailing simple moving average.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| Data::new(w).mean())
}

/// Trailing sample standard deviation (n - 1 denominator).
pub fn rolling_std(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| Data::new(w).std_dev())
}

/// Relative Strength Index with simple rolling-mean smoothing.
///
/// The first (undefined) delta counts as zero gain and zero loss. A window
/// without losses saturates at 100.
pub fn relative_strength_index(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut gains = Vec::with_capacity(prices.len());
    let mut losses = Vec::with_capacity(prices.len());

    for i in 0..prices.len() {
        let delta = if i == 0 { 0.0 } else { prices[i] - prices[i - 1] };
        gains.push(Some(delta.max(0.0)));
        losses.push(Some((-delta).max(0.0)));
    }

    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);

    avg_gain
        .into_iter()
        .zip(avg_loss)
        .map(|(gain, loss)| match (gain, loss) {
            (Some(_), Some(loss)) if loss <= 0.0 => Some(100.0),
            (Some(gain), Some(loss)) => {
                let rs = gain / loss;
                Some(100.0 - 100.0 / (1.0 + rs))
            }
            _ => None,
        })
        .collect()
}

/// Propagate the last known value forward over gaps.
pub fn forward_fill(values: &mut [Option<f64>]) {
    let mut last = None;
    for value in values.iter_mut() {
        match value {
            Some(v) => last = Some(*v),
            None => *value = last,
        }
    }
}

/// Propagate the next known value backward over gaps.
pub fn backward_fill(values: &mut [Option<f64>]) {
    let mut next = None;
    for value in values.iter_mut().rev() {
        match value {
            Some(v) => next = Some(*v),
            None => *value = next,
        }
    }
}

/// Forward-fill, then backward-fill, then zero whatever is still missing.
pub fn fill_gaps(mut values: Vec<Option<f64>>) -> Vec<f64> {
    forward_fill(&mut values);
    backward_fill(&mut values);
    values.into_iter().map(|v| v.unwrap_or(0.0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn test_pct_change() {
        let changes = pct_change(&[100.0, 110.0, 99.0]);
        assert_eq!(changes[0], None);
        assert!((changes[1].unwrap() - 0.1).abs() < 1e-12);
        assert!((changes[2].unwrap() + 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_rolling_mean_warmup_and_values() {
        let means = rolling_mean(&some(&[1.0, 2.0, 3.0, 4.0]), 3);
        assert_eq!(means[0], None);
        assert_eq!(means[1], None);
        assert!((means[2].unwrap() - 2.0).abs() < 1e-12);
        assert!((means[3].unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_rolling_window_with_gap_is_missing() {
        let values = vec![Some(1.0), None, Some(3.0), Some(4.0), Some(5.0)];
        let means = rolling_mean(&values, 2);
        assert_eq!(means[1], None);
        assert_eq!(means[2], None);
        assert!((means[3].unwrap() - 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_rolling_std_is_sample_std() {
        let stds = rolling_std(&some(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 8);
        // Sample variance of this classic set is 32/7
        let expected = (32.0_f64 / 7.0).sqrt();
        assert!((stds[7].unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_rsi_saturates_on_rising_prices() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let rsi = relative_strength_index(&prices, RSI_PERIOD);
        assert_eq!(rsi[RSI_PERIOD - 2], None);
        for value in &rsi[RSI_PERIOD - 1..] {
            assert_eq!(*value, Some(100.0));
        }
    }

    #[test]
    fn test_rsi_falls_to_zero_on_falling_prices() {
        let prices: Vec<f64> = (0..40).map(|i| 200.0 - i as f64).collect();
        let rsi = relative_strength_index(&prices, RSI_PERIOD);
        // Once the warm-up zero delta leaves the window only losses remain
        for value in &rsi[RSI_PERIOD..] {
            assert!(value.unwrap().abs() < 1e-9);
        }
    }

    #[test]
    fn test_rsi_flat_prices_do_not_divide_by_zero() {
        let prices = vec![50.0; 20];
        let rsi = relative_strength_index(&prices, RSI_PERIOD);
        assert_eq!(rsi[19], Some(100.0));
    }

    #[test]
    fn test_fill_gaps() {
        let filled = fill_gaps(vec![None, None, Some(2.0), None, Some(4.0), None]);
        assert_eq!(filled, vec![2.0, 2.0, 2.0, 2.0, 4.0, 4.0]);

        let empty = fill_gaps(vec![None, None]);
        assert_eq!(empty, vec![0.0, 0.0]);
    }
}
