const MIN_CONFIDENCE: f64 = 40.0;
const MAX_CONFIDENCE: f64 = 100.0;
const DECAY_SPAN: f64 = 15.0;
const PENALTY: f64 = 5.0;

/// Mean of the two model accuracies.
pub fn base_accuracy(sequence_accuracy: f64, statistical_accuracy: f64) -> f64 {
    (sequence_accuracy + statistical_accuracy) / 2.0
}

/// Confidence for 0-based step `index` of a `days`-long ensemble forecast.
///
/// Starts 10 points above `base` and loses up to 15 points over the horizon,
/// always within `[40, 100]`.
pub fn ensemble_confidence(base: f64, index: usize, days: usize) -> u8 {
    let remaining = if days == 0 {
        0.0
    } else {
        (days as f64 - index as f64) / days as f64
    };
    let time_decay = remaining.max(0.0) * DECAY_SPAN;
    let raw = base + time_decay - PENALTY;
    if raw.is_nan() {
        return MIN_CONFIDENCE as u8;
    }
    raw.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE).round() as u8
}

/// Overall accuracy rounded to two decimals.
pub fn overall_accuracy(base: f64) -> f64 {
    (base * 100.0).round() / 100.0
}
