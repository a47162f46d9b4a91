/// Weight of the sequence model at 0-based step `index` of `days`.
///
/// Rises linearly from 0.7 toward 0.9 over the horizon.
pub fn sequence_weight(index: usize, days: usize) -> f64 {
    if days == 0 {
        return 0.7;
    }
    0.7 + (index as f64 / days as f64) * 0.2
}

/// Complement of [`sequence_weight`]; the two always sum to exactly 1.
pub fn statistical_weight(index: usize, days: usize) -> f64 {
    1.0 - sequence_weight(index, days)
}

/// Step-wise weighted blend of two equally long price paths.
pub fn blend(sequence: &[f64], statistical: &[f64]) -> Vec<f64> {
    let days = sequence.len().min(statistical.len());
    sequence
        .iter()
        .zip(statistical)
        .enumerate()
        .map(|(i, (seq, stat))| {
            sequence_weight(i, days) * seq + statistical_weight(i, days) * stat
        })
        .collect()
}
