use crate::domain::errors::FitError;
use nalgebra::{DMatrix, DVector};

/// Pivots smaller than this fraction of the largest normal-matrix entry are
/// treated as zero.
const RELATIVE_PIVOT_TOLERANCE: f64 = 1e-12;

/// Ordinary least squares via the normal equations.
///
/// `rows` holds one regressor vector per observation, all of equal length.
/// An empty regressor set yields an empty coefficient vector.
pub fn ordinary_least_squares(rows: &[Vec<f64>], target: &[f64]) -> Result<Vec<f64>, FitError> {
    let k = rows.first().map_or(0, Vec::len);
    if k == 0 {
        return Ok(Vec::new());
    }
    if rows.len() < k {
        return Err(FitError::InsufficientObservations {
            needed: k,
            available: rows.len(),
        });
    }

    let n = rows.len().min(target.len());
    let x = DMatrix::from_fn(n, k, |i, j| rows[i][j]);
    let y = DVector::from_column_slice(&target[..n]);

    let xtx = x.transpose() * &x;
    let xty = x.transpose() * &y;
    if xtx.iter().chain(xty.iter()).any(|v| !v.is_finite()) {
        return Err(FitError::NonFinite);
    }

    let scale = xtx.amax();
    if scale == 0.0 {
        return Err(FitError::Singular);
    }

    // LU with partial pivoting; a tiny U pivot means the columns are collinear
    let lu = xtx.lu();
    let tolerance = scale * RELATIVE_PIVOT_TOLERANCE;
    if lu.u().diagonal().iter().any(|pivot| pivot.abs() <= tolerance) {
        return Err(FitError::Singular);
    }

    let beta = lu.solve(&xty).ok_or(FitError::Singular)?;
    if beta.iter().any(|v| !v.is_finite()) {
        return Err(FitError::NonFinite);
    }
    Ok(beta.iter().copied().collect())
}
