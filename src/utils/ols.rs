//! Penalised least squares on a column-major design matrix.
//!
//! Used by the additive seasonal model, where trend changepoints and Fourier
//! terms each carry their own ridge penalty.

use crate::error::{Result, SalesError};

/// Fitted coefficients of a least-squares problem.
#[derive(Debug, Clone)]
pub struct LeastSquaresFit {
    /// One coefficient per design column.
    pub coefficients: Vec<f64>,
    /// Residual sum of squares on the training rows.
    pub rss: f64,
}

impl LeastSquaresFit {
    /// Evaluate `X @ beta` for a column-major design with the same columns.
    pub fn predict(&self, columns: &[Vec<f64>]) -> Result<Vec<f64>> {
        if columns.len() != self.coefficients.len() {
            return Err(SalesError::DimensionMismatch {
                expected: self.coefficients.len(),
                got: columns.len(),
            });
        }
        let n = columns.first().map(|c| c.len()).unwrap_or(0);
        let mut out = vec![0.0; n];
        for (column, beta) in columns.iter().zip(&self.coefficients) {
            if column.len() != n {
                return Err(SalesError::DimensionMismatch {
                    expected: n,
                    got: column.len(),
                });
            }
            for (o, x) in out.iter_mut().zip(column) {
                *o += beta * x;
            }
        }
        Ok(out)
    }
}

/// Solve `min ||y - X beta||^2 + sum_j penalty_j * beta_j^2`.
///
/// `columns` holds the design matrix column by column; `penalties` gives one
/// non-negative ridge weight per column (0 leaves a column unpenalised).
pub fn ridge_fit(columns: &[Vec<f64>], y: &[f64], penalties: &[f64]) -> Result<LeastSquaresFit> {
    let n = y.len();
    let k = columns.len();

    if n == 0 {
        return Err(SalesError::InsufficientData { needed: 1, got: 0 });
    }
    if penalties.len() != k {
        return Err(SalesError::DimensionMismatch {
            expected: k,
            got: penalties.len(),
        });
    }
    for column in columns {
        if column.len() != n {
            return Err(SalesError::DimensionMismatch {
                expected: n,
                got: column.len(),
            });
        }
    }

    // Normal equations (X'X + P) beta = X'y
    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for i in 0..k {
        xty[i] = columns[i].iter().zip(y).map(|(a, b)| a * b).sum();
        for j in 0..=i {
            let dot: f64 = columns[i].iter().zip(&columns[j]).map(|(a, b)| a * b).sum();
            xtx[i][j] = dot;
            xtx[j][i] = dot;
        }
        // Tiny jitter keeps rank-deficient designs solvable.
        xtx[i][i] += penalties[i].max(0.0) + 1e-8;
    }

    let coefficients = solve_symmetric(&xtx, &xty).ok_or_else(|| {
        SalesError::ComputationError("least squares system is not positive definite".into())
    })?;

    let fit = LeastSquaresFit {
        coefficients,
        rss: 0.0,
    };
    let fitted = fit.predict(columns)?;
    let rss = y
        .iter()
        .zip(&fitted)
        .map(|(a, b)| (a - b).powi(2))
        .sum();

    Ok(LeastSquaresFit { rss, ..fit })
}

/// Solve a symmetric positive definite system via Cholesky decomposition.
fn solve_symmetric(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let sum = a[i][j] - (0..j).map(|k| l[i][k] * l[j][k]).sum::<f64>();
            if i == j {
                if sum <= 0.0 {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    // L z = b
    let mut z = vec![0.0; n];
    for i in 0..n {
        z[i] = (b[i] - (0..i).map(|j| l[i][j] * z[j]).sum::<f64>()) / l[i][i];
    }

    // L' x = z
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        x[i] = (z[i] - ((i + 1)..n).map(|j| l[j][i] * x[j]).sum::<f64>()) / l[i][i];
    }

    Some(x)
}
