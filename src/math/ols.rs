//! Regularized least squares.
//!
//! Ridge regression minimizes
//!
//! ```text
//! Σ (y_i - b - x_i^T β)^2 + α ‖β‖²
//! ```
//!
//! with the intercept `b` unpenalized. We center `X` and `y` (which removes `b`
//! from the problem), append `sqrt(α)·I` rows below `X` and zeros below `y`, and
//! solve the resulting ordinary least squares problem with SVD. The intercept is
//! recovered as `ȳ - x̄^T β`.
//!
//! Feature counts are small (a handful of weather metrics plus one column per
//! building), so the SVD cost is negligible next to loading the data.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Fitted ridge coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct RidgeFit {
    pub coefficients: DVector<f64>,
    pub intercept: f64,
}

/// Fit ridge regression with an unpenalized intercept.
///
/// Returns `None` for empty input, a negative/non-finite `alpha`, or a system
/// the SVD cannot solve.
pub fn ridge(x: &DMatrix<f64>, y: &DVector<f64>, alpha: f64) -> Option<RidgeFit> {
    let (n, p) = x.shape();
    if n == 0 || n != y.len() || !alpha.is_finite() || alpha < 0.0 {
        return None;
    }

    let x_mean = DVector::from_iterator(p, x.column_iter().map(|c| c.mean()));
    let y_mean = y.mean();

    let mut a = DMatrix::<f64>::zeros(n + p, p);
    for j in 0..p {
        for i in 0..n {
            a[(i, j)] = x[(i, j)] - x_mean[j];
        }
        a[(n + j, j)] = alpha.sqrt();
    }
    let mut b = DVector::<f64>::zeros(n + p);
    for i in 0..n {
        b[i] = y[i] - y_mean;
    }

    let coefficients = if p == 0 {
        DVector::zeros(0)
    } else {
        solve_least_squares(&a, &b)?
    };
    let intercept = y_mean - x_mean.dot(&coefficients);

    Some(RidgeFit {
        coefficients,
        intercept,
    })
}
