//! Ridge regression (posterior mean of Bayesian linear regression).
//!
//! With prior `w ~ N(0, I / lambda)` and unit noise the posterior mean solves
//! `(Phi^T Phi + lambda I) w = Phi^T y`. When there are fewer samples than
//! features the equivalent dual system `(Phi Phi^T + lambda I) a = y`,
//! `w = Phi^T a` is smaller and is solved instead.

use nalgebra::{DMatrix, DVector};

/// Fitted linear model without intercept.
#[derive(Debug, Clone)]
pub struct RidgeRegression {
    weights: DVector<f64>,
}

impl RidgeRegression {
    /// Fit weights for `features` (shape `(n, d)`) against `targets` (length `n`).
    ///
    /// Returns `None` when shapes disagree, `prior_precision` is not positive,
    /// or the system cannot be factorised.
    pub fn fit(features: &DMatrix<f64>, targets: &DVector<f64>, prior_precision: f64) -> Option<Self> {
        if features.nrows() != targets.len() || prior_precision <= 0.0 || features.nrows() == 0 {
            return None;
        }
        let (n, d) = features.shape();

        let weights = if n >= d {
            let mut precision = features.tr_mul(features);
            for i in 0..d {
                precision[(i, i)] += prior_precision;
            }
            let rhs = features.tr_mul(targets);
            precision.cholesky()?.solve(&rhs)
        } else {
            let mut gram = features * features.transpose();
            for i in 0..n {
                gram[(i, i)] += prior_precision;
            }
            let alpha = gram.cholesky()?.solve(targets);
            features.tr_mul(&alpha)
        };

        if weights.iter().any(|w| !w.is_finite()) {
            return None;
        }
        Some(Self { weights })
    }

    pub fn weights(&self) -> &DVector<f64> {
        &self.weights
    }

    /// Predict one value per feature row. NaN rows for mismatched widths.
    pub fn predict(&self, features: &DMatrix<f64>) -> DVector<f64> {
        if features.ncols() != self.weights.len() {
            return DVector::from_element(features.nrows(), f64::NAN);
        }
        features * &self.weights
    }
}
