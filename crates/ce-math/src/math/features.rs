//! Random Fourier features approximating an RBF kernel.
//!
//! `phi(x) = sqrt(2/D) * cos(x W + b)` with `W[:, j] ~ N(0, I / l_j^2)` and
//! `b_j ~ U(0, 2 pi)`, so that `phi(x) . phi(y) ~ exp(-|x - y|^2 / (2 l^2))`.
//! Drawing `l_j` per feature from a range mixes kernels of several widths,
//! which is useful when nothing is known about the smoothness of the target.

use std::f64::consts::TAU;

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// Kernel lengthscale: fixed, or drawn per feature from a uniform range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lengthscale {
    Fixed(f64),
    Uniform { low: f64, high: f64 },
}

impl Lengthscale {
    fn draw<R: Rng>(&self, rng: &mut R) -> f64 {
        match *self {
            Lengthscale::Fixed(l) => l,
            Lengthscale::Uniform { low, high } if high > low => rng.random_range(low..high),
            Lengthscale::Uniform { low, .. } => low,
        }
    }
}

impl Default for Lengthscale {
    fn default() -> Self {
        Lengthscale::Uniform {
            low: 0.1,
            high: 1.0,
        }
    }
}

/// A sampled random Fourier feature map.
#[derive(Debug, Clone)]
pub struct RandomFourierFeatures {
    /// Frequencies, shape `(input_dim, n_features)`.
    omega: DMatrix<f64>,
    /// Phase offsets, length `n_features`.
    bias: DVector<f64>,
}

impl RandomFourierFeatures {
    /// Draw a feature map for inputs of dimension `input_dim`.
    pub fn sample<R: Rng>(
        input_dim: usize,
        n_features: usize,
        lengthscale: Lengthscale,
        rng: &mut R,
    ) -> Self {
        let mut omega = DMatrix::zeros(input_dim, n_features);
        let mut bias = DVector::zeros(n_features);
        for j in 0..n_features {
            let l = lengthscale.draw(rng);
            for i in 0..input_dim {
                let z: f64 = rng.sample(StandardNormal);
                omega[(i, j)] = z / l;
            }
            bias[j] = rng.random_range(0.0..TAU);
        }
        Self { omega, bias }
    }

    pub fn input_dim(&self) -> usize {
        self.omega.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.omega.ncols()
    }

    /// Map rows of `x` (shape `(n, input_dim)`) to features `(n, n_features)`.
    ///
    /// Inputs of the wrong width map to an all-NaN matrix.
    pub fn transform(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        let d = self.n_features();
        if x.ncols() != self.input_dim() {
            return DMatrix::from_element(x.nrows(), d, f64::NAN);
        }
        let scale = (2.0 / d.max(1) as f64).sqrt();
        let mut projected = x * &self.omega;
        for (j, mut column) in projected.column_iter_mut().enumerate() {
            let b = self.bias[j];
            column.apply(|v| *v = scale * (*v + b).cos());
        }
        projected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn transform_shape_and_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let rff = RandomFourierFeatures::sample(2, 64, Lengthscale::default(), &mut rng);
        let x = DMatrix::from_row_slice(3, 2, &[0.0, 1.0, 0.5, -0.5, 2.0, 2.0]);
        let phi = rff.transform(&x);

        assert_eq!(phi.shape(), (3, 64));
        let bound = (2.0f64 / 64.0).sqrt() + 1e-12;
        assert!(phi.iter().all(|v| v.abs() <= bound));
    }

    #[test]
    fn wrong_width_maps_to_nan() {
        let mut rng = StdRng::seed_from_u64(1);
        let rff = RandomFourierFeatures::sample(2, 8, Lengthscale::Fixed(1.0), &mut rng);
        let phi = rff.transform(&DMatrix::zeros(2, 3));
        assert!(phi.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn inner_products_approximate_rbf_kernel() {
        let mut rng = StdRng::seed_from_u64(42);
        let rff = RandomFourierFeatures::sample(1, 20_000, Lengthscale::Fixed(1.0), &mut rng);
        let x = DMatrix::from_row_slice(3, 1, &[0.0, 0.5, 1.5]);
        let phi = rff.transform(&x);
        let gram = &phi * phi.transpose();

        for (a, b) in [(0usize, 1usize), (0, 2), (1, 2)] {
            let dist = x[(a, 0)] - x[(b, 0)];
            let exact = (-dist * dist / 2.0).exp();
            assert!(
                (gram[(a, b)] - exact).abs() < 0.05,
                "k({a},{b}) = {} vs {exact}",
                gram[(a, b)]
            );
        }
    }
}
