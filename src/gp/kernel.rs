//! Matérn 5/2 kernel with an amplitude and additive white noise.

use nalgebra::DMatrix;

use crate::observation::euclidean;

/// `√5`.
const SQRT_5: f64 = 2.236_067_977_499_79;

/// Hyperparameters of `amplitude × Matérn₅⸝₂(length_scale) + noise_level × δ`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KernelParams {
    /// Signal variance multiplying the Matérn term.
    pub amplitude: f64,
    /// Isotropic length scale shared by all dimensions.
    pub length_scale: f64,
    /// Variance of the white-noise term.
    pub noise_level: f64,
}

impl Default for KernelParams {
    fn default() -> Self {
        Self {
            amplitude: 1.0,
            length_scale: 1.0,
            noise_level: 1e-4,
        }
    }
}

impl KernelParams {
    /// Matérn 5/2 covariance between two points, without the noise term.
    ///
    /// `k(r) = a (1 + √5 r/l + 5/3 (r/l)²) exp(-√5 r/l)`
    #[must_use]
    pub fn covariance(&self, x1: &[f64], x2: &[f64]) -> f64 {
        let r = euclidean(x1, x2) / self.length_scale;
        let sqrt5_r = SQRT_5 * r;
        self.amplitude * (1.0 + sqrt5_r + 5.0 / 3.0 * r * r) * (-sqrt5_r).exp()
    }

    /// Prior variance at any single point, noise included.
    #[must_use]
    pub fn prior_variance(&self) -> f64 {
        self.amplitude + self.noise_level
    }

    /// Gram matrix `K + (noise + jitter) I` over training points.
    pub(crate) fn gram(&self, x: &[Vec<f64>], jitter: f64) -> DMatrix<f64> {
        let n = x.len();
        DMatrix::from_fn(n, n, |i, j| {
            let k = self.covariance(&x[i], &x[j]);
            if i == j {
                k + self.noise_level + jitter
            } else {
                k
            }
        })
    }

    /// Cross-covariance matrix with training points as rows and queries as columns.
    pub(crate) fn cross(&self, x_train: &[Vec<f64>], queries: &[Vec<f64>]) -> DMatrix<f64> {
        DMatrix::from_fn(x_train.len(), queries.len(), |i, j| {
            self.covariance(&x_train[i], &queries[j])
        })
    }
}
