//! Exact GP regression with standardized outputs.

use nalgebra::{DMatrix, DVector, Dyn, linalg::Cholesky};

use super::kernel::KernelParams;
use crate::error::{Error, Result};

/// Diagonal jitter tried first when factorizing the Gram matrix.
const INITIAL_JITTER: f64 = 1e-10;
/// Largest jitter tried before giving up.
const MAX_JITTER: f64 = 1e-4;

/// Predictive mean and standard deviation for a batch of query points.
#[derive(Clone, Debug, PartialEq)]
pub struct Prediction {
    /// Posterior mean per query, in output units.
    pub mean: Vec<f64>,
    /// Posterior standard deviation per query, in output units.
    pub std: Vec<f64>,
}

/// A Gaussian process fitted to one function's observations.
///
/// Outputs are standardized before fitting (zero mean, unit population
/// variance, with a zero variance treated as 1) and predictions are mapped
/// back to output units. Predictive variance includes the white-noise term.
///
/// # Examples
///
/// ```
/// use bbopt::gp::{GaussianProcess, KernelParams};
///
/// let x = vec![vec![0.1], vec![0.5], vec![0.9]];
/// let y = vec![1.0, 5.0, 2.0];
/// let gp = GaussianProcess::fit(&x, &y, KernelParams::default()).unwrap();
///
/// let pred = gp.predict(&[vec![0.5], vec![0.3]]);
/// assert_eq!(pred.mean.len(), 2);
/// assert!((pred.mean[0] - 5.0).abs() < 0.1);
/// ```
pub struct GaussianProcess {
    params: KernelParams,
    x_train: Vec<Vec<f64>>,
    cholesky: Cholesky<f64, Dyn>,
    /// α = (K + σ²I)^{-1} y, standardized.
    alpha: DVector<f64>,
    y_mean: f64,
    y_scale: f64,
    log_marginal_likelihood: f64,
}

impl GaussianProcess {
    /// Fits a GP with fixed hyperparameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyObservations`] for empty training data and
    /// [`Error::SingularKernel`] if the Gram matrix cannot be factorized even
    /// with the largest jitter.
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(x: &[Vec<f64>], y: &[f64], params: KernelParams) -> Result<Self> {
        let n = y.len();
        if n == 0 || x.len() != n {
            return Err(Error::EmptyObservations);
        }

        let y_mean = y.iter().sum::<f64>() / n as f64;
        let y_var = y.iter().map(|v| (v - y_mean).powi(2)).sum::<f64>() / n as f64;
        let y_scale = if y_var > 0.0 { y_var.sqrt() } else { 1.0 };
        let y_std = DVector::from_iterator(n, y.iter().map(|v| (v - y_mean) / y_scale));

        let cholesky = factorize(&params, x)?;
        let alpha = cholesky.solve(&y_std);

        let log_det_half: f64 = cholesky.l_dirty().diagonal().iter().map(|d| d.ln()).sum();
        let log_marginal_likelihood = -0.5 * y_std.dot(&alpha)
            - log_det_half
            - 0.5 * n as f64 * core::f64::consts::TAU.ln();

        Ok(Self {
            params,
            x_train: x.to_vec(),
            cholesky,
            alpha,
            y_mean,
            y_scale,
            log_marginal_likelihood,
        })
    }

    /// Hyperparameters the model was fitted with.
    #[must_use]
    pub fn params(&self) -> KernelParams {
        self.params
    }

    /// Log marginal likelihood of the standardized training outputs.
    #[must_use]
    pub fn log_marginal_likelihood(&self) -> f64 {
        self.log_marginal_likelihood
    }

    /// Number of training points.
    #[must_use]
    pub fn n_train(&self) -> usize {
        self.x_train.len()
    }

    /// Predicts mean and standard deviation for every query point.
    #[must_use]
    pub fn predict(&self, queries: &[Vec<f64>]) -> Prediction {
        if queries.is_empty() {
            return Prediction {
                mean: Vec::new(),
                std: Vec::new(),
            };
        }

        let k_star: DMatrix<f64> = self.params.cross(&self.x_train, queries);
        let mean_std = k_star.tr_mul(&self.alpha);
        let v = self.cholesky.solve(&k_star);
        let prior = self.params.prior_variance();

        let mut mean = Vec::with_capacity(queries.len());
        let mut std = Vec::with_capacity(queries.len());
        for j in 0..queries.len() {
            let reduction = k_star.column(j).dot(&v.column(j));
            let var = (prior - reduction).max(0.0);
            mean.push(mean_std[j] * self.y_scale + self.y_mean);
            std.push(var.sqrt() * self.y_scale);
        }
        Prediction { mean, std }
    }
}

/// Cholesky-factorize the Gram matrix, escalating diagonal jitter on failure.
fn factorize(params: &KernelParams, x: &[Vec<f64>]) -> Result<Cholesky<f64, Dyn>> {
    let mut jitter = INITIAL_JITTER;
    while jitter <= MAX_JITTER {
        if let Some(cholesky) = Cholesky::new(params.gram(x, jitter)) {
            return Ok(cholesky);
        }
        trace_debug!(jitter, "cholesky failed, escalating jitter");
        jitter *= 10.0;
    }
    Err(Error::SingularKernel)
}
