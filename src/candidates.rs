//! Candidate pool mixing global exploration and local refinement.

use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::rng_util;

/// Where a candidate came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Origin {
    /// Uniform sample over the whole box.
    Global,
    /// Gaussian perturbation around the best observed point.
    Local,
}

/// Pool sizes and local perturbation scale.
///
/// | D | global | local | σ_local |
/// |---|--------|-------|---------|
/// | ≤ 4 | 5000 | 600 | 0.08 |
/// | ≤ 6 | 7000 | 500 | 0.10 |
/// | > 6 | 9000 | 400 | 0.12 |
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolConfig {
    /// Number of uniform samples.
    pub n_global: usize,
    /// Number of local perturbations around the best point.
    pub n_local: usize,
    /// Standard deviation of the local perturbations.
    pub local_sigma: f64,
}

impl PoolConfig {
    /// Default pool for `n_dims` dimensions.
    #[must_use]
    pub fn for_dimension(n_dims: usize) -> Self {
        match n_dims {
            0..=4 => Self {
                n_global: 5000,
                n_local: 600,
                local_sigma: 0.08,
            },
            5..=6 => Self {
                n_global: 7000,
                n_local: 500,
                local_sigma: 0.10,
            },
            _ => Self {
                n_global: 9000,
                n_local: 400,
                local_sigma: 0.12,
            },
        }
    }

    /// Checks the pool is non-empty and the local scale is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroCount`] for an empty pool and
    /// [`Error::InvalidScale`] for a negative or non-finite `local_sigma`.
    pub fn validate(&self) -> Result<()> {
        if self.n_global + self.n_local == 0 {
            return Err(Error::ZeroCount("n_global + n_local"));
        }
        if !self.local_sigma.is_finite() || self.local_sigma < 0.0 {
            return Err(Error::InvalidScale {
                name: "local_sigma",
                value: self.local_sigma,
            });
        }
        Ok(())
    }

    /// Total number of candidates drawn.
    #[must_use]
    pub fn size(&self) -> usize {
        self.n_global + self.n_local
    }
}

/// A batch of candidate points and their provenance.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CandidatePool {
    /// Candidate points, each inside the domain the pool was drawn for.
    pub points: Vec<Vec<f64>>,
    /// Provenance of each point.
    pub origins: Vec<Origin>,
}

impl CandidatePool {
    /// Draws `n_global` uniform points, then `n_local` Gaussian
    /// perturbations of `center` clipped into `domain`.
    #[must_use]
    pub fn generate(
        config: &PoolConfig,
        center: &[f64],
        domain: &Domain,
        rng: &mut fastrand::Rng,
    ) -> Self {
        let n_dims = center.len();
        let mut points = Vec::with_capacity(config.size());
        let mut origins = Vec::with_capacity(config.size());

        for _ in 0..config.n_global {
            points.push(domain.sample_uniform(rng, n_dims));
            origins.push(Origin::Global);
        }
        for _ in 0..config.n_local {
            points.push(perturb(center, config.local_sigma, domain, rng));
            origins.push(Origin::Local);
        }

        Self { points, origins }
    }

    /// Number of candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// `true` if the pool has no candidates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Gaussian perturbation of `center`, clipped into `domain`.
pub(crate) fn perturb(
    center: &[f64],
    sigma: f64,
    domain: &Domain,
    rng: &mut fastrand::Rng,
) -> Vec<f64> {
    center
        .iter()
        .map(|&c| domain.clamp(c + sigma * rng_util::standard_normal(rng)))
        .collect()
}
