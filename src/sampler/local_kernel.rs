//! Locally-weighted heuristic sampler.
//!
//! A model-free middle ground between pure space filling and the GP: the
//! value of a candidate is estimated by a Nadaraya–Watson average of the
//! observed outputs with Gaussian weights, and an exploration bonus
//! proportional to the candidate's distance from the nearest observation is
//! added. Candidates are Gaussian perturbations of the best observed point
//! plus uniform samples over the box.
//!
//! # Configuration
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `num_local` | 2000 | Perturbations of the best observed point |
//! | `num_random` | 5000 | Uniform samples over the box |
//! | `local_scale` | 0.1 | Standard deviation of the perturbations |

use super::{Diagnostics, Proposal, Proposer};
use crate::candidates::perturb;
use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::observation::{ObservationSet, argmax, euclidean, median};

const DEFAULT_NUM_LOCAL: usize = 2000;
const DEFAULT_NUM_RANDOM: usize = 5000;
const DEFAULT_LOCAL_SCALE: f64 = 0.1;
/// Bandwidth used when the median pairwise distance is unusable.
pub const FALLBACK_BANDWIDTH: f64 = 0.1;
/// Weight of the nearest-neighbour distance bonus.
const BONUS_WEIGHT: f64 = 0.1;

/// Diagnostics from a locally-weighted proposal.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocalKernelDiagnostics {
    /// Kernel-weighted prediction at the chosen point.
    pub predicted: f64,
    /// Exploration bonus at the chosen point.
    pub bonus: f64,
    /// Gaussian kernel bandwidth.
    pub bandwidth: f64,
    /// Distance from the chosen point to the closest observation.
    pub nearest_distance: f64,
    /// Total candidates considered.
    pub pool_size: usize,
}

/// Nadaraya–Watson sampler with a distance bonus.
///
/// # Examples
///
/// ```
/// use bbopt::sampler::{LocalKernelSampler, Proposer};
/// use bbopt::{Domain, ObservationSet};
///
/// let obs = ObservationSet::new(
///     vec![vec![0.2, 0.2], vec![0.5, 0.5], vec![0.8, 0.1]],
///     vec![0.1, 0.9, 0.3],
/// )
/// .unwrap();
/// let sampler = LocalKernelSampler::builder()
///     .num_local(200)
///     .num_random(200)
///     .build()
///     .unwrap();
///
/// let mut rng = fastrand::Rng::with_seed(7);
/// let proposal = sampler.propose(&obs, &Domain::unit(), &mut rng).unwrap();
/// assert!(proposal.point.iter().all(|v| (0.0..1.0).contains(v)));
/// ```
#[derive(Clone, Debug)]
pub struct LocalKernelSampler {
    num_local: usize,
    num_random: usize,
    local_scale: f64,
}

impl Default for LocalKernelSampler {
    fn default() -> Self {
        Self {
            num_local: DEFAULT_NUM_LOCAL,
            num_random: DEFAULT_NUM_RANDOM,
            local_scale: DEFAULT_LOCAL_SCALE,
        }
    }
}

impl LocalKernelSampler {
    /// Creates a sampler with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for configuring a `LocalKernelSampler`.
    #[must_use]
    pub fn builder() -> LocalKernelSamplerBuilder {
        LocalKernelSamplerBuilder::default()
    }
}

/// Builder for [`LocalKernelSampler`].
#[derive(Clone, Debug, Default)]
pub struct LocalKernelSamplerBuilder {
    num_local: Option<usize>,
    num_random: Option<usize>,
    local_scale: Option<f64>,
}

impl LocalKernelSamplerBuilder {
    /// Sets the number of perturbations around the best point.
    #[must_use]
    pub fn num_local(mut self, n: usize) -> Self {
        self.num_local = Some(n);
        self
    }

    /// Sets the number of uniform samples.
    #[must_use]
    pub fn num_random(mut self, n: usize) -> Self {
        self.num_random = Some(n);
        self
    }

    /// Sets the perturbation standard deviation.
    #[must_use]
    pub fn local_scale(mut self, scale: f64) -> Self {
        self.local_scale = Some(scale);
        self
    }

    /// Builds the configured [`LocalKernelSampler`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroCount`] if the pool would be empty and
    /// [`Error::InvalidScale`] for a negative or non-finite `local_scale`.
    pub fn build(self) -> Result<LocalKernelSampler> {
        let sampler = LocalKernelSampler {
            num_local: self.num_local.unwrap_or(DEFAULT_NUM_LOCAL),
            num_random: self.num_random.unwrap_or(DEFAULT_NUM_RANDOM),
            local_scale: self.local_scale.unwrap_or(DEFAULT_LOCAL_SCALE),
        };
        if sampler.num_local + sampler.num_random == 0 {
            return Err(Error::ZeroCount("num_local + num_random"));
        }
        if !sampler.local_scale.is_finite() || sampler.local_scale < 0.0 {
            return Err(Error::InvalidScale {
                name: "local_scale",
                value: sampler.local_scale,
            });
        }
        Ok(sampler)
    }
}

/// Median pairwise distance between observed inputs, or
/// [`FALLBACK_BANDWIDTH`] when that is not a usable positive number.
#[must_use]
pub fn bandwidth(observations: &ObservationSet) -> f64 {
    let x = observations.inputs();
    if x.len() < 2 {
        return FALLBACK_BANDWIDTH;
    }
    let mut pairwise = Vec::with_capacity(x.len() * (x.len() - 1) / 2);
    for (i, a) in x.iter().enumerate() {
        for b in &x[i + 1..] {
            pairwise.push(euclidean(a, b));
        }
    }
    let h = median(&pairwise);
    if h.is_finite() && h > 0.0 {
        h
    } else {
        FALLBACK_BANDWIDTH
    }
}

/// Gaussian-weighted average of the observed outputs at `point`.
///
/// Weights are normalized in log space so distant queries still get a
/// finite average dominated by the closest observation.
#[must_use]
pub fn kernel_regression(observations: &ObservationSet, point: &[f64], bandwidth: f64) -> f64 {
    let inv_two_h2 = 1.0 / (2.0 * bandwidth * bandwidth);
    let log_w: Vec<f64> = observations
        .inputs()
        .iter()
        .map(|row| -euclidean(row, point).powi(2) * inv_two_h2)
        .collect();
    let max_log_w = log_w.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let (num, den) = log_w
        .iter()
        .zip(observations.outputs())
        .fold((0.0, 0.0), |(num, den), (&lw, &y)| {
            let w = (lw - max_log_w).exp();
            (num + w * y, den + w)
        });
    num / den
}

impl Proposer for LocalKernelSampler {
    fn propose(
        &self,
        observations: &ObservationSet,
        domain: &Domain,
        rng: &mut fastrand::Rng,
    ) -> Result<Proposal> {
        let n_dims = observations.n_dims();
        let center = observations.best_point();

        let mut candidates = Vec::with_capacity(self.num_local + self.num_random);
        for _ in 0..self.num_local {
            candidates.push(perturb(center, self.local_scale, domain, rng));
        }
        for _ in 0..self.num_random {
            candidates.push(domain.sample_uniform(rng, n_dims));
        }

        let h = bandwidth(observations);
        let range = observations.output_stats().range;
        let bonus_scale = BONUS_WEIGHT * if range > 0.0 { range } else { 0.1 };

        let mut predicted = Vec::with_capacity(candidates.len());
        let mut nearest = Vec::with_capacity(candidates.len());
        let mut scores = Vec::with_capacity(candidates.len());
        for c in &candidates {
            let mu = kernel_regression(observations, c, h);
            let d = observations.nearest_distance(c);
            scores.push(mu + bonus_scale * d);
            predicted.push(mu);
            nearest.push(d);
        }

        let index = argmax(&scores).ok_or(Error::EmptyCandidatePool)?;
        let point = domain.clip_open(&candidates[index]);

        trace_debug!(
            bandwidth = h,
            predicted = predicted[index],
            nearest_distance = nearest[index],
            "local-kernel proposal"
        );

        Ok(Proposal {
            point,
            diagnostics: Diagnostics::LocalKernel(LocalKernelDiagnostics {
                predicted: predicted[index],
                bonus: bonus_scale * nearest[index],
                bandwidth: h,
                nearest_distance: nearest[index],
                pool_size: candidates.len(),
            }),
        })
    }
}
