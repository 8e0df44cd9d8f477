//! Space-filling cold-start sampler.
//!
//! Pools uniform-random and Latin-hypercube candidates inside the box and
//! picks the one farthest from every existing observation (max-min
//! distance). No model is fitted, so this is the policy for the first round
//! of a function, or whenever a cheap, purely exploratory proposal is
//! wanted.
//!
//! # Pool sizes
//!
//! | D | `num_random` | `num_lhs` |
//! |---|--------------|-----------|
//! | ≤ 3 | 5000 | 5000 |
//! | ≤ 6 | 7000 | 5000 |
//! | > 6 | 10000 | 6000 |
//!
//! # Examples
//!
//! ```
//! use bbopt::sampler::{Proposer, SpaceFillingSampler};
//! use bbopt::{Domain, ObservationSet};
//!
//! let obs = ObservationSet::new(vec![vec![0.1, 0.1], vec![0.9, 0.9]], vec![0.0, 1.0]).unwrap();
//! let sampler = SpaceFillingSampler::builder().num_random(200).num_lhs(200).build().unwrap();
//!
//! let mut rng = fastrand::Rng::with_seed(42);
//! let proposal = sampler.propose(&obs, &Domain::unit(), &mut rng).unwrap();
//! assert_eq!(proposal.point.len(), 2);
//! ```

use super::lhs::latin_hypercube;
use super::{Diagnostics, Proposal, Proposer};
use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::observation::{ObservationSet, argmax};

/// Diagnostics from a space-filling proposal.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpaceFillingDiagnostics {
    /// Distance from the chosen point to the closest observation.
    pub min_distance: f64,
    /// Total candidates considered.
    pub pool_size: usize,
    /// Uniform candidates in the pool.
    pub num_random: usize,
    /// Latin-hypercube candidates in the pool.
    pub num_lhs: usize,
}

/// Max-min-distance sampler over uniform and Latin-hypercube candidates.
#[derive(Clone, Debug, Default)]
pub struct SpaceFillingSampler {
    num_random: Option<usize>,
    num_lhs: Option<usize>,
}

impl SpaceFillingSampler {
    /// Creates a sampler with dimension-dependent pool sizes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for configuring a `SpaceFillingSampler`.
    #[must_use]
    pub fn builder() -> SpaceFillingSamplerBuilder {
        SpaceFillingSamplerBuilder::default()
    }

    /// `(num_random, num_lhs)` used for `n_dims` dimensions.
    #[must_use]
    pub fn pool_sizes(&self, n_dims: usize) -> (usize, usize) {
        let (random, lhs) = default_pool_sizes(n_dims);
        (self.num_random.unwrap_or(random), self.num_lhs.unwrap_or(lhs))
    }
}

/// Reference pool sizes by dimensionality.
#[must_use]
pub fn default_pool_sizes(n_dims: usize) -> (usize, usize) {
    match n_dims {
        0..=3 => (5000, 5000),
        4..=6 => (7000, 5000),
        _ => (10000, 6000),
    }
}

/// Builder for [`SpaceFillingSampler`].
///
/// Unset sizes follow [`default_pool_sizes`].
#[derive(Clone, Debug, Default)]
pub struct SpaceFillingSamplerBuilder {
    num_random: Option<usize>,
    num_lhs: Option<usize>,
}

impl SpaceFillingSamplerBuilder {
    /// Sets the number of uniform-random candidates.
    #[must_use]
    pub fn num_random(mut self, n: usize) -> Self {
        self.num_random = Some(n);
        self
    }

    /// Sets the number of Latin-hypercube candidates.
    #[must_use]
    pub fn num_lhs(mut self, n: usize) -> Self {
        self.num_lhs = Some(n);
        self
    }

    /// Builds the configured [`SpaceFillingSampler`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroCount`] if both sizes are explicitly zero.
    pub fn build(self) -> Result<SpaceFillingSampler> {
        if self.num_random == Some(0) && self.num_lhs == Some(0) {
            return Err(Error::ZeroCount("num_random + num_lhs"));
        }
        Ok(SpaceFillingSampler {
            num_random: self.num_random,
            num_lhs: self.num_lhs,
        })
    }
}

/// Index of the candidate whose closest observation is farthest away,
/// with that distance. First occurrence wins ties.
#[must_use]
pub fn max_min_distance(candidates: &[Vec<f64>], observations: &ObservationSet) -> Option<(usize, f64)> {
    let min_dists: Vec<f64> = candidates
        .iter()
        .map(|c| observations.nearest_distance(c))
        .collect();
    argmax(&min_dists).map(|i| (i, min_dists[i]))
}

impl Proposer for SpaceFillingSampler {
    fn propose(
        &self,
        observations: &ObservationSet,
        domain: &Domain,
        rng: &mut fastrand::Rng,
    ) -> Result<Proposal> {
        let n_dims = observations.n_dims();
        let (num_random, num_lhs) = self.pool_sizes(n_dims);

        let mut candidates: Vec<Vec<f64>> = Vec::with_capacity(num_random + num_lhs);
        for _ in 0..num_random {
            candidates.push(domain.sample_uniform(rng, n_dims));
        }
        candidates.extend(
            latin_hypercube(num_lhs, n_dims, rng)
                .into_iter()
                .map(|p| p.into_iter().map(|v| domain.scale_unit(v)).collect()),
        );

        let (index, min_distance) =
            max_min_distance(&candidates, observations).ok_or(Error::EmptyCandidatePool)?;
        let point = domain.clip_open(&candidates[index]);

        trace_debug!(min_distance, pool_size = candidates.len(), "space-filling proposal");

        Ok(Proposal {
            point,
            diagnostics: Diagnostics::SpaceFilling(SpaceFillingDiagnostics {
                min_distance,
                pool_size: candidates.len(),
                num_random,
                num_lhs,
            }),
        })
    }
}
