//! Gaussian Process proposer with an EI/UCB switch and a boundary guard.
//!
//! # Algorithm overview
//!
//! 1. **Startup phase** (optional): while fewer than
//!    `n_startup_observations` observations exist, the proposal is delegated
//!    to a cold-start proposer ([`SpaceFillingSampler`] by default).
//! 2. **Choose the acquisition** from the output statistics: Expected
//!    Improvement when the best output stands at least `z_best_threshold`
//!    standard deviations above the median, Upper Confidence Bound
//!    otherwise. See [`AcquisitionPolicy::select`].
//! 3. **Fit the surrogate** by randomized cross-validated search over the
//!    Matérn 5/2 kernel's amplitude, length scale and noise level, then
//!    refine the winner on the log marginal likelihood.
//! 4. **Score a candidate pool** of uniform samples plus perturbations of
//!    the best observed point.
//! 5. **Select** with the boundary penalty and duplicate mask. If the winner
//!    sits within `boundary_margin` of a bound, steps 3 to 5 are rerun once
//!    on the box shrunk by the margin.
//!
//! # Configuration
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `boundary_margin` | 0.05 | Width of the soft boundary penalty and the retry shrink |
//! | `z_best_threshold` | 2.5 | z-score at which EI replaces UCB |
//! | `kappa` | 1.96 | UCB exploration weight |
//! | `pool` | by dimension | Candidate pool sizes, see [`PoolConfig::for_dimension`] |
//! | `search` | by dimension and N | Search trials, folds and refinement restarts, see [`SearchConfig::for_problem`] |
//! | `n_startup_observations` | 0 | Observations required before the GP is used |
//!
//! # Examples
//!
//! ```
//! use bbopt::sampler::{GpSampler, Proposer};
//! use bbopt::{Domain, ObservationSet};
//!
//! let obs = ObservationSet::new(
//!     vec![vec![0.1, 0.2], vec![0.5, 0.5], vec![0.8, 0.3]],
//!     vec![0.2, 0.9, 0.4],
//! )
//! .unwrap();
//! let domain = Domain::new(0.001, 0.98).unwrap();
//! let sampler = GpSampler::builder().boundary_margin(0.05).build().unwrap();
//!
//! let mut rng = fastrand::Rng::with_seed(20_260_204);
//! let proposal = sampler.propose(&obs, &domain, &mut rng).unwrap();
//!
//! assert_eq!(proposal.point.len(), 2);
//! assert!(proposal.point.iter().all(|&v| v >= 0.001 && v < 0.98));
//! assert_eq!(proposal.diagnostics.as_gp().unwrap().acquisition.name(), "ucb");
//! ```

use super::space_filling::SpaceFillingSampler;
use super::{Diagnostics, Proposal, Proposer};
use crate::acquisition::{
    AcquisitionPolicy, DEFAULT_KAPPA, DEFAULT_Z_BEST_THRESHOLD, expected_improvement,
    upper_confidence_bound,
};
use crate::candidates::{CandidatePool, PoolConfig};
use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::gp::{KernelParams, SearchConfig, search};
use crate::observation::ObservationSet;
use crate::selection::{Selection, select, select_with_retry};

/// Default soft-boundary margin.
pub const DEFAULT_BOUNDARY_MARGIN: f64 = 0.05;

/// Diagnostics from a GP proposal.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GpDiagnostics {
    /// Acquisition function used.
    pub acquisition: AcquisitionPolicy,
    /// Largest observed output.
    pub best_y: f64,
    /// Median observed output.
    pub y_median: f64,
    /// Population std of the outputs, 1 if zero.
    pub y_std: f64,
    /// `(best_y - y_median) / y_std`.
    pub z_best: f64,
    /// Kernel hyperparameters chosen by the search.
    pub kernel: KernelParams,
    /// Mean held-out R² of the winning search draw; `None` when too few
    /// observations make every fold unscorable.
    pub search_score: Option<f64>,
    /// Log marginal likelihood of the final model.
    pub log_marginal_likelihood: f64,
    /// Penalized acquisition score of the winner.
    pub candidate_score: f64,
    /// Expected Improvement at the winner.
    pub candidate_ei: f64,
    /// Upper Confidence Bound at the winner.
    pub candidate_ucb: f64,
    /// Distance from the winner to the closest observation.
    pub candidate_min_dist: f64,
    /// Distance from the winner to the closest bound of the active domain.
    pub candidate_bound_dist: f64,
    /// 1, or 2 if the boundary retry ran.
    pub attempts: usize,
    /// Lower bound of the domain the winner was chosen in.
    pub active_low: f64,
    /// Upper bound of the domain the winner was chosen in.
    pub active_high: f64,
    /// Number of candidates scored in the accepted attempt.
    pub pool_size: usize,
    /// `true` if every candidate was a duplicate and the mask was ignored.
    pub duplicate_mask_dropped: bool,
}

/// GP-based proposer.
///
/// Stateless apart from its configuration: every random draw comes from the
/// `rng` passed to [`propose`](Proposer::propose).
pub struct GpSampler {
    boundary_margin: f64,
    z_best_threshold: f64,
    kappa: f64,
    pool: Option<PoolConfig>,
    search: Option<SearchConfig>,
    n_startup_observations: usize,
    startup: Box<dyn Proposer>,
}

impl GpSampler {
    /// Creates a sampler with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            boundary_margin: DEFAULT_BOUNDARY_MARGIN,
            z_best_threshold: DEFAULT_Z_BEST_THRESHOLD,
            kappa: DEFAULT_KAPPA,
            pool: None,
            search: None,
            n_startup_observations: 0,
            startup: Box::new(SpaceFillingSampler::new()),
        }
    }

    /// Creates a builder for configuring a `GpSampler`.
    #[must_use]
    pub fn builder() -> GpSamplerBuilder {
        GpSamplerBuilder::new()
    }

    /// The soft-boundary margin.
    #[must_use]
    pub fn boundary_margin(&self) -> f64 {
        self.boundary_margin
    }

    /// Pool used for `n_dims` dimensions.
    #[must_use]
    pub fn pool_config(&self, n_dims: usize) -> PoolConfig {
        self.pool
            .unwrap_or_else(|| PoolConfig::for_dimension(n_dims))
    }

    /// Search settings used for `n_dims` dimensions and `n_obs` observations.
    #[must_use]
    pub fn search_config(&self, n_dims: usize, n_obs: usize) -> SearchConfig {
        self.search
            .unwrap_or_else(|| SearchConfig::for_problem(n_dims, n_obs))
    }
}

impl Default for GpSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for GpSampler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GpSampler")
            .field("boundary_margin", &self.boundary_margin)
            .field("z_best_threshold", &self.z_best_threshold)
            .field("kappa", &self.kappa)
            .field("pool", &self.pool)
            .field("search", &self.search)
            .field("n_startup_observations", &self.n_startup_observations)
            .finish_non_exhaustive()
    }
}

/// Builder for [`GpSampler`].
///
/// # Defaults
///
/// - `boundary_margin`: 0.05
/// - `z_best_threshold`: 2.5
/// - `kappa`: 1.96
/// - `pool`: [`PoolConfig::for_dimension`]
/// - `search`: [`SearchConfig::for_problem`]
/// - `n_startup_observations`: 0
/// - `startup`: [`SpaceFillingSampler`]
///
/// # Examples
///
/// ```
/// use bbopt::candidates::PoolConfig;
/// use bbopt::sampler::{GpSampler, LocalKernelSampler};
///
/// let sampler = GpSampler::builder()
///     .boundary_margin(0.1)
///     .kappa(2.5)
///     .pool(PoolConfig { n_global: 1000, n_local: 200, local_sigma: 0.05 })
///     .n_startup_observations(5)
///     .startup(LocalKernelSampler::new())
///     .build()
///     .unwrap();
/// assert!((sampler.boundary_margin() - 0.1).abs() < 1e-12);
/// ```
pub struct GpSamplerBuilder {
    boundary_margin: f64,
    z_best_threshold: f64,
    kappa: f64,
    pool: Option<PoolConfig>,
    search: Option<SearchConfig>,
    n_startup_observations: usize,
    startup: Option<Box<dyn Proposer>>,
}

impl GpSamplerBuilder {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            boundary_margin: DEFAULT_BOUNDARY_MARGIN,
            z_best_threshold: DEFAULT_Z_BEST_THRESHOLD,
            kappa: DEFAULT_KAPPA,
            pool: None,
            search: None,
            n_startup_observations: 0,
            startup: None,
        }
    }

    /// Sets the soft-boundary margin. Zero disables the penalty and retry.
    #[must_use]
    pub fn boundary_margin(mut self, margin: f64) -> Self {
        self.boundary_margin = margin;
        self
    }

    /// Sets the z-score at or above which EI replaces UCB.
    #[must_use]
    pub fn z_best_threshold(mut self, threshold: f64) -> Self {
        self.z_best_threshold = threshold;
        self
    }

    /// Sets the UCB exploration weight.
    #[must_use]
    pub fn kappa(mut self, kappa: f64) -> Self {
        self.kappa = kappa;
        self
    }

    /// Overrides the candidate pool for every dimensionality.
    #[must_use]
    pub fn pool(mut self, pool: PoolConfig) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Overrides the hyperparameter search settings.
    #[must_use]
    pub fn search(mut self, search: SearchConfig) -> Self {
        self.search = Some(search);
        self
    }

    /// Sets how many observations are needed before the GP is used.
    #[must_use]
    pub fn n_startup_observations(mut self, n: usize) -> Self {
        self.n_startup_observations = n;
        self
    }

    /// Sets the proposer used during the startup phase.
    #[must_use]
    pub fn startup(mut self, proposer: impl Proposer + 'static) -> Self {
        self.startup = Some(Box::new(proposer));
        self
    }

    /// Builds the configured [`GpSampler`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMargin`] for a negative or non-finite margin,
    /// [`Error::NonFiniteParameter`] for a non-finite threshold or `kappa`,
    /// and the validation errors of [`PoolConfig`] and [`SearchConfig`].
    pub fn build(self) -> Result<GpSampler> {
        if !self.boundary_margin.is_finite() || self.boundary_margin < 0.0 {
            return Err(Error::InvalidMargin(self.boundary_margin));
        }
        if !self.z_best_threshold.is_finite() {
            return Err(Error::NonFiniteParameter {
                name: "z_best_threshold",
                value: self.z_best_threshold,
            });
        }
        if !self.kappa.is_finite() {
            return Err(Error::NonFiniteParameter {
                name: "kappa",
                value: self.kappa,
            });
        }
        if let Some(pool) = &self.pool {
            pool.validate()?;
        }
        if let Some(search) = &self.search {
            search.validate()?;
        }

        Ok(GpSampler {
            boundary_margin: self.boundary_margin,
            z_best_threshold: self.z_best_threshold,
            kappa: self.kappa,
            pool: self.pool,
            search: self.search,
            n_startup_observations: self.n_startup_observations,
            startup: self
                .startup
                .unwrap_or_else(|| Box::new(SpaceFillingSampler::new())),
        })
    }
}

impl Default for GpSamplerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for GpSamplerBuilder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GpSamplerBuilder")
            .field("boundary_margin", &self.boundary_margin)
            .field("z_best_threshold", &self.z_best_threshold)
            .field("kappa", &self.kappa)
            .field("pool", &self.pool)
            .field("search", &self.search)
            .field("n_startup_observations", &self.n_startup_observations)
            .field("custom_startup", &self.startup.is_some())
            .finish()
    }
}

/// What one attempt produces alongside its selection.
struct Attempt {
    point: Vec<f64>,
    mean: f64,
    std: f64,
    kernel: KernelParams,
    search_score: Option<f64>,
    log_marginal_likelihood: f64,
    pool_size: usize,
}

impl GpSampler {
    /// Search, fit, pool, score and select inside `active`.
    fn attempt(
        &self,
        observations: &ObservationSet,
        policy: AcquisitionPolicy,
        active: &Domain,
        rng: &mut fastrand::Rng,
    ) -> Result<(Attempt, Selection)> {
        let n_dims = observations.n_dims();
        let outcome = search::search(
            observations,
            self.search_config(n_dims, observations.len()),
            rng,
        )?;

        let pool = CandidatePool::generate(
            &self.pool_config(n_dims),
            observations.best_point(),
            active,
            rng,
        );
        let prediction = outcome.model.predict(&pool.points);
        let scores = policy.score_all(
            &prediction.mean,
            &prediction.std,
            observations.best_value(),
        );
        let selection = select(
            &scores,
            &pool.points,
            observations,
            active,
            self.boundary_margin,
        )?;

        let i = selection.index;
        Ok((
            Attempt {
                point: pool.points[i].clone(),
                mean: prediction.mean[i],
                std: prediction.std[i],
                kernel: outcome.params,
                search_score: outcome.score.is_finite().then_some(outcome.score),
                log_marginal_likelihood: outcome.model.log_marginal_likelihood(),
                pool_size: pool.len(),
            },
            selection,
        ))
    }
}

impl Proposer for GpSampler {
    fn propose(
        &self,
        observations: &ObservationSet,
        domain: &Domain,
        rng: &mut fastrand::Rng,
    ) -> Result<Proposal> {
        if observations.len() < self.n_startup_observations {
            trace_debug!(
                n_observations = observations.len(),
                n_startup = self.n_startup_observations,
                "startup phase, delegating proposal"
            );
            return self.startup.propose(observations, domain, rng);
        }

        let stats = observations.output_stats();
        let policy = AcquisitionPolicy::select(&stats, self.z_best_threshold, self.kappa);

        let guarded = select_with_retry(domain, self.boundary_margin, |active| {
            self.attempt(observations, policy, active, rng)
        })?;
        let Attempt {
            point,
            mean,
            std,
            kernel,
            search_score,
            log_marginal_likelihood,
            pool_size,
        } = guarded.value;
        let selection = guarded.selection;

        let xi = 0.01 * stats.std;
        let diagnostics = GpDiagnostics {
            acquisition: policy,
            best_y: stats.best,
            y_median: stats.median,
            y_std: stats.std_or_one(),
            z_best: stats.z_best(),
            kernel,
            search_score,
            log_marginal_likelihood,
            candidate_score: selection.score,
            candidate_ei: expected_improvement(mean, std, stats.best, xi),
            candidate_ucb: upper_confidence_bound(mean, std, self.kappa),
            candidate_min_dist: selection.nearest_distance,
            candidate_bound_dist: selection.boundary_distance,
            attempts: guarded.attempts,
            active_low: guarded.domain.low(),
            active_high: guarded.domain.high(),
            pool_size,
            duplicate_mask_dropped: selection.duplicate_mask_dropped,
        };

        trace_info!(
            acquisition = policy.name(),
            attempts = guarded.attempts,
            score = selection.score,
            z_best = diagnostics.z_best,
            "gp proposal selected"
        );

        Ok(Proposal {
            point: domain.clip_open(&point),
            diagnostics: Diagnostics::Gp(diagnostics),
        })
    }
}
