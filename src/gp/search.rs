//! Randomized cross-validated search over kernel hyperparameters.
//!
//! Each trial draws `(amplitude, length_scale, noise_level)` log-uniformly,
//! scores it by mean held-out R² over contiguous K folds, and the best
//! finite score wins. The winner is refit on every observation.
//!
//! Tiny samples produce undersized folds; an R² that cannot be computed is
//! NaN and simply ranks last. If no trial has a finite score the first
//! trial's parameters are used.
//!
//! The winning draw is only a starting point: it and `n_restarts` fresh
//! draws are refined by maximizing the log marginal likelihood on all
//! observations, and the most likely refined model is returned.

use super::kernel::KernelParams;
use super::model::GaussianProcess;
use super::refine::refine;
use crate::error::{Error, Result};
use crate::observation::ObservationSet;
use crate::rng_util;

/// Log-uniform range for the kernel amplitude.
pub const AMPLITUDE_RANGE: (f64, f64) = (1e-3, 1e3);
/// Log-uniform range for the length scale.
pub const LENGTH_SCALE_RANGE: (f64, f64) = (1e-4, 10.0);
/// Log-uniform range for the white-noise level.
pub const NOISE_RANGE: (f64, f64) = (1e-9, 1.0);
/// Random restarts of the likelihood refinement.
pub const DEFAULT_N_RESTARTS: usize = 2;

/// Trial and fold counts for the hyperparameter search.
///
/// Defaults shrink with dimensionality to bound cost on small,
/// high-dimensional samples; see [`SearchConfig::for_problem`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchConfig {
    /// Number of random hyperparameter draws.
    pub n_trials: usize,
    /// Number of cross-validation folds.
    pub n_folds: usize,
    /// Extra random starting points for likelihood refinement.
    #[cfg_attr(feature = "serde", serde(default = "default_n_restarts"))]
    pub n_restarts: usize,
}

#[cfg(feature = "serde")]
const fn default_n_restarts() -> usize {
    DEFAULT_N_RESTARTS
}

impl SearchConfig {
    /// Default counts for `n_dims` dimensions and `n_obs` observations.
    ///
    /// Trials: 6 for D ≤ 4, 4 for D ≤ 6, 3 otherwise.
    /// Folds: 3 with at least 9 observations, else 2.
    /// Restarts: [`DEFAULT_N_RESTARTS`].
    #[must_use]
    pub fn for_problem(n_dims: usize, n_obs: usize) -> Self {
        let n_trials = match n_dims {
            0..=4 => 6,
            5..=6 => 4,
            _ => 3,
        };
        let n_folds = if n_obs >= 9 { 3 } else { 2 };
        Self {
            n_trials,
            n_folds,
            n_restarts: DEFAULT_N_RESTARTS,
        }
    }

    /// Checks that both counts are at least 1.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroCount`] naming the zero field.
    pub fn validate(&self) -> Result<()> {
        if self.n_trials == 0 {
            return Err(Error::ZeroCount("n_trials"));
        }
        if self.n_folds == 0 {
            return Err(Error::ZeroCount("n_folds"));
        }
        Ok(())
    }
}

/// Outcome of a hyperparameter search.
pub struct SearchOutcome {
    /// The refined model fit on all observations.
    pub model: GaussianProcess,
    /// The refined parameters of `model`.
    pub params: KernelParams,
    /// The winning draw before refinement.
    pub start: KernelParams,
    /// Mean held-out R² of the winning draw (NaN if no trial was scorable).
    pub score: f64,
    /// Every trial evaluated, in draw order.
    pub trials: Vec<(KernelParams, f64)>,
}

/// Draws one hyperparameter set from the log-uniform search ranges.
pub(crate) fn sample_params(rng: &mut fastrand::Rng) -> KernelParams {
    KernelParams {
        amplitude: rng_util::log_uniform(rng, AMPLITUDE_RANGE.0, AMPLITUDE_RANGE.1),
        length_scale: rng_util::log_uniform(rng, LENGTH_SCALE_RANGE.0, LENGTH_SCALE_RANGE.1),
        noise_level: rng_util::log_uniform(rng, NOISE_RANGE.0, NOISE_RANGE.1),
    }
}

/// Runs the randomized search, then refines the winner.
///
/// All draws come from `rng`, so the search advances the caller's stream
/// by exactly `3 × (n_trials + n_restarts)` values.
///
/// # Errors
///
/// Returns [`Error::SingularKernel`] only if no trial's parameters can be
/// refit on the full data.
pub fn search(
    observations: &ObservationSet,
    config: SearchConfig,
    rng: &mut fastrand::Rng,
) -> Result<SearchOutcome> {
    let x = observations.inputs();
    let y = observations.outputs();
    let folds = kfold(y.len(), config.n_folds);

    let trials: Vec<(KernelParams, f64)> = (0..config.n_trials)
        .map(|_| {
            let params = sample_params(rng);
            (params, cross_validate(x, y, &folds, params))
        })
        .collect();

    // Finite scores first, best first; stable sort keeps draw order on ties.
    let mut ranking: Vec<usize> = (0..trials.len()).collect();
    ranking.sort_by(|&a, &b| rank_key(trials[b].1).total_cmp(&rank_key(trials[a].1)));

    let Some((start, score, fitted)) = ranking.iter().find_map(|&idx| {
        let (params, score) = trials[idx];
        GaussianProcess::fit(x, y, params)
            .ok()
            .map(|model| (params, score, model))
    }) else {
        return Err(Error::SingularKernel);
    };

    let mut starts = Vec::with_capacity(1 + config.n_restarts);
    starts.push(start);
    starts.extend((0..config.n_restarts).map(|_| sample_params(rng)));
    let model = refine(x, y, &starts).unwrap_or(fitted);
    let params = model.params();

    trace_debug!(
        score,
        amplitude = params.amplitude,
        length_scale = params.length_scale,
        noise_level = params.noise_level,
        log_marginal_likelihood = model.log_marginal_likelihood(),
        "hyperparameter search finished"
    );
    Ok(SearchOutcome {
        model,
        params,
        start,
        score,
        trials,
    })
}

fn rank_key(score: f64) -> f64 {
    if score.is_nan() {
        f64::NEG_INFINITY
    } else {
        score
    }
}

/// Contiguous K-fold split of `0..n` into held-out index ranges.
///
/// The first `n % k` folds hold one extra point. Folds may be empty when
/// `n < k`.
pub(crate) fn kfold(n: usize, k: usize) -> Vec<core::ops::Range<usize>> {
    let k = k.max(1);
    let base = n / k;
    let extra = n % k;
    let mut start = 0;
    (0..k)
        .map(|i| {
            let size = base + usize::from(i < extra);
            let range = start..start + size;
            start += size;
            range
        })
        .collect()
}

/// Mean held-out R² across folds; NaN if any fold cannot be scored.
#[allow(clippy::cast_precision_loss)]
fn cross_validate(
    x: &[Vec<f64>],
    y: &[f64],
    folds: &[core::ops::Range<usize>],
    params: KernelParams,
) -> f64 {
    let mut total = 0.0;
    for fold in folds {
        if fold.is_empty() || fold.len() == y.len() {
            return f64::NAN;
        }
        let (x_train, y_train): (Vec<Vec<f64>>, Vec<f64>) = (0..y.len())
            .filter(|i| !fold.contains(i))
            .map(|i| (x[i].clone(), y[i]))
            .unzip();
        let Ok(model) = GaussianProcess::fit(&x_train, &y_train, params) else {
            return f64::NAN;
        };
        let pred = model.predict(&x[fold.clone()]);
        total += r2_score(&y[fold.clone()], &pred.mean);
    }
    total / folds.len() as f64
}

/// Coefficient of determination.
///
/// NaN with fewer than two targets. With constant targets: 1.0 for a
/// perfect fit, else 0.0.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn r2_score(targets: &[f64], predictions: &[f64]) -> f64 {
    if targets.len() < 2 {
        return f64::NAN;
    }
    let mean = targets.iter().sum::<f64>() / targets.len() as f64;
    let ss_tot: f64 = targets.iter().map(|t| (t - mean).powi(2)).sum();
    let ss_res: f64 = targets
        .iter()
        .zip(predictions)
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

#[cfg(test)]
#[allow(clippy::cast_precision_loss)]
mod tests {
    use super::*;

    fn smooth_observations(n: usize) -> ObservationSet {
        let x: Vec<Vec<f64>> = (0..n)
            .map(|i| {
                let t = (i as f64 + 0.5) / n as f64;
                vec![t, (t * 7.0).fract()]
            })
            .collect();
        let y = x
            .iter()
            .map(|p| -(p[0] - 0.4).powi(2) - (p[1] - 0.6).powi(2))
            .collect();
        ObservationSet::new(x, y).unwrap()
    }

    #[test]
    fn defaults_shrink_with_dimension() {
        assert_eq!(SearchConfig::for_problem(2, 20).n_trials, 6);
        assert_eq!(SearchConfig::for_problem(4, 20).n_trials, 6);
        assert_eq!(SearchConfig::for_problem(5, 20).n_trials, 4);
        assert_eq!(SearchConfig::for_problem(6, 20).n_trials, 4);
        assert_eq!(SearchConfig::for_problem(8, 20).n_trials, 3);
        assert_eq!(SearchConfig::for_problem(3, 9).n_folds, 3);
        assert_eq!(SearchConfig::for_problem(3, 8).n_folds, 2);
    }

    #[test]
    fn kfold_partitions_contiguously() {
        let folds = kfold(10, 3);
        assert_eq!(folds, vec![0..4, 4..7, 7..10]);
        let folds = kfold(3, 2);
        assert_eq!(folds, vec![0..2, 2..3]);
        let folds = kfold(1, 2);
        assert_eq!(folds, vec![0..1, 1..1]);
    }

    #[test]
    fn r2_handles_degenerate_folds() {
        assert!(r2_score(&[1.0], &[1.0]).is_nan());
        assert_eq!(r2_score(&[2.0, 2.0], &[2.0, 2.0]), 1.0);
        assert_eq!(r2_score(&[2.0, 2.0], &[2.0, 3.0]), 0.0);
        assert!((r2_score(&[1.0, 3.0], &[1.0, 3.0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn search_draws_requested_trials_and_picks_best() {
        let obs = smooth_observations(12);
        let mut rng = fastrand::Rng::with_seed(5);
        let outcome = search(&obs, SearchConfig::for_problem(2, 12), &mut rng).unwrap();
        assert_eq!(outcome.trials.len(), 6);
        let best_finite = outcome
            .trials
            .iter()
            .map(|t| t.1)
            .filter(|s| s.is_finite())
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(outcome.score, best_finite);
        let winner = outcome.trials.iter().find(|t| t.1 == best_finite).unwrap();
        assert_eq!(outcome.start, winner.0);
        assert_eq!(outcome.model.params(), outcome.params);
        assert_eq!(outcome.model.n_train(), 12);
    }

    #[test]
    fn tiny_samples_start_from_first_trial() {
        let obs = ObservationSet::new(vec![vec![0.2], vec![0.7]], vec![1.0, 2.0]).unwrap();
        let mut rng = fastrand::Rng::with_seed(9);
        let outcome = search(&obs, SearchConfig::for_problem(1, 2), &mut rng).unwrap();
        assert!(outcome.score.is_nan());
        assert_eq!(outcome.start, outcome.trials[0].0);
    }

    #[test]
    fn refined_model_beats_unrefined_winner() {
        let obs = ObservationSet::new(
            vec![vec![0.1, 0.1], vec![0.5, 0.5], vec![0.9, 0.9]],
            vec![1.0, 5.0, 2.0],
        )
        .unwrap();
        for seed in 0..6 {
            let mut rng = fastrand::Rng::with_seed(seed);
            let outcome = search(&obs, SearchConfig::for_problem(2, 3), &mut rng).unwrap();
            let unrefined = GaussianProcess::fit(obs.inputs(), obs.outputs(), outcome.start)
                .unwrap()
                .log_marginal_likelihood();
            assert!(outcome.model.log_marginal_likelihood() >= unrefined - 1e-9);
            let p = outcome.params;
            assert!((LENGTH_SCALE_RANGE.0..=LENGTH_SCALE_RANGE.1).contains(&p.length_scale));
        }
    }

    #[test]
    fn restarts_advance_the_stream() {
        let obs = smooth_observations(10);
        let config = SearchConfig::for_problem(2, 10);
        let mut rng = fastrand::Rng::with_seed(4);
        search(&obs, config, &mut rng).unwrap();
        let mut reference = fastrand::Rng::with_seed(4);
        for _ in 0..config.n_trials + config.n_restarts {
            sample_params(&mut reference);
        }
        assert_eq!(rng.u64(..), reference.u64(..));
    }

    #[test]
    fn single_observation_still_fits() {
        let obs = ObservationSet::new(vec![vec![0.2, 0.3]], vec![1.0]).unwrap();
        let mut rng = fastrand::Rng::with_seed(1);
        let outcome = search(&obs, SearchConfig::for_problem(2, 1), &mut rng).unwrap();
        let pred = outcome.model.predict(&[vec![0.5, 0.5]]);
        assert!(pred.mean[0].is_finite());
    }

    #[test]
    fn search_is_reproducible_for_a_seed() {
        let obs = smooth_observations(10);
        let run = |seed| {
            let mut rng = fastrand::Rng::with_seed(seed);
            search(&obs, SearchConfig::for_problem(2, 10), &mut rng)
                .unwrap()
                .params
        };
        assert_eq!(run(77), run(77));
    }

    #[test]
    fn sampled_params_respect_ranges() {
        let mut rng = fastrand::Rng::with_seed(2);
        for _ in 0..500 {
            let p = sample_params(&mut rng);
            assert!((AMPLITUDE_RANGE.0..=AMPLITUDE_RANGE.1).contains(&p.amplitude));
            assert!((LENGTH_SCALE_RANGE.0..=LENGTH_SCALE_RANGE.1).contains(&p.length_scale));
            assert!((NOISE_RANGE.0..=NOISE_RANGE.1).contains(&p.noise_level));
        }
    }

    #[test]
    fn zero_counts_are_rejected() {
        assert!(matches!(
            SearchConfig {
                n_trials: 0,
                n_folds: 2,
                n_restarts: 0,
            }
            .validate(),
            Err(Error::ZeroCount("n_trials"))
        ));
    }
}
