//! Acquisition functions and the data-driven switch between them.
//!
//! [`AcquisitionPolicy::select`] is a pure function of the observed output
//! statistics: when the best observation already stands `z_best_threshold`
//! floored standard deviations above the median, Expected Improvement
//! exploits it; otherwise Upper Confidence Bound keeps exploring.

use crate::observation::OutputStats;

/// Default z-score at or above which EI replaces UCB.
pub const DEFAULT_Z_BEST_THRESHOLD: f64 = 2.5;
/// Default UCB exploration weight.
pub const DEFAULT_KAPPA: f64 = 1.96;
/// Predictive standard deviations at or below this are treated as zero.
pub const MIN_SIGMA: f64 = 1e-9;

/// The acquisition function used for one proposal.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum AcquisitionPolicy {
    /// Expected Improvement over the best output by at least `xi`.
    ExpectedImprovement {
        /// Improvement margin, `0.01 ×` output std.
        xi: f64,
    },
    /// `mean + kappa × std`.
    UpperConfidenceBound {
        /// Exploration weight.
        kappa: f64,
    },
}

impl AcquisitionPolicy {
    /// Chooses the policy from output statistics.
    ///
    /// # Examples
    ///
    /// ```
    /// use bbopt::AcquisitionPolicy;
    /// use bbopt::observation::OutputStats;
    ///
    /// let outlier = OutputStats::from_outputs(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 10.0]);
    /// let policy = AcquisitionPolicy::select(&outlier, 2.5, 1.96);
    /// assert_eq!(policy.name(), "ei");
    ///
    /// let flat = OutputStats::from_outputs(&[1.0, 2.0, 3.0]);
    /// assert_eq!(AcquisitionPolicy::select(&flat, 2.5, 1.96).name(), "ucb");
    /// ```
    #[must_use]
    pub fn select(stats: &OutputStats, z_best_threshold: f64, kappa: f64) -> Self {
        if stats.z_best() >= z_best_threshold {
            Self::ExpectedImprovement {
                xi: 0.01 * stats.std,
            }
        } else {
            Self::UpperConfidenceBound { kappa }
        }
    }

    /// Short name used in diagnostics: `"ei"` or `"ucb"`.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ExpectedImprovement { .. } => "ei",
            Self::UpperConfidenceBound { .. } => "ucb",
        }
    }

    /// Scores one candidate from its predictive mean and std.
    #[must_use]
    pub fn score(&self, mean: f64, std: f64, best: f64) -> f64 {
        match *self {
            Self::ExpectedImprovement { xi } => expected_improvement(mean, std, best, xi),
            Self::UpperConfidenceBound { kappa } => upper_confidence_bound(mean, std, kappa),
        }
    }

    /// Scores a batch of candidates.
    #[must_use]
    pub fn score_all(&self, mean: &[f64], std: &[f64], best: f64) -> Vec<f64> {
        mean.iter()
            .zip(std)
            .map(|(&m, &s)| self.score(m, s, best))
            .collect()
    }
}

/// Expected Improvement for maximization.
///
/// `EI = imp Φ(imp/σ) + σ φ(imp/σ)` with `imp = μ - best - ξ` and σ floored
/// at [`MIN_SIGMA`]; exactly 0 where σ ≤ [`MIN_SIGMA`].
#[must_use]
pub fn expected_improvement(mean: f64, std: f64, best: f64, xi: f64) -> f64 {
    if std <= MIN_SIGMA {
        return 0.0;
    }
    let improvement = mean - best - xi;
    let z = improvement / std;
    improvement * norm_cdf(z) + std * norm_pdf(z)
}

/// Upper Confidence Bound: `μ + κσ`.
#[must_use]
pub fn upper_confidence_bound(mean: f64, std: f64, kappa: f64) -> f64 {
    mean + kappa * std
}

// ---------------------------------------------------------------------------
// Normal distribution helpers
// ---------------------------------------------------------------------------

/// Standard normal PDF.
pub(crate) fn norm_pdf(x: f64) -> f64 {
    const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;
    INV_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Standard normal CDF (Hart / Abramowitz-Stegun 26.2.17 rational approximation).
pub(crate) fn norm_cdf(x: f64) -> f64 {
    if x < -8.0 {
        return 0.0;
    }
    if x > 8.0 {
        return 1.0;
    }

    let abs_x = x.abs();
    let t = 1.0 / (1.0 + 0.231_641_9 * abs_x);
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;
    let t5 = t4 * t;

    let poly = 0.319_381_530 * t - 0.356_563_782 * t2 + 1.781_477_937 * t3 - 1.821_255_978 * t4
        + 1.330_274_429 * t5;
    let cdf = 1.0 - norm_pdf(abs_x) * poly;

    if x >= 0.0 { cdf } else { 1.0 - cdf }
}
