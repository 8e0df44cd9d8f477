//! Proposer trait, proposal record, and the three proposal policies.
//!
//! | Proposer | Policy | Needs a model |
//! |----------|--------|---------------|
//! | [`SpaceFillingSampler`] | farthest point from observations over random + LHS candidates | no |
//! | [`LocalKernelSampler`] | kernel-weighted prediction + distance bonus | no |
//! | [`GpSampler`] | GP surrogate + EI/UCB + boundary guard | yes |

pub mod gp;
pub mod lhs;
pub mod local_kernel;
pub mod space_filling;

use std::collections::BTreeMap;

use crate::domain::Domain;
use crate::error::Result;
use crate::observation::ObservationSet;

pub use gp::{GpDiagnostics, GpSampler, GpSamplerBuilder};
pub use local_kernel::{LocalKernelDiagnostics, LocalKernelSampler, LocalKernelSamplerBuilder};
pub use space_filling::{SpaceFillingDiagnostics, SpaceFillingSampler, SpaceFillingSamplerBuilder};

/// Strategy that turns one function's observations into its next query point.
///
/// All randomness comes from the caller's `rng`, so a proposer holds no
/// mutable state and the same `(observations, domain, seed)` always yields
/// the same proposal.
pub trait Proposer: Send + Sync {
    /// Proposes one point inside `domain`.
    ///
    /// # Errors
    ///
    /// Returns an error only for conditions the proposer cannot recover from
    /// (for example a kernel matrix that cannot be factorized).
    fn propose(
        &self,
        observations: &ObservationSet,
        domain: &Domain,
        rng: &mut fastrand::Rng,
    ) -> Result<Proposal>;
}

/// The next point to evaluate plus how it was chosen.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Proposal {
    /// The proposed input vector; every coordinate lies in `[low, high)`.
    pub point: Vec<f64>,
    /// Policy-specific diagnostics.
    pub diagnostics: Diagnostics,
}

/// Diagnostics for each proposal policy.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "policy", rename_all = "snake_case"))]
pub enum Diagnostics {
    /// From [`SpaceFillingSampler`].
    SpaceFilling(SpaceFillingDiagnostics),
    /// From [`LocalKernelSampler`].
    LocalKernel(LocalKernelDiagnostics),
    /// From [`GpSampler`].
    Gp(GpDiagnostics),
}

/// A single named diagnostic value.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum DiagnosticValue {
    /// A scalar.
    Number(f64),
    /// A label such as the acquisition policy name.
    Text(String),
}

impl From<f64> for DiagnosticValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<usize> for DiagnosticValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(v: usize) -> Self {
        Self::Number(v as f64)
    }
}

impl From<bool> for DiagnosticValue {
    fn from(v: bool) -> Self {
        Self::Number(if v { 1.0 } else { 0.0 })
    }
}

impl From<&str> for DiagnosticValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl DiagnosticValue {
    /// The scalar, if this is a number.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    /// The label, if this is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Text(s) => Some(s),
        }
    }
}

impl Diagnostics {
    /// Flattens the record into named values for reporters.
    ///
    /// Every map carries a `"policy"` entry naming the proposer.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<&'static str, DiagnosticValue> {
        let mut map = BTreeMap::new();
        match self {
            Self::SpaceFilling(d) => {
                map.insert("policy", "space_filling".into());
                map.insert("min_distance", d.min_distance.into());
                map.insert("pool_size", d.pool_size.into());
                map.insert("num_random", d.num_random.into());
                map.insert("num_lhs", d.num_lhs.into());
            }
            Self::LocalKernel(d) => {
                map.insert("policy", "local_kernel".into());
                map.insert("predicted", d.predicted.into());
                map.insert("bonus", d.bonus.into());
                map.insert("bandwidth", d.bandwidth.into());
                map.insert("nearest_distance", d.nearest_distance.into());
                map.insert("pool_size", d.pool_size.into());
            }
            Self::Gp(d) => {
                map.insert("policy", "gp".into());
                map.insert("acquisition", d.acquisition.name().into());
                map.insert("best_y", d.best_y.into());
                map.insert("y_median", d.y_median.into());
                map.insert("y_std", d.y_std.into());
                map.insert("z_best", d.z_best.into());
                map.insert("best_constant", d.kernel.amplitude.into());
                map.insert("best_length_scale", d.kernel.length_scale.into());
                map.insert("best_noise_level", d.kernel.noise_level.into());
                map.insert("best_score", d.search_score.unwrap_or(f64::NAN).into());
                map.insert("log_marginal_likelihood", d.log_marginal_likelihood.into());
                map.insert("candidate_score", d.candidate_score.into());
                map.insert("candidate_ei", d.candidate_ei.into());
                map.insert("candidate_ucb", d.candidate_ucb.into());
                map.insert("candidate_min_dist", d.candidate_min_dist.into());
                map.insert("candidate_bound_dist", d.candidate_bound_dist.into());
                map.insert("attempts", d.attempts.into());
                map.insert("active_low", d.active_low.into());
                map.insert("active_high", d.active_high.into());
                map.insert("pool_size", d.pool_size.into());
                map.insert("duplicate_mask_dropped", d.duplicate_mask_dropped.into());
            }
        }
        map
    }

    /// The GP record, if this proposal came from [`GpSampler`].
    #[must_use]
    pub fn as_gp(&self) -> Option<&GpDiagnostics> {
        match self {
            Self::Gp(d) => Some(d),
            _ => None,
        }
    }
}
