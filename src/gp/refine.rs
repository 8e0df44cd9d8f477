//! Log-marginal-likelihood refinement of kernel hyperparameters.
//!
//! Nelder–Mead runs over `(ln amplitude, ln length_scale, ln noise_level)`,
//! one run per starting point. Every coordinate is clamped to the search
//! ranges before the kernel is built, so refined parameters never leave
//! them. The best refined model by log marginal likelihood wins.

use argmin::core::{CostFunction, Error as ArgminError, Executor};
use argmin::solver::neldermead::NelderMead;

use super::kernel::KernelParams;
use super::model::GaussianProcess;
use super::search::{AMPLITUDE_RANGE, LENGTH_SCALE_RANGE, NOISE_RANGE};

/// Iteration cap for one Nelder–Mead run.
const MAX_ITERS: u64 = 60;
/// A run stops once the spread of simplex costs drops below this.
const SD_TOLERANCE: f64 = 1e-6;
/// Edge of the initial simplex, in natural-log units.
const SIMPLEX_STEP: f64 = 0.5;

const RANGES: [(f64, f64); 3] = [AMPLITUDE_RANGE, LENGTH_SCALE_RANGE, NOISE_RANGE];

/// Negative log marginal likelihood on fixed training data.
struct NegLogLikelihood<'a> {
    x: &'a [Vec<f64>],
    y: &'a [f64],
}

impl CostFunction for NegLogLikelihood<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, ArgminError> {
        // Unfittable parameters rank last instead of aborting the run.
        let cost = GaussianProcess::fit(self.x, self.y, from_log(theta))
            .map(|gp| -gp.log_marginal_likelihood())
            .ok()
            .filter(|c| c.is_finite())
            .unwrap_or(f64::MAX);
        Ok(cost)
    }
}

fn to_log(params: KernelParams) -> Vec<f64> {
    vec![
        params.amplitude.ln(),
        params.length_scale.ln(),
        params.noise_level.ln(),
    ]
}

fn from_log(theta: &[f64]) -> KernelParams {
    let coord = |i: usize| {
        let (lo, hi) = RANGES[i];
        theta[i].clamp(lo.ln(), hi.ln()).exp().clamp(lo, hi)
    };
    KernelParams {
        amplitude: coord(0),
        length_scale: coord(1),
        noise_level: coord(2),
    }
}

/// Start vertex plus one vertex per coordinate, stepped inward at the upper bound.
fn initial_simplex(start: &[f64]) -> Vec<Vec<f64>> {
    let mut vertices = vec![start.to_vec()];
    for (i, &(_, hi)) in RANGES.iter().enumerate() {
        let mut vertex = start.to_vec();
        vertex[i] = if start[i] + SIMPLEX_STEP <= hi.ln() {
            start[i] + SIMPLEX_STEP
        } else {
            start[i] - SIMPLEX_STEP
        };
        vertices.push(vertex);
    }
    vertices
}

/// One Nelder–Mead run from `start`; returns `start` if the solver fails.
fn climb(x: &[Vec<f64>], y: &[f64], start: KernelParams) -> KernelParams {
    let problem = NegLogLikelihood { x, y };
    let best = NelderMead::new(initial_simplex(&to_log(start)))
        .with_sd_tolerance(SD_TOLERANCE)
        .and_then(|solver| {
            Executor::new(problem, solver)
                .configure(|state| state.max_iters(MAX_ITERS))
                .run()
        })
        .ok()
        .and_then(|res| res.state.best_param);
    best.map_or(start, |theta| from_log(&theta))
}

/// Refines every start and returns the model with the highest log marginal
/// likelihood, or `None` if no refined parameters can be fit.
///
/// Ties keep the earlier start.
pub(crate) fn refine(
    x: &[Vec<f64>],
    y: &[f64],
    starts: &[KernelParams],
) -> Option<GaussianProcess> {
    let mut best: Option<GaussianProcess> = None;
    for &start in starts {
        let Ok(model) = GaussianProcess::fit(x, y, climb(x, y, start)) else {
            continue;
        };
        trace_debug!(
            length_scale = model.params().length_scale,
            log_marginal_likelihood = model.log_marginal_likelihood(),
            "refined kernel start"
        );
        let better = best
            .as_ref()
            .is_none_or(|b| model.log_marginal_likelihood() > b.log_marginal_likelihood());
        if better {
            best = Some(model);
        }
    }
    best
}
