//! Latin hypercube sampling on the unit cube.

use crate::rng_util;

/// Draws `n` points in `[0, 1)^d` with exactly one point per bin of width
/// `1/n` in every dimension.
///
/// Each dimension is stratified independently: one uniform draw inside each
/// bin, then the bins are shuffled so dimensions are uncorrelated.
///
/// # Examples
///
/// ```
/// use bbopt::sampler::lhs::latin_hypercube;
///
/// let mut rng = fastrand::Rng::with_seed(1);
/// let points = latin_hypercube(10, 3, &mut rng);
/// assert_eq!(points.len(), 10);
/// assert!(points.iter().all(|p| p.len() == 3));
/// ```
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn latin_hypercube(n: usize, d: usize, rng: &mut fastrand::Rng) -> Vec<Vec<f64>> {
    let mut samples = vec![vec![0.0; d]; n];
    let n_f = n as f64;
    for j in 0..d {
        let strata: Vec<f64> = (0..n)
            .map(|k| {
                let lo = k as f64 / n_f;
                let hi = (k + 1) as f64 / n_f;
                let v = lo + rng.f64() * (hi - lo);
                // Rounding may land on the upper edge; keep the bin half-open.
                if v < hi { v } else { lo }
            })
            .collect();
        let order = rng_util::permutation(rng, n);
        for (row, &k) in order.iter().enumerate() {
            samples[row][j] = strata[k];
        }
    }
    samples
}
