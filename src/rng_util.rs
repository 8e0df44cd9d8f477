/// Generate a random `f64` in the range `[low, high)`.
#[inline]
pub(crate) fn f64_range(rng: &mut fastrand::Rng, low: f64, high: f64) -> f64 {
    low + rng.f64() * (high - low)
}

/// Sample a standard normal variate using the Box-Muller transform.
pub(crate) fn standard_normal(rng: &mut fastrand::Rng) -> f64 {
    // 1 - u keeps the log argument in (0, 1].
    let u1 = 1.0 - rng.f64();
    let u2 = rng.f64();
    (-2.0 * u1.ln()).sqrt() * (core::f64::consts::TAU * u2).cos()
}

/// Sample from a log-uniform distribution over `[low, high)`.
pub(crate) fn log_uniform(rng: &mut fastrand::Rng, low: f64, high: f64) -> f64 {
    f64_range(rng, low.ln(), high.ln()).exp()
}

/// Random permutation of `0..n` (Fisher-Yates).
pub(crate) fn permutation(rng: &mut fastrand::Rng, n: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    for i in (1..n).rev() {
        let j = rng.usize(0..=i);
        indices.swap(i, j);
    }
    indices
}

/// Derive an independent seed for stream `index` from a master seed.
#[must_use]
pub fn split_seed(seed: u64, index: usize) -> u64 {
    seed.wrapping_add((index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permutation_contains_every_index_once() {
        let mut rng = fastrand::Rng::with_seed(7);
        let mut perm = permutation(&mut rng, 50);
        perm.sort_unstable();
        assert_eq!(perm, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn log_uniform_stays_in_range() {
        let mut rng = fastrand::Rng::with_seed(3);
        for _ in 0..1000 {
            let v = log_uniform(&mut rng, 1e-9, 1.0);
            assert!((1e-9..=1.0).contains(&v), "{v} out of range");
        }
    }

    #[test]
    fn standard_normal_has_unit_moments() {
        let mut rng = fastrand::Rng::with_seed(11);
        let n = 20_000;
        let samples: Vec<f64> = (0..n).map(|_| standard_normal(&mut rng)).collect();
        let mean = samples.iter().sum::<f64>() / f64::from(n);
        let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / f64::from(n);
        assert!(mean.abs() < 0.05, "mean {mean}");
        assert!((var - 1.0).abs() < 0.05, "variance {var}");
    }

    #[test]
    fn split_seeds_differ_per_index() {
        assert_ne!(split_seed(42, 0), split_seed(42, 1));
        assert_ne!(split_seed(42, 0), 42);
        assert_eq!(split_seed(42, 3), split_seed(42, 3));
    }
}
