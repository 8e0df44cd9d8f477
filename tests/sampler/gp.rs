use bbopt::candidates::PoolConfig;
use bbopt::gp::SearchConfig;
use bbopt::sampler::{Diagnostics, GpSampler, Proposer, SpaceFillingSampler};
use bbopt::selection::DUPLICATE_TOLERANCE;
use bbopt::{Domain, Error, ObservationSet};

fn small_pool() -> PoolConfig {
    PoolConfig {
        n_global: 600,
        n_local: 150,
        local_sigma: 0.08,
    }
}

fn branin_like(n: usize, seed: u64) -> ObservationSet {
    let mut probe = fastrand::Rng::with_seed(seed);
    let x: Vec<Vec<f64>> = (0..n).map(|_| vec![probe.f64(), probe.f64()]).collect();
    let y: Vec<f64> = x
        .iter()
        .map(|p| (3.0 * p[0]).sin() * (2.0 * p[1]).cos() + 0.5 * p[0])
        .collect();
    ObservationSet::new(x, y).unwrap()
}

#[test]
fn test_gp_switches_to_ei_for_outlying_best() {
    let mut x = Vec::new();
    let mut y = Vec::new();
    for i in 0..9 {
        x.push(vec![0.1 * i as f64 + 0.05, 0.5]);
        y.push(if i == 4 { 10.0 } else { 0.0 });
    }
    let obs = ObservationSet::new(x, y).unwrap();
    let sampler = GpSampler::builder().pool(small_pool()).build().unwrap();

    let proposal = sampler
        .propose(&obs, &Domain::unit(), &mut fastrand::Rng::with_seed(4))
        .expect("gp proposal should succeed");
    let d = proposal.diagnostics.as_gp().unwrap();

    assert_eq!(d.acquisition.name(), "ei");
    assert!(d.z_best >= 2.5, "z_best {} should reach the threshold", d.z_best);
    assert_eq!(proposal.diagnostics.to_map()["acquisition"].as_text(), Some("ei"));
}

#[test]
fn test_gp_uses_ucb_for_spread_outputs() {
    let obs = branin_like(10, 1);
    let sampler = GpSampler::builder().pool(small_pool()).build().unwrap();
    let proposal = sampler
        .propose(&obs, &Domain::unit(), &mut fastrand::Rng::with_seed(2))
        .unwrap();
    let d = proposal.diagnostics.as_gp().unwrap();
    assert!(d.z_best < 2.5);
    assert_eq!(d.acquisition.name(), "ucb");
}

#[test]
fn test_gp_threshold_is_configurable() {
    let obs = branin_like(10, 1);
    let sampler = GpSampler::builder()
        .z_best_threshold(-100.0)
        .pool(small_pool())
        .build()
        .unwrap();
    let proposal = sampler
        .propose(&obs, &Domain::unit(), &mut fastrand::Rng::with_seed(2))
        .unwrap();
    assert_eq!(proposal.diagnostics.as_gp().unwrap().acquisition.name(), "ei");
}

#[test]
fn test_gp_retries_on_tightened_domain_when_scores_favour_bounds() {
    // All outputs far below zero: every UCB score is negative, so the
    // boundary weight makes edge candidates win and forces the retry.
    let x = vec![
        vec![0.2, 0.3],
        vec![0.5, 0.5],
        vec![0.7, 0.2],
        vec![0.3, 0.8],
        vec![0.6, 0.7],
        vec![0.45, 0.15],
    ];
    let y = vec![-1000.0, -999.0, -1001.0, -1000.5, -999.5, -1000.2];
    let obs = ObservationSet::new(x, y).unwrap();
    let domain = Domain::new(0.001, 0.98).unwrap();
    let sampler = GpSampler::builder()
        .boundary_margin(0.05)
        .pool(small_pool())
        .build()
        .unwrap();

    let proposal = sampler
        .propose(&obs, &domain, &mut fastrand::Rng::with_seed(20_260_204))
        .unwrap();
    let d = proposal.diagnostics.as_gp().unwrap();

    assert_eq!(d.acquisition.name(), "ucb");
    assert_eq!(d.attempts, 2);
    assert!((d.active_low - 0.051).abs() < 1e-12);
    assert!((d.active_high - 0.93).abs() < 1e-12);
    for &v in &proposal.point {
        assert!(
            (0.051 - 1e-12..=0.93).contains(&v),
            "{v} should lie in the tightened domain"
        );
    }
}

#[test]
fn test_gp_never_proposes_a_duplicate() {
    let obs = branin_like(12, 9);
    let sampler = GpSampler::builder().pool(small_pool()).build().unwrap();
    let proposal = sampler
        .propose(&obs, &Domain::unit(), &mut fastrand::Rng::with_seed(12))
        .unwrap();
    let d = proposal.diagnostics.as_gp().unwrap();
    assert!(!d.duplicate_mask_dropped);
    assert!(obs.nearest_distance(&proposal.point) > DUPLICATE_TOLERANCE);
}

#[test]
fn test_gp_reports_search_and_kernel() {
    let obs = branin_like(12, 3);
    let sampler = GpSampler::builder()
        .pool(small_pool())
        .search(SearchConfig {
            n_trials: 5,
            n_folds: 3,
            n_restarts: 1,
        })
        .build()
        .unwrap();
    let proposal = sampler
        .propose(&obs, &Domain::unit(), &mut fastrand::Rng::with_seed(8))
        .unwrap();
    let d = proposal.diagnostics.as_gp().unwrap();
    assert!((1e-3..=1e3).contains(&d.kernel.amplitude));
    assert!((1e-4..=10.0).contains(&d.kernel.length_scale));
    assert!((1e-9..=1.0).contains(&d.kernel.noise_level));
    assert!(d.search_score.is_some_and(f64::is_finite));
    assert!(d.log_marginal_likelihood.is_finite());

    let map = proposal.diagnostics.to_map();
    for key in [
        "best_y",
        "y_median",
        "y_std",
        "z_best",
        "acquisition",
        "candidate_ei",
        "candidate_ucb",
        "candidate_min_dist",
        "candidate_bound_dist",
        "best_score",
        "best_constant",
        "best_length_scale",
        "best_noise_level",
    ] {
        assert!(map.contains_key(key), "missing diagnostic {key}");
    }
}

#[test]
fn test_gp_constant_outputs_floor_std() {
    let obs = ObservationSet::new(
        vec![vec![0.2], vec![0.5], vec![0.8], vec![0.35]],
        vec![3.0, 3.0, 3.0, 3.0],
    )
    .unwrap();
    let sampler = GpSampler::builder().pool(small_pool()).build().unwrap();
    let proposal = sampler
        .propose(&obs, &Domain::unit(), &mut fastrand::Rng::with_seed(1))
        .unwrap();
    let d = proposal.diagnostics.as_gp().unwrap();
    assert_eq!(d.y_std, 1.0);
    assert_eq!(d.z_best, 0.0);
    assert_eq!(d.acquisition.name(), "ucb");
}

#[test]
fn test_gp_startup_delegation() {
    let sampler = GpSampler::builder()
        .n_startup_observations(4)
        .startup(
            SpaceFillingSampler::builder()
                .num_random(100)
                .num_lhs(100)
                .build()
                .unwrap(),
        )
        .pool(small_pool())
        .build()
        .unwrap();
    let few = branin_like(3, 5);
    let enough = branin_like(4, 5);

    let early = sampler
        .propose(&few, &Domain::unit(), &mut fastrand::Rng::with_seed(0))
        .unwrap();
    let late = sampler
        .propose(&enough, &Domain::unit(), &mut fastrand::Rng::with_seed(0))
        .unwrap();
    assert!(matches!(early.diagnostics, Diagnostics::SpaceFilling(_)));
    assert!(matches!(late.diagnostics, Diagnostics::Gp(_)));
}

#[test]
fn test_gp_builder_errors_are_descriptive() {
    let err = GpSampler::builder()
        .boundary_margin(-1.0)
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, Error::InvalidMargin(_)));
    assert!(err.to_string().contains("boundary margin"));
}
