use bbopt::sampler::{Diagnostics, Proposer, SpaceFillingSampler};
use bbopt::{Domain, ObservationSet};

fn clustered(n_dims: usize) -> ObservationSet {
    let x: Vec<Vec<f64>> = (0..6)
        .map(|i| vec![0.1 + 0.02 * i as f64; n_dims])
        .collect();
    let y: Vec<f64> = (0..6).map(|i| i as f64).collect();
    ObservationSet::new(x, y).unwrap()
}

#[test]
fn test_space_filling_moves_away_from_cluster() {
    let obs = clustered(3);
    let sampler = SpaceFillingSampler::builder()
        .num_random(1000)
        .num_lhs(1000)
        .build()
        .unwrap();
    let mut rng = fastrand::Rng::with_seed(20_260_128);

    let proposal = sampler
        .propose(&obs, &Domain::unit(), &mut rng)
        .expect("space-filling proposal should succeed");

    // The cluster sits near the origin; the farthest region is the opposite corner.
    for &v in &proposal.point {
        assert!(v > 0.7, "coordinate {v} should be far from the cluster");
        assert!(v < 1.0, "coordinate {v} must stay below the upper bound");
    }
}

#[test]
fn test_space_filling_beats_random_points_on_min_distance() {
    let obs = clustered(2);
    let sampler = SpaceFillingSampler::builder()
        .num_random(500)
        .num_lhs(500)
        .build()
        .unwrap();
    let mut rng = fastrand::Rng::with_seed(1);
    let proposal = sampler.propose(&obs, &Domain::unit(), &mut rng).unwrap();
    let chosen = obs.nearest_distance(&proposal.point);

    let mut probe = fastrand::Rng::with_seed(2);
    let random_mean = (0..200)
        .map(|_| obs.nearest_distance(&[probe.f64(), probe.f64()]))
        .sum::<f64>()
        / 200.0;
    assert!(
        chosen > random_mean,
        "max-min pick {chosen} should beat the average random point {random_mean}"
    );
}

#[test]
fn test_space_filling_is_reproducible() {
    let obs = clustered(4);
    let sampler = SpaceFillingSampler::builder()
        .num_random(300)
        .num_lhs(300)
        .build()
        .unwrap();
    let a = sampler
        .propose(&obs, &Domain::unit(), &mut fastrand::Rng::with_seed(77))
        .unwrap();
    let b = sampler
        .propose(&obs, &Domain::unit(), &mut fastrand::Rng::with_seed(77))
        .unwrap();
    assert_eq!(a, b);

    let c = sampler
        .propose(&obs, &Domain::unit(), &mut fastrand::Rng::with_seed(78))
        .unwrap();
    assert_ne!(a.point, c.point);
}

#[test]
fn test_space_filling_respects_narrow_domain() {
    let obs = clustered(2);
    let domain = Domain::new(0.001, 0.98).unwrap();
    let sampler = SpaceFillingSampler::builder()
        .num_random(200)
        .num_lhs(200)
        .build()
        .unwrap();
    let mut rng = fastrand::Rng::with_seed(5);
    let proposal = sampler.propose(&obs, &domain, &mut rng).unwrap();
    for &v in &proposal.point {
        assert!((0.001..0.98).contains(&v), "{v} outside [0.001, 0.98)");
    }
    let Diagnostics::SpaceFilling(d) = proposal.diagnostics else {
        panic!("expected space-filling diagnostics");
    };
    assert_eq!((d.num_random, d.num_lhs, d.pool_size), (200, 200, 400));
}

#[test]
fn test_space_filling_diagnostics_map() {
    let obs = clustered(2);
    let sampler = SpaceFillingSampler::builder()
        .num_random(50)
        .num_lhs(50)
        .build()
        .unwrap();
    let proposal = sampler
        .propose(&obs, &Domain::unit(), &mut fastrand::Rng::with_seed(3))
        .unwrap();
    let map = proposal.diagnostics.to_map();
    assert_eq!(map["policy"].as_text(), Some("space_filling"));
    assert_eq!(map["pool_size"].as_number(), Some(100.0));
    assert!(map["min_distance"].as_number().unwrap() > 0.0);
}
