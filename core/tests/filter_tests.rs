//! Integration tests for the SIR particle filter
//!
//! These tests drive the public API the way a tracking application does: build
//! a filter, run full resample/predict/weight/measure cycles with concrete
//! motion and likelihood models, and check the invariants that must hold after
//! each phase.
use std::collections::HashSet;

use assert_approx_eq::assert_approx_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;

use sirpf::models::{ConstantVelocity, RandomWalk, RegionLikelihood};
use sirpf::{FilterError, Normalization, Particle, ParticleFilter};

/// Square region `[x0, x0 + size] x [y0, y0 + size]` on a 2-D grid
fn in_square(state: &[i64], x0: i64, y0: i64, size: i64) -> bool {
    (x0..=x0 + size).contains(&state[0]) && (y0..=y0 + size).contains(&state[1])
}

#[test]
fn single_particle_estimate_is_its_state() {
    let mut pf = ParticleFilter::with_seed(1, 2, vec![10, 10], vec![0, 0], vec![0, 0], 3).unwrap();
    let state = pf.particles()[0].state.clone();
    assert_approx_eq!(pf.particles()[0].weight, 1.0, 1e-15);
    assert_eq!(pf.measure().state, state);

    pf.resample();
    pf.weight(&mut |i: usize, p: &[Particle]| {
        let mut next = p[i].clone();
        next.weight = 0.3;
        next
    })
    .unwrap();
    assert_approx_eq!(pf.particles()[0].weight, 1.0, 1e-15);
    assert_eq!(pf.measure().state, state);
}

#[test]
fn uniform_prior_mean_is_near_center() {
    let pf = ParticleFilter::with_seed(1000, 1, vec![100], vec![0], vec![0], 2024).unwrap();
    let mean = pf.particles().iter().map(|p| p.state[0] as f64).sum::<f64>() / 1000.0;
    assert!((mean - 49.5).abs() < 5.0, "sample mean {mean}");
}

#[test]
fn weighted_mean_end_to_end() {
    let mut pf = ParticleFilter::with_seed(4, 1, vec![10], vec![0], vec![0], 8).unwrap();
    for (p, (x, w)) in pf
        .particles_mut()
        .iter_mut()
        .zip([(1, 0.1), (2, 0.2), (3, 0.3), (4, 0.4)])
    {
        p.state[0] = x;
        p.weight = w;
    }
    let estimate = pf.measure();
    assert_eq!(estimate.state, vec![3]);
}

#[test]
fn invariants_hold_across_cycles() {
    let upper = vec![200, 150, 10, 10];
    let lower = vec![0, 0, -10, -10];
    let mut pf = ParticleFilter::with_seed(
        300,
        4,
        upper.clone(),
        lower.clone(),
        vec![30, 30, 10, 10],
        99,
    )
    .unwrap();

    for step in 0..25 {
        let before: HashSet<Vec<i64>> = pf.particles().iter().map(|p| p.state.clone()).collect();
        pf.resample();
        assert_eq!(pf.particles().len(), 300);
        for p in pf.particles() {
            assert_eq!(p.weight, 0.0);
            assert!(before.contains(&p.state), "resample invented {:?}", p.state);
        }

        pf.predict(&mut ConstantVelocity).unwrap();
        for p in pf.particles() {
            for j in 0..4 {
                assert!(lower[j] <= p.state[j] && p.state[j] < upper[j]);
            }
        }

        let (x0, y0) = (step * 4, step * 3);
        let mut likelihood = RegionLikelihood::new(|s: &[i64]| in_square(s, x0, y0, 20), 1.0, 1e-4);
        pf.weight(&mut likelihood).unwrap();
        let sum: f64 = pf.weights().iter().sum();
        assert_approx_eq!(sum, 1.0, 1e-9);
        assert!(pf.weights().iter().all(|w| *w >= 0.0));

        let estimate = pf.measure();
        assert_eq!(estimate.state.len(), 4);
    }
}

#[test]
fn tracks_stationary_region() {
    let mut pf =
        ParticleFilter::with_seed(1000, 2, vec![100, 100], vec![0, 0], vec![2, 2], 7).unwrap();
    let mut likelihood = RegionLikelihood::new(|s: &[i64]| in_square(s, 60, 20, 20), 1.0, 1e-4);
    let mut estimate = Particle::new(2);
    for _ in 0..20 {
        let (e, normalization) = pf.step(&mut RandomWalk, &mut likelihood).unwrap();
        assert!(!normalization.is_degenerate());
        estimate = e;
    }
    assert!((55..=85).contains(&estimate.state[0]), "x {}", estimate.state[0]);
    assert!((15..=45).contains(&estimate.state[1]), "y {}", estimate.state[1]);
}

#[test]
fn lost_target_recovers_uniform_weights() {
    let mut pf = ParticleFilter::with_seed(50, 1, vec![10], vec![0], vec![1], 5).unwrap();
    pf.resample();
    pf.predict(&mut RandomWalk).unwrap();
    let normalization = pf
        .weight(&mut RegionLikelihood::new(|s: &[i64]| s[0] > 100, 1.0, 0.0))
        .unwrap();
    assert_eq!(normalization, Normalization::UniformReset);
    assert!(pf.weights().iter().all(|w| (w - 0.02).abs() < 1e-15));

    // The next cycle still works from the recovered distribution.
    pf.resample();
    assert_eq!(pf.particles().len(), 50);
    assert!(pf.measure().state[0] == 0);
}

#[test]
fn injected_rng_reproduces_run() {
    let run = |seed: u64| {
        let mut pf = ParticleFilter::with_rng(
            200,
            2,
            vec![50, 50],
            vec![0, 0],
            vec![3, 3],
            StdRng::seed_from_u64(seed),
        )
        .unwrap();
        let mut likelihood = RegionLikelihood::new(|s: &[i64]| in_square(s, 10, 10, 10), 1.0, 1e-3);
        let mut out = Vec::new();
        for _ in 0..5 {
            out.push(pf.step(&mut RandomWalk, &mut likelihood).unwrap().0);
        }
        out
    };
    assert_eq!(run(17), run(17));
}

#[test]
fn model_errors_are_reported() {
    let mut pf = ParticleFilter::with_seed(10, 2, vec![5, 5], vec![0, 0], vec![0, 0], 1).unwrap();
    let err = pf
        .weight(&mut |_i: usize, _p: &[Particle]| Particle::new(1))
        .unwrap_err();
    assert!(matches!(
        err,
        FilterError::DimensionMismatch {
            index: 0,
            expected: 2,
            actual: 1
        }
    ));
    assert!(pf.particles().iter().all(|p| p.state.len() == 2));
}

#[test]
fn invalid_configuration_fails_fast() {
    for (number, dimension, upper, lower, noise) in [
        (0, 1, vec![5], vec![0], vec![0]),
        (5, 0, vec![], vec![], vec![]),
        (5, 1, vec![5], vec![5], vec![0]),
        (5, 1, vec![5], vec![6], vec![0]),
        (5, 1, vec![5], vec![0], vec![-2]),
        (5, 2, vec![5, 5], vec![0], vec![0, 0]),
    ] {
        let result = ParticleFilter::with_seed(number, dimension, upper, lower, noise, 0);
        assert!(matches!(
            result,
            Err(FilterError::InvalidConfiguration { .. })
        ));
    }
}
