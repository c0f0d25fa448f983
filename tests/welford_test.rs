// tests/welford_test.rs
use approx::assert_relative_eq;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use sde_mlmc::{OnlineAccumulator, SdeError};

fn two_pass(xs: &[f64]) -> (f64, f64) {
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, var)
}

proptest! {
    #[test]
    fn prop_matches_two_pass(xs in prop::collection::vec(-1e3f64..1e3, 2..500)) {
        let acc: OnlineAccumulator = xs.iter().copied().collect();
        let (mean, var) = two_pass(&xs);

        prop_assert_eq!(acc.count(), xs.len() as u64);
        prop_assert!((acc.mean() - mean).abs() <= 1e-9 * mean.abs().max(1.0));
        let got = acc.variance().unwrap();
        prop_assert!((got - var).abs() <= 1e-9 * var.abs().max(1.0));
    }

    #[test]
    fn prop_merge_equals_sequential(
        xs in prop::collection::vec(-50.0f64..50.0, 1..200),
        ys in prop::collection::vec(-50.0f64..50.0, 1..200),
    ) {
        let a: OnlineAccumulator = xs.iter().copied().collect();
        let b: OnlineAccumulator = ys.iter().copied().collect();
        let merged = a.merged(b);
        let sequential: OnlineAccumulator = xs.iter().chain(&ys).copied().collect();

        prop_assert_eq!(merged.count(), sequential.count());
        prop_assert!((merged.mean() - sequential.mean()).abs() < 1e-9);
        prop_assert!((merged.m2() - sequential.m2()).abs() <= 1e-9 * sequential.m2().max(1.0));
    }
}

#[test]
fn test_normal_sample_moments() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(2024);
    let normal = Normal::new(2.0, 3.0).unwrap();
    let mut acc = OnlineAccumulator::new();
    for _ in 0..1_000_000 {
        acc.update(normal.sample(&mut rng));
    }

    assert!((acc.mean() - 2.0).abs() < 0.01, "mean = {}", acc.mean());
    let var = acc.variance().unwrap();
    assert!((var - 9.0).abs() < 0.05, "variance = {var}");
}

#[test]
fn test_large_offset_is_stable() {
    // naive Σx² − n·mean² loses every digit here
    let acc: OnlineAccumulator = [1e9 + 4.0, 1e9 + 7.0, 1e9 + 13.0, 1e9 + 16.0]
        .into_iter()
        .collect();
    assert_relative_eq!(acc.mean(), 1e9 + 10.0, max_relative = 1e-12);
    assert_relative_eq!(acc.variance().unwrap(), 30.0, epsilon = 1e-4);
}

#[test]
fn test_variance_needs_two_observations() {
    let mut acc = OnlineAccumulator::new();
    assert!(matches!(
        acc.variance(),
        Err(SdeError::InsufficientObservations { count: 0 })
    ));
    acc.update(4.2);
    assert!(matches!(
        acc.variance(),
        Err(SdeError::InsufficientObservations { count: 1 })
    ));
    assert_eq!(acc.mean(), 4.2);
}
