// tests/solver_convergence_test.rs
use sde_mlmc::mc::convergence::{run_study, ConvergenceConfig};
use sde_mlmc::models::{FactorModel, Gbm, Heston, HestonParams};
use sde_mlmc::rng::{RandomSource, RngFactory};
use sde_mlmc::{CorrelationMatrix, CorrelationMode, CorrelationTransform, Scheme};

#[test]
fn test_zero_volatility_is_seed_independent() {
    let gbm = Gbm::new(100.0, 0.05, 0.0);
    let steps = 1000;
    let dt = 1.0 / steps as f64;

    let terminal_for_seed = |seed| {
        let mut source = RngFactory::new(seed).stream(0);
        gbm.simulate(steps, dt, Scheme::EulerMaruyama, || {
            let z = source.draw3();
            [z[0] * dt.sqrt(), z[1] * dt.sqrt(), z[2] * dt.sqrt()]
        })
        .s
    };

    let a = terminal_for_seed(1);
    let b = terminal_for_seed(99);
    assert_eq!(a, b);
    // Euler truncation: 100(1 + r dt)^n vs 100 e^{rT}
    assert!((a - 100.0 * (0.05_f64).exp()).abs() < 0.01);
}

#[test]
fn test_variance_and_rate_never_negative() {
    let heston = Heston::new(HestonParams {
        s0: 100.0,
        v0: 0.02,
        r0: 0.01,
        kv: 0.5,
        theta: 0.02,
        sigma_v: 1.0,
        kr: 0.2,
        rbar: 0.01,
        sigma_r: 0.5,
    })
    .expect("Valid parameters");
    let transform = CorrelationMatrix::from_pairs(-0.7, 0.2, 0.1)
        .and_then(|m| m.transform(CorrelationMode::Raw))
        .expect("Valid correlation");

    let steps = 100;
    let dt = 1.0 / steps as f64;
    let factory = RngFactory::new(3);

    for scheme in [Scheme::EulerMaruyama, Scheme::Milstein] {
        for path in 0..500 {
            let mut source = factory.stream(path);
            let mut state = heston.initial_state();
            for _ in 0..steps {
                let z = transform.apply(source.draw3());
                let dw = [z[0] * dt.sqrt(), z[1] * dt.sqrt(), z[2] * dt.sqrt()];
                heston.step(&mut state, dt, dw, scheme);
                assert!(state.v >= 0.0 && state.r >= 0.0, "negative factor: {state:?}");
            }
        }
    }
}

#[test]
fn test_identity_transform_passes_input_through() {
    let identity = CorrelationTransform::identity();
    for z in [[0.3, -1.2, 2.5], [0.0, 0.0, 0.0], [-7.0, 1e-12, 1e12]] {
        assert_eq!(identity.apply(z), z);
    }
    let from_pairs = CorrelationMatrix::from_pairs(0.0, 0.0, 0.0)
        .and_then(|m| m.transform(CorrelationMode::Raw))
        .expect("Valid correlation");
    assert_eq!(from_pairs.apply([1.0, 2.0, 3.0]), [1.0, 2.0, 3.0]);
}

#[test]
fn test_strong_order_of_schemes() {
    let cfg = ConvergenceConfig {
        model: Gbm::new(100.0, 0.05, 0.5),
        step_counts: vec![8, 32, 128],
        samples: 1_000,
        meta_samples: 8,
        parallel: true,
        ..Default::default()
    };
    let rows = run_study(&cfg).expect("Valid study");

    // 16× finer grid: Euler strong error shrinks ~4× (order ½), Milstein ~16× (order 1)
    let euler_ratio = rows[0].euler.strong_error / rows[2].euler.strong_error;
    let milstein_ratio = rows[0].milstein.strong_error / rows[2].milstein.strong_error;
    println!("Euler ratio {euler_ratio:.2}, Milstein ratio {milstein_ratio:.2}");
    assert!(euler_ratio > 2.5 && euler_ratio < 6.5);
    assert!(milstein_ratio > 8.0 && milstein_ratio > euler_ratio);
}
