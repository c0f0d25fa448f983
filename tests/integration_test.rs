// tests/integration_test.rs
use sde_mlmc::analytics::bs_analytic;
use sde_mlmc::mc::{price, McConfig, Payoff};
use sde_mlmc::models::{Gbm, Heston, HestonParams};
use sde_mlmc::{CorrelationMatrix, CorrelationMode};

#[test]
fn test_gbm_terminal_mean_end_to_end() {
    // S0 = 100, r = 5%, σ = 3%, T = 1, 1000 steps, 100k samples, no discounting
    let gbm = Gbm::new(100.0, 0.05, 0.03);
    let cfg = McConfig {
        samples: 100_000,
        steps: 1000,
        maturity: 1.0,
        parallel: true,
        discounted: false,
        payoff: Payoff::Terminal,
        seed: 42,
        ..Default::default()
    };
    let expected = 100.0 * (0.05_f64).exp();
    let result = price(&gbm, &cfg, expected).expect("Valid configuration");

    println!("E[S_T] = {:.6} (expected {:.6})", result.mean, expected);
    assert!(
        (result.mean - 105.127).abs() < 0.5,
        "mean {} too far from 105.127",
        result.mean
    );
    assert_eq!(result.samples, 100_000);
    assert!(result.strong_error < 0.5);
    assert!(result.quality.is_empty());
}

#[test]
fn test_standard_error_shrinks_with_samples() {
    let gbm = Gbm::new(100.0, 0.05, 0.2);
    let run = |samples| {
        let cfg = McConfig {
            samples,
            steps: 20,
            discounted: false,
            payoff: Payoff::Terminal,
            parallel: true,
            ..Default::default()
        };
        price(&gbm, &cfg, 0.0).expect("Valid configuration")
    };
    let small = run(2_500);
    let large = run(40_000);
    // 16× the samples → about a quarter of the standard error
    let ratio = small.std_error() / large.std_error();
    assert!(ratio > 3.0 && ratio < 5.0, "ratio = {ratio}");
}

#[test]
fn test_heston_degenerate_matches_black_scholes() {
    // σv = σr = 0 with v and r at their long-run levels is Black-Scholes
    let heston = Heston::new(HestonParams {
        s0: 100.0,
        v0: 0.04,
        r0: 0.04,
        kv: 2.0,
        theta: 0.04,
        sigma_v: 0.0,
        kr: 0.3,
        rbar: 0.04,
        sigma_r: 0.0,
    })
    .expect("Valid parameters");

    let k = 100.0;
    let reference = bs_analytic::bs_put_price(100.0, k, 0.04, 0.2, 1.0);
    let cfg = McConfig {
        samples: 200_000,
        steps: 100,
        parallel: true,
        use_antithetic: true,
        payoff: Payoff::EuropeanPut { k },
        seed: 7,
        ..Default::default()
    };
    let result = price(&heston, &cfg, reference).expect("Valid configuration");

    println!(
        "MC put {:.4} vs BS {:.4}, strong error {:.2e} ({:?}%)",
        result.mean,
        reference,
        result.strong_error,
        result.strong_error_pct()
    );
    assert!(result.strong_error < 0.3);
    assert!(result.weak_error > result.strong_error);
}

#[test]
fn test_parallel_matches_serial() {
    let heston = Heston::new(HestonParams {
        s0: 100.0,
        v0: 0.04,
        r0: 0.04,
        kv: 2.0,
        theta: 0.04,
        sigma_v: 0.3,
        kr: 0.3,
        rbar: 0.04,
        sigma_r: 0.1,
    })
    .expect("Valid parameters");

    let correlation = CorrelationMatrix::from_pairs(-0.5, 0.0, 0.0)
        .and_then(|m| m.transform(CorrelationMode::Raw))
        .expect("Valid correlation");
    let serial = McConfig {
        samples: 10_000,
        steps: 50,
        batch_size: 1_000,
        correlation,
        ..Default::default()
    };
    let parallel = McConfig {
        parallel: true,
        ..serial.clone()
    };

    let a = price(&heston, &serial, 0.0).expect("Valid configuration");
    let b = price(&heston, &parallel, 0.0).expect("Valid configuration");

    assert_eq!(a.samples, b.samples);
    assert!((a.mean - b.mean).abs() < 1e-9 * a.mean.abs().max(1.0));
    assert!((a.variance - b.variance).abs() < 1e-7 * a.variance.max(1.0));
}

#[test]
fn test_cholesky_and_raw_differ_with_correlation() {
    let heston = Heston::new(HestonParams {
        s0: 100.0,
        v0: 0.04,
        r0: 0.04,
        kv: 2.0,
        theta: 0.04,
        sigma_v: 0.5,
        kr: 0.3,
        rbar: 0.04,
        sigma_r: 0.1,
    })
    .expect("Valid parameters");
    let matrix = CorrelationMatrix::from_pairs(-0.7, 0.0, 0.0).expect("Valid correlation");

    let run = |mode| {
        let cfg = McConfig {
            samples: 5_000,
            steps: 20,
            correlation: matrix.transform(mode).expect("Positive definite"),
            ..Default::default()
        };
        price(&heston, &cfg, 0.0).expect("Valid configuration").mean
    };

    // same seed, different transforms → different estimates
    assert_ne!(run(CorrelationMode::Raw).to_bits(), run(CorrelationMode::Cholesky).to_bits());
}
