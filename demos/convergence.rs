//! Euler-Maruyama vs. Milstein on GBM (S0 = 100, r = 5%, σ = 3%, T = 1)
//!
//! Run with `cargo run --release --example convergence [antithetic]`.

use anyhow::Result;
use sde_mlmc::mc::convergence::{run_study, ConvergenceConfig};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let antithetic = std::env::args().any(|a| a == "antithetic");
    let cfg = ConvergenceConfig {
        antithetic,
        meta_samples: 200,
        ..Default::default()
    };

    println!(
        "{:>6} {:>10} | {:>12} {:>10} {:>10} | {:>12} {:>10} {:>10}",
        "steps", "dt", "EM mean", "EM sd", "EM strong", "Mil mean", "Mil sd", "Mil strong"
    );
    for row in run_study(&cfg)? {
        println!(
            "{:>6} {:>10.3e} | {:>12.6} {:>10.3e} {:>10.3e} | {:>12.6} {:>10.3e} {:>10.3e}",
            row.steps,
            row.dt,
            row.euler.mean_of_means,
            row.euler.stdev_of_means,
            row.euler.strong_error,
            row.milstein.mean_of_means,
            row.milstein.stdev_of_means,
            row.milstein.strong_error,
        );
    }
    Ok(())
}
