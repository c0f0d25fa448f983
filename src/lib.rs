//! # sde-mlmc: Multilevel Monte Carlo for Stochastic Volatility and Rates
//!
//! Monte Carlo simulation of stochastic differential equations for option
//! pricing, centred on a three-factor model with stochastic variance and a
//! stochastic short rate:
//! ```text
//! dS = r S dt + √v S dW₁
//! dv = K_v (θ − v) dt + σ_v √v dW₂
//! dr = K_r (r̄ − r) dt + σ_r √r dW₃
//! ```
//!
//! ## Key Features
//!
//! - **Schemes**: Euler-Maruyama and Milstein with a shared zero floor
//! - **Correlated factors**: 3×3 transform of independent normals
//! - **Multilevel Monte Carlo**: coupled fine/coarse paths, uniform or
//!   variance-optimal sample allocation
//! - **Streaming statistics**: Welford accumulators, merged across rayon batches
//! - **Antithetic variates** for single-level and multilevel runs
//!
//! ## Quick Start
//!
//! ```rust
//! use sde_mlmc::mc::{price, McConfig, Payoff};
//! use sde_mlmc::models::{Heston, HestonParams};
//!
//! let model = Heston::new(HestonParams {
//!     s0: 100.0,
//!     v0: 0.04,
//!     r0: 0.04,
//!     kv: 2.0,
//!     theta: 0.04,
//!     sigma_v: 0.3,
//!     kr: 0.3,
//!     rbar: 0.04,
//!     sigma_r: 0.1,
//! })
//! .expect("valid parameters");
//!
//! let config = McConfig {
//!     samples: 2_000,
//!     steps: 50,
//!     payoff: Payoff::EuropeanPut { k: 100.0 },
//!     ..Default::default()
//! };
//!
//! let result = price(&model, &config, 0.0).expect("valid configuration");
//! println!("Put price: {:.4} ± {:.4}", result.mean, result.std_error());
//! ```

pub mod analytics;
pub mod config;
pub mod correlation;
pub mod error;
pub mod math_utils;
pub mod mc;
pub mod models;
pub mod output;
pub mod rng;
pub mod solvers;
pub mod stats;

// Re-export commonly used types for convenience
pub use correlation::{CorrelationMatrix, CorrelationMode, CorrelationTransform};
pub use error::{SdeError, SdeResult};
pub use mc::{MultilevelEstimator, PricingResult};
pub use rng::{RandomSource, RngFactory};
pub use solvers::Scheme;
pub use stats::OnlineAccumulator;
