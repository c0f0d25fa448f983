//! Monte Carlo pricing engines

pub mod convergence;
pub mod mc_engine;
pub mod mlmc;
pub mod payoffs;
pub mod result;

pub use mc_engine::{price, McConfig};
pub use mlmc::{Allocation, MultilevelEstimator};
pub use payoffs::Payoff;
pub use result::{LevelResult, MultilevelResult, PricingResult, QualityFlags};
