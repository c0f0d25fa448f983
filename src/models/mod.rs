//! Stochastic models advanced by the path simulator

pub mod gbm;
pub mod heston;
pub mod model;
pub mod state;

pub use gbm::Gbm;
pub use heston::{Heston, HestonParams};
pub use model::{FactorModel, SDEModel};
pub use state::PathState;
