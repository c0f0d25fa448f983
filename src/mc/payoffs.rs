//! Option Payoff Functions
//!
//! # Mathematical Definitions
//!
//! - **Call**: max(S_T - K, 0)
//! - **Put**: max(K - S_T, 0)
//! - **Terminal**: S_T itself, for studies of E\[S_T\]
//!
//! Payoffs read only the terminal asset price; the simulator never keeps the
//! full path.

use serde::Serialize;

/// Enumeration of supported payoff types
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payoff {
    /// European call option: max(S_T - K, 0)
    EuropeanCall { k: f64 },

    /// European put option: max(K - S_T, 0)
    EuropeanPut { k: f64 },

    /// The terminal asset price
    Terminal,
}

impl Payoff {
    /// Payoff value at terminal asset price `s_t`
    #[inline]
    pub fn calculate(&self, s_t: f64) -> f64 {
        match self {
            Payoff::EuropeanCall { k } => (s_t - k).max(0.0),
            Payoff::EuropeanPut { k } => (k - s_t).max(0.0),
            Payoff::Terminal => s_t,
        }
    }

    pub fn strike(&self) -> Option<f64> {
        match self {
            Payoff::EuropeanCall { k } | Payoff::EuropeanPut { k } => Some(*k),
            Payoff::Terminal => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Payoff::EuropeanCall { .. } => "call",
            Payoff::EuropeanPut { .. } => "put",
            Payoff::Terminal => "terminal",
        }
    }
}
