//! Discretization schemes
//!
//! Schemes consume a Brownian increment supplied by the caller rather than
//! drawing their own. Coupled fine/coarse paths in the multilevel estimator
//! depend on this: the coarse increment is assembled from fine draws.

pub mod euler_maruyama;
pub mod milstein;

use serde::{Deserialize, Serialize};

pub use euler_maruyama::EulerMaruyama;
pub use milstein::Milstein;

/// Local SDE coefficients `a(x)`, `b(x)` and `∂b/∂x` at the pre-update state
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coefficients {
    pub drift: f64,
    pub diffusion: f64,
    pub diffusion_derivative: f64,
}

/// Discretization scheme selector
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    EulerMaruyama,
    Milstein,
}

impl Scheme {
    /// State increment `ΔX` for one step
    #[inline]
    pub fn increment(self, coeffs: &Coefficients, dt: f64, dw: f64) -> f64 {
        match self {
            Scheme::EulerMaruyama => EulerMaruyama::increment(coeffs, dt, dw),
            Scheme::Milstein => Milstein::increment(coeffs, dt, dw),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Scheme::EulerMaruyama => "Euler-Maruyama",
            Scheme::Milstein => "Milstein",
        }
    }
}

/// Boundary policy shared by every state update: full truncation at zero
#[inline]
pub fn floor_at_zero(x: f64) -> f64 {
    if x < 0.0 {
        0.0
    } else {
        x
    }
}
