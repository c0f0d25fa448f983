// src/solvers/milstein.rs
//! Milstein Scheme for Higher-Order SDE Integration
//!
//! # Mathematical Framework
//!
//! For a scalar SDE:
//! ```text
//! dX_t = a(X_t, t) dt + b(X_t, t) dW_t
//! ```
//!
//! The Milstein scheme includes an additional correction term:
//! ```text
//! X_{n+1} = X_n + a Δt + b ΔW_n + ½ b b' [(ΔW_n)² - Δt]
//! ```
//!
//! For GBM (`b = σS`, `b' = σ`) the correction is `½ σ² S [(ΔW)² - Δt]`.
//!
//! # Convergence Properties
//!
//! - **Strong convergence**: Order 1.0 (vs 0.5 for Euler-Maruyama)
//! - **Weak convergence**: Order 1.0

use super::Coefficients;
use crate::models::model::SDEModel;

/// Milstein numerical scheme for SDE integration
pub struct Milstein;

impl Milstein {
    /// `a Δt + b ΔW + ½ b b' (ΔW² - Δt)`
    #[inline]
    pub fn increment(coeffs: &Coefficients, dt: f64, dw: f64) -> f64 {
        coeffs.drift * dt
            + coeffs.diffusion * dw
            + 0.5 * coeffs.diffusion * coeffs.diffusion_derivative * (dw * dw - dt)
    }

    /// Single Milstein step driven by a supplied increment
    pub fn step<M: SDEModel + ?Sized>(model: &M, s: &mut f64, t: f64, dt: f64, dw: f64) {
        *s += Self::increment(&model.coefficients(*s, t), dt, dw);
    }
}
