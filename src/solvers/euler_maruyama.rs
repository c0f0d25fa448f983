// src/solvers/euler_maruyama.rs
//! Euler-Maruyama Scheme for SDE Integration
//!
//! # Mathematical Framework
//!
//! For a general SDE:
//! ```text
//! dX_t = a(X_t, t) dt + b(X_t, t) dW_t
//! ```
//!
//! The Euler-Maruyama scheme provides the discretization:
//! ```text
//! X_{n+1} = X_n + a(X_n, t_n) Δt + b(X_n, t_n) ΔW_n
//! ```
//!
//! # Convergence Properties
//!
//! - **Strong convergence**: Order 0.5 in step size
//! - **Weak convergence**: Order 1.0 in step size

use super::Coefficients;
use crate::models::model::SDEModel;

/// Euler-Maruyama numerical scheme for SDE integration
pub struct EulerMaruyama;

impl EulerMaruyama {
    /// `a Δt + b ΔW`
    #[inline]
    pub fn increment(coeffs: &Coefficients, dt: f64, dw: f64) -> f64 {
        coeffs.drift * dt + coeffs.diffusion * dw
    }

    /// Single Euler-Maruyama step driven by a supplied increment
    ///
    /// # Parameters
    /// - `model`: SDE model providing drift and diffusion functions
    /// - `s`: Current state (modified in-place)
    /// - `t`: Current time
    /// - `dt`: Time step size
    /// - `dw`: Brownian increment, `√Δt · Z`
    pub fn step<M: SDEModel + ?Sized>(model: &M, s: &mut f64, t: f64, dt: f64, dw: f64) {
        *s += Self::increment(&model.coefficients(*s, t), dt, dw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::gbm::Gbm;
    use approx::assert_relative_eq;

    #[test]
    fn test_gbm_step() {
        let gbm = Gbm::new(100.0, 0.05, 0.2);
        let mut s = 100.0;
        EulerMaruyama::step(&gbm, &mut s, 0.0, 0.01, 0.1);

        // 100 + 0.05*100*0.01 + 0.2*100*0.1
        assert_relative_eq!(s, 102.05, epsilon = 1e-12);
    }
}
