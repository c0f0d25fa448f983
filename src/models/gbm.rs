use super::model::{FactorModel, SDEModel};
use super::state::PathState;
use crate::error::{validation::*, SdeResult};
use crate::solvers::Scheme;

/// Geometric Brownian motion `dS = μ S dt + σ S dW` with constant rate μ
#[derive(Clone, Copy, Debug)]
pub struct Gbm {
    pub s0: f64,
    pub mu: f64,
    pub sigma: f64,
}

impl Gbm {
    pub fn new(s0: f64, mu: f64, sigma: f64) -> Self {
        Gbm { s0, mu, sigma }
    }

    pub fn validated(s0: f64, mu: f64, sigma: f64) -> SdeResult<Self> {
        validate_positive("S0", s0)?;
        validate_finite("r", mu)?;
        validate_non_negative("sigma", sigma)?;
        Ok(Self::new(s0, mu, sigma))
    }

    /// `E[S_T] = S0 e^{μT}`
    pub fn expected_terminal(&self, t: f64) -> f64 {
        self.s0 * (self.mu * t).exp()
    }

    pub fn exact_step(&self, s_t: f64, dt: f64, normal_draw: f64) -> f64 {
        s_t * ((self.mu - 0.5 * self.sigma * self.sigma) * dt
            + self.sigma * dt.sqrt() * normal_draw)
            .exp()
    }
}

impl SDEModel for Gbm {
    fn drift(&self, s: f64, _t: f64) -> f64 {
        self.mu * s
    }

    fn diffusion(&self, s: f64, _t: f64) -> f64 {
        self.sigma * s
    }

    fn diffusion_derivative(&self, _s: f64, _t: f64) -> f64 {
        self.sigma
    }
}

impl FactorModel for Gbm {
    fn initial_state(&self) -> PathState {
        PathState::new(self.s0, self.sigma * self.sigma, self.mu)
    }

    fn step(&self, state: &mut PathState, dt: f64, dw: [f64; 3], scheme: Scheme) {
        state.s += scheme.increment(&self.coefficients(state.s, 0.0), dt, dw[0]);
        state.clamp();
    }

    fn discount_factor(&self, _terminal: &PathState, maturity: f64) -> f64 {
        (-self.mu * maturity).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_vol_is_deterministic() {
        let gbm = Gbm::new(100.0, 0.05, 0.0);
        let steps = 1000;
        let dt = 1.0 / steps as f64;

        let mut k = 0.0_f64;
        let terminal = gbm.simulate(steps, dt, Scheme::EulerMaruyama, || {
            // arbitrary increments have no effect when σ = 0
            k += 1.0;
            [k.sin(), k.cos(), 0.0]
        });

        let euler_exact = 100.0 * (1.0 + 0.05 * dt).powi(steps as i32);
        assert_relative_eq!(terminal.s, euler_exact, max_relative = 1e-12);
        assert!((terminal.s - gbm.expected_terminal(1.0)).abs() < 0.02);
    }

    #[test]
    fn test_validation() {
        assert!(Gbm::validated(100.0, 0.05, 0.2).is_ok());
        assert!(Gbm::validated(-1.0, 0.05, 0.2).is_err());
        assert!(Gbm::validated(100.0, 0.05, -0.2).is_err());
    }
}
