use super::state::PathState;
use crate::solvers::{Coefficients, Scheme};

/// Scalar SDE `dX = a(X, t) dt + b(X, t) dW`
pub trait SDEModel {
    fn drift(&self, s: f64, t: f64) -> f64;
    fn diffusion(&self, s: f64, t: f64) -> f64;
    fn diffusion_derivative(&self, s: f64, t: f64) -> f64;

    fn coefficients(&self, s: f64, t: f64) -> Coefficients {
        Coefficients {
            drift: self.drift(s, t),
            diffusion: self.diffusion(s, t),
            diffusion_derivative: self.diffusion_derivative(s, t),
        }
    }
}

/// Model advanced one step at a time by the path simulator.
///
/// Increments are always three-dimensional (asset, variance, rate); single
/// factor models read only the first component.
pub trait FactorModel: Sync {
    fn initial_state(&self) -> PathState;

    /// Advance `state` by one step of length `dt` using correlated increments
    /// `dw` (already scaled by `√dt`). Implementations apply the shared zero
    /// floor after the update.
    fn step(&self, state: &mut PathState, dt: f64, dw: [f64; 3], scheme: Scheme);

    /// Discount factor applied to a payoff observed at `maturity`
    fn discount_factor(&self, terminal: &PathState, maturity: f64) -> f64;

    /// Evolve a path over `steps` steps, drawing increments from `next_dw`.
    /// Only the terminal state is kept.
    fn simulate<F>(&self, steps: usize, dt: f64, scheme: Scheme, mut next_dw: F) -> PathState
    where
        F: FnMut() -> [f64; 3],
        Self: Sized,
    {
        let mut state = self.initial_state();
        for _ in 0..steps {
            self.step(&mut state, dt, next_dw(), scheme);
        }
        state
    }
}
