// src/models/heston.rs
//! Heston Stochastic Volatility with Stochastic Interest Rate
//!
//! # Mathematical Framework
//!
//! Three correlated factors (Medvedev & Scaillet, 2010):
//! ```text
//! dS_t = r_t S_t dt + √v_t S_t dW_t^(1)
//! dv_t = K_v (θ - v_t) dt + σ_v √v_t dW_t^(2)
//! dr_t = K_r (r̄ - r_t) dt + σ_r √r_t dW_t^(3)
//! ```
//!
//! Where:
//! - S_t: Asset price
//! - v_t: Instantaneous variance
//! - r_t: Short rate (CIR dynamics)
//! - K_v, K_r: Mean reversion speeds
//! - θ, r̄: Long-run variance and rate
//! - σ_v, σ_r: Vol-of-vol and vol-of-rate
//!
//! Correlation between the three Brownian motions is applied by the caller
//! (see [`crate::correlation`]); this module only consumes increments.
//!
//! # Feller Condition
//!
//! For the square-root factors to stay strictly positive:
//! ```text
//! 2 K_v θ > σ_v²,   2 K_r r̄ > σ_r²
//! ```
//! When violated the discretization reaches zero more often; the full
//! truncation floor keeps √v and √r defined either way.
//!
//! # Discretization
//!
//! All three factors are updated from the *pre-update* state, then floored at
//! zero. The Milstein correction per factor is `½ b b' (ΔW² - Δt)` with
//! ```text
//! S:  b b' = v
//! v:  b b' = σ_v² / 2
//! r:  b b' = σ_r² / 2
//! ```
//! (zero on the boundary where the diffusion vanishes).

use super::model::FactorModel;
use super::state::PathState;
use crate::error::{validation::*, SdeResult};
use crate::solvers::{Coefficients, Scheme};
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HestonParams {
    pub s0: f64,      // Initial asset price
    pub v0: f64,      // Initial variance
    pub r0: f64,      // Initial short rate
    pub kv: f64,      // Variance mean reversion speed
    pub theta: f64,   // Long-run variance
    pub sigma_v: f64, // Vol-of-vol
    pub kr: f64,      // Rate mean reversion speed
    pub rbar: f64,    // Long-run rate
    pub sigma_r: f64, // Vol-of-rate
}

pub struct Heston {
    pub params: HestonParams,
}

impl Heston {
    pub fn new(params: HestonParams) -> SdeResult<Self> {
        Self::validate_params(&params)?;

        let feller_v = 2.0 * params.kv * params.theta;
        if params.sigma_v > 0.0 && feller_v <= params.sigma_v * params.sigma_v {
            warn!(
                kv = params.kv,
                theta = params.theta,
                sigma_v = params.sigma_v,
                "Feller condition violated for variance (2·Kv·θ ≤ σv²); variance may hit zero"
            );
        }
        let feller_r = 2.0 * params.kr * params.rbar;
        if params.sigma_r > 0.0 && feller_r <= params.sigma_r * params.sigma_r {
            warn!(
                kr = params.kr,
                rbar = params.rbar,
                sigma_r = params.sigma_r,
                "Feller condition violated for rate (2·Kr·r̄ ≤ σr²); rate may hit zero"
            );
        }

        Ok(Heston { params })
    }

    fn validate_params(params: &HestonParams) -> SdeResult<()> {
        validate_positive("S0", params.s0)?;
        validate_non_negative("v0", params.v0)?;
        validate_non_negative("r0", params.r0)?;
        validate_non_negative("Kv", params.kv)?;
        validate_non_negative("theta", params.theta)?;
        validate_non_negative("sigmav", params.sigma_v)?;
        validate_non_negative("Kr", params.kr)?;
        validate_non_negative("rbar", params.rbar)?;
        validate_non_negative("sigmar", params.sigma_r)?;
        Ok(())
    }

    #[inline]
    fn asset_coefficients(s: f64, v: f64, r: f64) -> Coefficients {
        let sqrt_v = v.sqrt();
        Coefficients {
            drift: r * s,
            diffusion: sqrt_v * s,
            diffusion_derivative: sqrt_v,
        }
    }

    /// Coefficients of a CIR factor `dx = k(m - x)dt + σ√x dW`
    #[inline]
    fn square_root_coefficients(x: f64, k: f64, mean: f64, sigma: f64) -> Coefficients {
        let sqrt_x = x.sqrt();
        Coefficients {
            drift: k * (mean - x),
            diffusion: sigma * sqrt_x,
            diffusion_derivative: if sqrt_x > 0.0 {
                sigma / (2.0 * sqrt_x)
            } else {
                0.0
            },
        }
    }
}

impl FactorModel for Heston {
    fn initial_state(&self) -> PathState {
        PathState::new(self.params.s0, self.params.v0, self.params.r0)
    }

    fn step(&self, state: &mut PathState, dt: f64, dw: [f64; 3], scheme: Scheme) {
        let p = &self.params;
        let PathState { s, v, r } = *state;

        let ds = scheme.increment(&Self::asset_coefficients(s, v, r), dt, dw[0]);
        let dv = scheme.increment(
            &Self::square_root_coefficients(v, p.kv, p.theta, p.sigma_v),
            dt,
            dw[1],
        );
        let dr = scheme.increment(
            &Self::square_root_coefficients(r, p.kr, p.rbar, p.sigma_r),
            dt,
            dw[2],
        );

        state.s = s + ds;
        state.v = v + dv;
        state.r = r + dr;
        state.clamp();
    }

    /// `exp(-r_T · T)` using the terminal short rate
    fn discount_factor(&self, terminal: &PathState, maturity: f64) -> f64 {
        (-terminal.r * maturity).exp()
    }
}
