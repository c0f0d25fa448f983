// src/analytics/bs_analytic.rs
//! Analytical Black-Scholes references for the single-factor model
//!
//! # Mathematical Foundation
//!
//! Under the Black-Scholes model, the underlying asset follows:
//! ```text
//! dS_t = r S_t dt + σ S_t dW_t
//! ```
//!
//! The risk-neutral pricing formula gives:
//! ```text
//! V(S,t) = e^(-r(T-t)) * E^Q[payoff(S_T) | S_t = S]
//! ```
//!
//! These closed forms serve as the `reference` value of GBM runs and as a
//! sanity bound for the three-factor model in its degenerate limit
//! (σv = σr = 0, v ≡ σ², r ≡ const).

use crate::math_utils::norm_cdf;
use crate::mc::payoffs::Payoff;

fn d1_d2(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> (f64, f64) {
    let d1 = ((s / k).ln() + (r + 0.5 * sigma * sigma) * t) / (sigma * t.sqrt());
    (d1, d1 - sigma * t.sqrt())
}

/// Black-Scholes European call option price
///
/// # Formula
/// ```text
/// C(S,K,r,σ,T) = S*Φ(d₁) - K*e^(-rT)*Φ(d₂)
/// d₁ = [ln(S/K) + (r + σ²/2)T] / (σ√T)
/// d₂ = d₁ - σ√T
/// ```
///
/// With σ = 0 the price collapses to the discounted intrinsic value of the
/// forward.
pub fn bs_call_price(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    let df = (-r * t).exp();
    if sigma <= 0.0 {
        return (s - k * df).max(0.0);
    }
    let (d1, d2) = d1_d2(s, k, r, sigma, t);
    s * norm_cdf(d1) - k * df * norm_cdf(d2)
}

/// Black-Scholes European put option price
///
/// ```text
/// P(S,K,r,σ,T) = K*e^(-rT)*Φ(-d₂) - S*Φ(-d₁)
/// ```
pub fn bs_put_price(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    let df = (-r * t).exp();
    if sigma <= 0.0 {
        return (k * df - s).max(0.0);
    }
    let (d1, d2) = d1_d2(s, k, r, sigma, t);
    k * df * norm_cdf(-d2) - s * norm_cdf(-d1)
}

/// Closed-form reference for a payoff under GBM
///
/// `discounted = false` gives the undiscounted expectation `E[payoff(S_T)]`.
pub fn gbm_reference(payoff: &Payoff, s: f64, r: f64, sigma: f64, t: f64, discounted: bool) -> f64 {
    let growth = (r * t).exp();
    let pv = match payoff {
        Payoff::EuropeanCall { k } => bs_call_price(s, *k, r, sigma, t),
        Payoff::EuropeanPut { k } => bs_put_price(s, *k, r, sigma, t),
        // E[S_T] = S e^{rT}, worth S today
        Payoff::Terminal => s,
    };
    if discounted {
        pv
    } else {
        pv * growth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_known_values() {
        // Hull's textbook case: S = K = 100, r = 5%, σ = 20%, T = 1
        assert_abs_diff_eq!(bs_call_price(100.0, 100.0, 0.05, 0.2, 1.0), 10.4506, epsilon = 1e-4);
        assert_abs_diff_eq!(bs_put_price(100.0, 100.0, 0.05, 0.2, 1.0), 5.5735, epsilon = 1e-4);
    }

    #[test]
    fn test_put_call_parity() {
        let (s, k, r, sigma, t) = (95.0, 105.0, 0.03, 0.25, 0.75);
        let lhs = bs_call_price(s, k, r, sigma, t) - bs_put_price(s, k, r, sigma, t);
        let rhs = s - k * (-r * t).exp();
        assert_abs_diff_eq!(lhs, rhs, epsilon = 1e-10);
    }

    #[test]
    fn test_zero_volatility_limit() {
        let put = bs_put_price(100.0, 110.0, 0.05, 0.0, 1.0);
        assert_abs_diff_eq!(put, 110.0 * (-0.05_f64).exp() - 100.0, epsilon = 1e-12);
        assert_eq!(bs_call_price(100.0, 110.0, 0.05, 0.0, 1.0), 0.0);
    }

    #[test]
    fn test_terminal_reference() {
        let undiscounted = gbm_reference(&Payoff::Terminal, 100.0, 0.05, 0.03, 1.0, false);
        assert_abs_diff_eq!(undiscounted, 105.12711, epsilon = 1e-5);
        assert_eq!(gbm_reference(&Payoff::Terminal, 100.0, 0.05, 0.03, 1.0, true), 100.0);
    }
}
