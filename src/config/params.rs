use crate::correlation::CorrelationMatrix;
use crate::error::{validation::*, SdeError, SdeResult};
use crate::models::HestonParams;
use serde::Serialize;
use tracing::debug;

/// One simulation configuration
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimulationParameters {
    pub s0: f64,
    pub k: f64,
    pub t: f64,
    pub kv: f64,
    pub kr: f64,
    pub sigma_v: f64,
    pub sigma_r: f64,
    pub v0: f64,
    pub r0: f64,
    pub theta: f64,
    pub rbar: f64,
    pub rho12: f64,
    pub rho13: f64,
    pub rho23: f64,
    /// Closed-form reference price; 0 disables error reporting
    pub closed_form: f64,
    pub steps: usize,
    pub samples: usize,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        SimulationParameters {
            s0: 100.0,
            k: 100.0,
            t: 1.0,
            kv: 2.0,
            kr: 0.3,
            sigma_v: 0.1,
            sigma_r: 0.1,
            v0: 0.02,
            r0: 0.04,
            theta: 0.02,
            rbar: 0.04,
            rho12: 0.0,
            rho13: 0.0,
            rho23: 0.0,
            closed_form: 0.0,
            steps: 500,
            samples: 10_000,
        }
    }
}

/// Keys accepted by [`SimulationParameters::apply_override`]
pub const OVERRIDE_KEYS: &[&str] = &[
    "S0", "K", "T", "Kv", "Kr", "sigmav", "sigmar", "v0", "r0", "theta", "vbar", "rbar", "rho12",
    "rho13", "rho23", "steps", "sims", "actual",
];

impl SimulationParameters {
    pub fn validate(&self) -> SdeResult<()> {
        validate_positive("S0", self.s0)?;
        validate_non_negative("K", self.k)?;
        validate_positive("T", self.t)?;
        validate_non_negative("v0", self.v0)?;
        validate_non_negative("r0", self.r0)?;
        validate_finite("closedForm", self.closed_form)?;
        validate_steps(self.steps)?;
        validate_samples(self.samples)?;
        Ok(())
    }

    /// Set one named parameter from its textual value
    ///
    /// Returns `Ok(false)` for an unrecognised key, which is left untouched.
    pub fn apply_override(&mut self, key: &str, value: &str) -> SdeResult<bool> {
        if !OVERRIDE_KEYS.contains(&key) && key != "closedForm" {
            debug!(key, value, "ignoring unknown parameter");
            return Ok(false);
        }
        self.set(key, parse_number(key, value)?)
    }

    /// Set one named parameter; `Ok(false)` for an unrecognised key
    pub fn set(&mut self, key: &str, value: f64) -> SdeResult<bool> {
        let slot = match key {
            "S0" => &mut self.s0,
            "K" => &mut self.k,
            "T" => &mut self.t,
            "Kv" => &mut self.kv,
            "Kr" => &mut self.kr,
            "sigmav" => &mut self.sigma_v,
            "sigmar" => &mut self.sigma_r,
            "v0" => &mut self.v0,
            "r0" => &mut self.r0,
            "theta" | "vbar" => &mut self.theta,
            "rbar" => &mut self.rbar,
            "rho12" => &mut self.rho12,
            "rho13" => &mut self.rho13,
            "rho23" => &mut self.rho23,
            "actual" | "closedForm" => &mut self.closed_form,
            "steps" => {
                self.steps = to_count(key, value)?;
                return Ok(true);
            }
            "sims" => {
                self.samples = to_count(key, value)?;
                return Ok(true);
            }
            _ => return Ok(false),
        };
        *slot = value;
        Ok(true)
    }

    pub fn correlation_matrix(&self) -> SdeResult<CorrelationMatrix> {
        CorrelationMatrix::from_pairs(self.rho12, self.rho13, self.rho23)
    }

    pub fn heston_params(&self) -> HestonParams {
        HestonParams {
            s0: self.s0,
            v0: self.v0,
            r0: self.r0,
            kv: self.kv,
            theta: self.theta,
            sigma_v: self.sigma_v,
            kr: self.kr,
            rbar: self.rbar,
            sigma_r: self.sigma_r,
        }
    }
}

pub(crate) fn parse_number(field: &str, value: &str) -> SdeResult<f64> {
    value.trim().parse::<f64>().map_err(|_| SdeError::ParseError {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// Counts may be written as floats (`1e5`, `500.0`) but must be whole and non-negative
fn to_count(field: &str, x: f64) -> SdeResult<usize> {
    if !x.is_finite() || x < 0.0 || x.fract() != 0.0 {
        return Err(SdeError::ParseError {
            field: field.to_string(),
            value: x.to_string(),
        });
    }
    Ok(x as usize)
}
