//! Result records produced by the pricing engines

use bitflags::bitflags;
use serde::Serialize;

bitflags! {
    /// Data-quality warnings attached to a result
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
    #[serde(transparent)]
    pub struct QualityFlags: u32 {
        /// At least one sample was NaN or infinite; it stays in the denominator
        const NON_FINITE_SAMPLES  = 1 << 0;
        /// Adaptive allocation wanted more samples than the per-level cap
        const SAMPLE_CAP_REACHED  = 1 << 1;
        /// The finest level's correction is still large relative to the target error
        const NOT_CONVERGED       = 1 << 2;
    }
}

impl QualityFlags {
    /// Human-readable list of the raised flags
    pub fn describe(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.contains(QualityFlags::NON_FINITE_SAMPLES) {
            out.push("non-finite samples");
        }
        if self.contains(QualityFlags::SAMPLE_CAP_REACHED) {
            out.push("sample cap reached");
        }
        if self.contains(QualityFlags::NOT_CONVERGED) {
            out.push("bias not converged");
        }
        out
    }
}

/// Outcome of a single-level Monte Carlo run
#[derive(Debug, Clone, Serialize)]
pub struct PricingResult {
    pub mean: f64,
    pub variance: f64,
    pub samples: u64,
    pub steps: usize,
    /// Mean of |sample − reference|
    pub weak_error: f64,
    /// |mean − reference|
    pub strong_error: f64,
    pub reference: f64,
    pub runtime_secs: f64,
    pub quality: QualityFlags,
    pub non_finite_samples: u64,
}

impl PricingResult {
    /// Standard error of the mean
    pub fn std_error(&self) -> f64 {
        (self.variance / self.samples as f64).sqrt()
    }

    /// Strong error as a percentage of the reference; `None` when no reference is set
    pub fn strong_error_pct(&self) -> Option<f64> {
        relative_pct(self.strong_error, self.reference)
    }

    pub fn weak_error_pct(&self) -> Option<f64> {
        relative_pct(self.weak_error, self.reference)
    }
}

/// Per-level summary of a multilevel run
#[derive(Debug, Clone, Serialize)]
pub struct LevelResult {
    pub level: usize,
    /// Fine steps at this level
    pub steps: usize,
    pub samples: u64,
    /// Sum of fine − coarse differences (plain payoffs on level 0)
    pub sum: f64,
    /// Variance of a single difference
    pub variance: f64,
    pub mean: f64,
    /// samples × fine steps
    pub cost: f64,
    pub quality: QualityFlags,
    pub non_finite_samples: u64,
}

/// Outcome of a multilevel run
#[derive(Debug, Clone, Serialize)]
pub struct MultilevelResult {
    /// Telescoping sum of level means
    pub estimate: f64,
    /// Σ V_ℓ / N_ℓ
    pub estimator_variance: f64,
    pub levels: Vec<LevelResult>,
    pub total_cost: f64,
    pub reference: f64,
    /// |estimate − reference|
    pub strong_error: f64,
    pub runtime_secs: f64,
    pub quality: QualityFlags,
}

impl MultilevelResult {
    pub fn total_samples(&self) -> u64 {
        self.levels.iter().map(|l| l.samples).sum()
    }

    pub fn finest_steps(&self) -> usize {
        self.levels.last().map(|l| l.steps).unwrap_or(0)
    }

    pub fn strong_error_pct(&self) -> Option<f64> {
        relative_pct(self.strong_error, self.reference)
    }
}

fn relative_pct(error: f64, reference: f64) -> Option<f64> {
    if reference == 0.0 {
        None
    } else {
        Some(100.0 * error / reference.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result(reference: f64) -> PricingResult {
        PricingResult {
            mean: 10.5,
            variance: 4.0,
            samples: 400,
            steps: 100,
            weak_error: 2.0,
            strong_error: 0.5,
            reference,
            runtime_secs: 0.1,
            quality: QualityFlags::empty(),
            non_finite_samples: 0,
        }
    }

    #[test]
    fn test_relative_errors() {
        let r = sample_result(10.0);
        assert_eq!(r.strong_error_pct(), Some(5.0));
        assert_eq!(r.weak_error_pct(), Some(20.0));
        assert!((r.std_error() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_no_reference_means_no_percentages() {
        let r = sample_result(0.0);
        assert_eq!(r.strong_error_pct(), None);
        assert_eq!(r.weak_error_pct(), None);
    }

    #[test]
    fn test_flag_description() {
        let flags = QualityFlags::NON_FINITE_SAMPLES | QualityFlags::SAMPLE_CAP_REACHED;
        assert_eq!(flags.describe(), vec!["non-finite samples", "sample cap reached"]);
        assert!(QualityFlags::default().describe().is_empty());
    }
}
