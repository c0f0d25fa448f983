//! Euler-Maruyama vs. Milstein convergence study on GBM
//!
//! For each step count the study runs `meta_samples` independent batches of
//! `samples` paths. Both schemes consume the *same* increments, so their
//! difference reflects discretization only. Per batch it records the sample
//! mean and standard deviation of S_T; across batches it reports the mean and
//! spread of those two statistics, plus the strong error
//! `E|X_T − S_T^exact|` against the exact GBM solution on the same Brownian
//! path.
//!
//! Every standard deviation in the study is a population figure (divide by
//! n), both within a batch and across the meta samples.
//!
//! With `antithetic` each pair of increments (ΔW₁, ΔW₂) is applied in both
//! orders and the two states are averaged after every pair.

use crate::error::{validation::*, SdeError, SdeResult};
use crate::models::Gbm;
use crate::rng::{RandomSource, RngFactory};
use crate::solvers::{EulerMaruyama, Milstein, Scheme};
use crate::stats::OnlineAccumulator;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Clone, Debug)]
pub struct ConvergenceConfig {
    pub model: Gbm,
    pub maturity: f64,
    pub step_counts: Vec<usize>,
    pub samples: usize,
    pub meta_samples: usize,
    pub antithetic: bool,
    pub parallel: bool,
    pub seed: u64,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        ConvergenceConfig {
            model: Gbm::new(100.0, 0.05, 0.03),
            maturity: 1.0,
            step_counts: (1..=12).map(|k| 1usize << k).collect(),
            samples: 1000,
            meta_samples: 1000,
            antithetic: false,
            parallel: true,
            seed: 12345,
        }
    }
}

impl ConvergenceConfig {
    pub fn validate(&self) -> SdeResult<()> {
        validate_positive("T", self.maturity)?;
        validate_positive("S0", self.model.s0)?;
        validate_non_negative("sigma", self.model.sigma)?;
        validate_samples(self.samples)?;
        validate_samples(self.meta_samples)?;
        for &steps in &self.step_counts {
            validate_steps(steps)?;
            if self.antithetic && steps % 2 != 0 {
                return Err(SdeError::InvalidConfiguration {
                    field: "steps".to_string(),
                    reason: format!("antithetic pairing needs an even step count, got {steps}"),
                });
            }
        }
        Ok(())
    }
}

/// Batch statistics of one scheme aggregated over all meta samples
#[derive(Debug, Clone, Serialize)]
pub struct SchemeSummary {
    pub scheme: Scheme,
    pub mean_of_means: f64,
    pub stdev_of_means: f64,
    pub mean_of_stdevs: f64,
    pub stdev_of_stdevs: f64,
    /// E|X_T − S_T^exact|
    pub strong_error: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvergenceRow {
    pub steps: usize,
    pub dt: f64,
    pub euler: SchemeSummary,
    pub milstein: SchemeSummary,
}

#[derive(Clone, Copy, Default)]
struct BatchStats {
    terminal: OnlineAccumulator,
    abs_error: OnlineAccumulator,
}

#[derive(Default)]
struct MetaStats {
    means: OnlineAccumulator,
    stdevs: OnlineAccumulator,
    strong: OnlineAccumulator,
}

impl MetaStats {
    fn push(&mut self, batch: &BatchStats) {
        self.means.update(batch.terminal.mean());
        self.stdevs.update(batch.terminal.population_variance().sqrt());
        self.strong.update(batch.abs_error.mean());
    }

    fn summary(&self, scheme: Scheme) -> SchemeSummary {
        SchemeSummary {
            scheme,
            mean_of_means: self.means.mean(),
            stdev_of_means: self.means.population_variance().sqrt(),
            mean_of_stdevs: self.stdevs.mean(),
            stdev_of_stdevs: self.stdevs.population_variance().sqrt(),
            strong_error: self.strong.mean(),
        }
    }
}

/// Terminal values (Euler, Milstein, exact) of one path
fn simulate_pair<R: RandomSource>(
    model: &Gbm,
    steps: usize,
    dt: f64,
    antithetic: bool,
    source: &mut R,
) -> (f64, f64, f64) {
    let sqrt_dt = dt.sqrt();
    let mut em = model.s0;
    let mut mil = model.s0;
    let mut w = 0.0;

    if antithetic {
        for _ in 0..steps / 2 {
            let dw1 = source.draw() * sqrt_dt;
            let dw2 = source.draw() * sqrt_dt;
            w += dw1 + dw2;
            em = swapped_average(em, |x, dw| EulerMaruyama::step(model, x, 0.0, dt, dw), dw1, dw2);
            mil = swapped_average(mil, |x, dw| Milstein::step(model, x, 0.0, dt, dw), dw1, dw2);
        }
    } else {
        for _ in 0..steps {
            let dw = source.draw() * sqrt_dt;
            w += dw;
            EulerMaruyama::step(model, &mut em, 0.0, dt, dw);
            Milstein::step(model, &mut mil, 0.0, dt, dw);
        }
    }

    let maturity = dt * steps as f64;
    let exact = model.exact_step(model.s0, maturity, w / maturity.sqrt());
    (em, mil, exact)
}

/// `½ [step(step(x, ΔW₁), ΔW₂) + step(step(x, ΔW₂), ΔW₁)]`
fn swapped_average<F>(x: f64, step: F, dw1: f64, dw2: f64) -> f64
where
    F: Fn(&mut f64, f64),
{
    let mut a = x;
    step(&mut a, dw1);
    step(&mut a, dw2);
    let mut b = x;
    step(&mut b, dw2);
    step(&mut b, dw1);
    0.5 * (a + b)
}

/// Run one meta sample: `samples` paths on a dedicated stream
fn run_meta(cfg: &ConvergenceConfig, factory: &RngFactory, steps: usize, meta: usize) -> (BatchStats, BatchStats) {
    let dt = cfg.maturity / steps as f64;
    let mut source = factory.stream(((steps as u64) << 32) | meta as u64);
    let mut euler = BatchStats::default();
    let mut milstein = BatchStats::default();

    for _ in 0..cfg.samples {
        let (em, mil, exact) = simulate_pair(&cfg.model, steps, dt, cfg.antithetic, &mut source);
        euler.terminal.update(em);
        euler.abs_error.update((em - exact).abs());
        milstein.terminal.update(mil);
        milstein.abs_error.update((mil - exact).abs());
    }
    (euler, milstein)
}

/// Run the study over every configured step count
pub fn run_study(cfg: &ConvergenceConfig) -> SdeResult<Vec<ConvergenceRow>> {
    cfg.validate()?;
    info!(
        step_counts = cfg.step_counts.len(),
        samples = cfg.samples,
        meta_samples = cfg.meta_samples,
        antithetic = cfg.antithetic,
        "starting convergence study"
    );

    let factory = RngFactory::new(cfg.seed);
    let mut rows = Vec::with_capacity(cfg.step_counts.len());

    for &steps in &cfg.step_counts {
        let batches: Vec<(BatchStats, BatchStats)> = if cfg.parallel {
            (0..cfg.meta_samples)
                .into_par_iter()
                .map(|m| run_meta(cfg, &factory, steps, m))
                .collect()
        } else {
            (0..cfg.meta_samples)
                .map(|m| run_meta(cfg, &factory, steps, m))
                .collect()
        };

        let mut euler = MetaStats::default();
        let mut milstein = MetaStats::default();
        for (e, m) in &batches {
            euler.push(e);
            milstein.push(m);
        }

        let row = ConvergenceRow {
            steps,
            dt: cfg.maturity / steps as f64,
            euler: euler.summary(Scheme::EulerMaruyama),
            milstein: milstein.summary(Scheme::Milstein),
        };
        debug!(
            steps,
            euler_strong = row.euler.strong_error,
            milstein_strong = row.milstein.strong_error,
            "step count complete"
        );
        rows.push(row);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_study(antithetic: bool) -> ConvergenceConfig {
        ConvergenceConfig {
            model: Gbm::new(100.0, 0.05, 0.4),
            step_counts: vec![4, 64],
            samples: 500,
            meta_samples: 20,
            antithetic,
            parallel: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_milstein_strong_error_smaller() {
        let rows = run_study(&small_study(false)).unwrap();
        for row in &rows {
            assert!(
                row.milstein.strong_error < row.euler.strong_error,
                "steps {}: Milstein {} vs Euler {}",
                row.steps,
                row.milstein.strong_error,
                row.euler.strong_error
            );
        }
        // refining the grid reduces the strong error of both schemes
        assert!(rows[1].euler.strong_error < rows[0].euler.strong_error);
        assert!(rows[1].milstein.strong_error < rows[0].milstein.strong_error);
    }

    #[test]
    fn test_means_near_expectation() {
        for antithetic in [false, true] {
            let rows = run_study(&small_study(antithetic)).unwrap();
            let expected = 100.0 * (0.05_f64).exp();
            for row in &rows {
                assert!((row.euler.mean_of_means - expected).abs() < 1.0);
                assert!((row.milstein.mean_of_means - expected).abs() < 1.0);
            }
        }
    }

    #[test]
    fn test_meta_statistics_divide_by_count() {
        let mut meta = MetaStats::default();
        for values in [[1.0, 3.0], [2.0, 6.0]] {
            let mut batch = BatchStats::default();
            for v in values {
                batch.terminal.update(v);
                batch.abs_error.update(0.0);
            }
            meta.push(&batch);
        }
        let summary = meta.summary(Scheme::EulerMaruyama);

        // batch means 2 and 4, batch population stdevs 1 and 2
        assert_eq!(summary.mean_of_means, 3.0);
        assert!((summary.stdev_of_means - 1.0).abs() < 1e-12);
        assert!((summary.mean_of_stdevs - 1.5).abs() < 1e-12);
        assert!((summary.stdev_of_stdevs - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_single_meta_sample_has_zero_spread() {
        let cfg = ConvergenceConfig {
            meta_samples: 1,
            step_counts: vec![4],
            ..small_study(false)
        };
        let rows = run_study(&cfg).unwrap();
        assert_eq!(rows[0].euler.stdev_of_means, 0.0);
        assert!(rows[0].euler.mean_of_stdevs > 0.0);
    }

    #[test]
    fn test_odd_steps_rejected_for_antithetic() {
        let cfg = ConvergenceConfig {
            step_counts: vec![3],
            antithetic: true,
            ..small_study(true)
        };
        assert!(run_study(&cfg).is_err());
    }
}
