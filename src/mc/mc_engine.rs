// src/mc/mc_engine.rs
use crate::correlation::CorrelationTransform;
use crate::error::{validation::*, SdeError, SdeResult};
use crate::math_utils::Timer;
use crate::mc::payoffs::Payoff;
use crate::mc::result::{PricingResult, QualityFlags};
use crate::models::{FactorModel, PathState};
use crate::rng::{NormalSource, RandomSource, RngFactory};
use crate::solvers::Scheme;
use crate::stats::OnlineAccumulator;
use rand::rngs::StdRng;
use rayon::prelude::*;
use tracing::{debug, info, warn};

#[derive(Clone, Debug)]
pub struct McConfig {
    pub samples: usize,
    pub steps: usize,
    pub maturity: f64,
    pub scheme: Scheme,
    pub correlation: CorrelationTransform,
    pub use_antithetic: bool,
    pub parallel: bool,
    /// Samples per RNG stream; fixes the partition independently of thread count
    pub batch_size: usize,
    pub seed: u64,
    /// Multiply payoffs by the model's discount factor
    pub discounted: bool,
    pub payoff: Payoff,
}

impl McConfig {
    /// Validate the Monte Carlo configuration
    pub fn validate(&self) -> SdeResult<()> {
        validate_samples(self.samples)?;
        validate_steps(self.steps)?;
        validate_positive("T", self.maturity)?;

        if self.batch_size == 0 {
            return Err(SdeError::InvalidConfiguration {
                field: "batch_size".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        if let Some(k) = self.payoff.strike() {
            validate_non_negative("K", k)?;
        }

        Ok(())
    }

    #[inline]
    pub fn dt(&self) -> f64 {
        self.maturity / self.steps as f64
    }

    /// Payoff of a terminal state, discounted when enabled
    #[inline]
    pub fn evaluate<M: FactorModel>(&self, model: &M, terminal: &PathState) -> f64 {
        let value = self.payoff.calculate(terminal.s);
        if self.discounted {
            value * model.discount_factor(terminal, self.maturity)
        } else {
            value
        }
    }
}

impl Default for McConfig {
    fn default() -> Self {
        McConfig {
            samples: 10_000,
            steps: 500,
            maturity: 1.0,
            scheme: Scheme::EulerMaruyama,
            correlation: CorrelationTransform::identity(),
            use_antithetic: false,
            parallel: false,
            batch_size: 4096,
            seed: 12345,
            discounted: true,
            payoff: Payoff::EuropeanPut { k: 100.0 },
        }
    }
}

/// Running statistics of one stream of samples
#[derive(Debug, Clone, Copy)]
pub(crate) struct SampleStatistics {
    pub acc: OnlineAccumulator,
    pub sum: f64,
    /// Σ |x − reference|
    pub abs_deviation_sum: f64,
    pub non_finite: u64,
    reference: f64,
}

impl SampleStatistics {
    pub fn new(reference: f64) -> Self {
        Self {
            acc: OnlineAccumulator::new(),
            sum: 0.0,
            abs_deviation_sum: 0.0,
            non_finite: 0,
            reference,
        }
    }

    #[inline]
    pub fn push(&mut self, x: f64) {
        if !x.is_finite() {
            self.non_finite += 1;
        }
        self.acc.update(x);
        self.sum += x;
        self.abs_deviation_sum += (x - self.reference).abs();
    }

    pub fn merged(mut self, other: Self) -> Self {
        self.acc.merge(&other.acc);
        self.sum += other.sum;
        self.abs_deviation_sum += other.abs_deviation_sum;
        self.non_finite += other.non_finite;
        self
    }

    pub fn quality(&self) -> QualityFlags {
        if self.non_finite > 0 {
            QualityFlags::NON_FINITE_SAMPLES
        } else {
            QualityFlags::empty()
        }
    }
}

/// Draw `samples` values from `sampler`, split into fixed batches that each
/// own the RNG stream `stream_prefix | batch`.
///
/// Batches run on the current rayon pool when `parallel` is set. The batch
/// partition does not depend on the thread count, so the same seed gives the
/// same samples either way; only the reduction order differs.
pub(crate) fn run_batches<F>(
    samples: usize,
    batch_size: usize,
    parallel: bool,
    factory: &RngFactory,
    stream_prefix: u64,
    reference: f64,
    sampler: F,
) -> SampleStatistics
where
    F: Fn(&mut NormalSource<StdRng>) -> f64 + Sync,
{
    let batch_count = samples.div_ceil(batch_size);
    let run_batch = |batch: usize| {
        let count = batch_size.min(samples - batch * batch_size);
        let mut source = factory.stream(stream_prefix | batch as u64);
        let mut stats = SampleStatistics::new(reference);
        for _ in 0..count {
            stats.push(sampler(&mut source));
        }
        debug!(batch, count, mean = stats.acc.mean(), "batch complete");
        stats
    };

    if parallel {
        (0..batch_count)
            .into_par_iter()
            .map(run_batch)
            .reduce(|| SampleStatistics::new(reference), SampleStatistics::merged)
    } else {
        (0..batch_count)
            .map(run_batch)
            .fold(SampleStatistics::new(reference), SampleStatistics::merged)
    }
}

#[inline]
fn scaled(z: [f64; 3], sqrt_dt: f64) -> [f64; 3] {
    [z[0] * sqrt_dt, z[1] * sqrt_dt, z[2] * sqrt_dt]
}

/// One Monte Carlo sample: simulate a path and evaluate its (discounted) payoff
///
/// With antithetic variates the mirrored path is driven by `-z` in lock-step
/// and the two payoffs are averaged, so memory stays O(1) per sample.
pub fn simulate_sample<M, R>(model: &M, cfg: &McConfig, source: &mut R) -> f64
where
    M: FactorModel,
    R: RandomSource + ?Sized,
{
    let dt = cfg.dt();
    let sqrt_dt = dt.sqrt();

    let mut state = model.initial_state();
    let mut mirror = cfg.use_antithetic.then(|| model.initial_state());

    for _ in 0..cfg.steps {
        let dw = scaled(cfg.correlation.apply(source.draw3()), sqrt_dt);
        model.step(&mut state, dt, dw, cfg.scheme);
        if let Some(m) = mirror.as_mut() {
            model.step(m, dt, [-dw[0], -dw[1], -dw[2]], cfg.scheme);
        }
    }

    let value = cfg.evaluate(model, &state);
    match mirror {
        Some(m) => 0.5 * (value + cfg.evaluate(model, &m)),
        None => value,
    }
}

/// Monte Carlo pricing of a terminal payoff under any [`FactorModel`]
///
/// # Math Framework
///
/// Each sample evolves (S, v, r) over `steps` steps of the chosen scheme with
/// correlated increments `dW = M z √Δt` and records the discounted payoff
/// ```text
/// Y = payoff(S_T) · DF_T
/// ```
/// Mean and variance come from a Welford accumulator; parallel batches are
/// merged with the pairwise formula.
///
/// # Error Metrics
///
/// - weak error: mean over samples of |Y − reference|
/// - strong error: |mean(Y) − reference|
///
/// # Errors
///
/// Returns `SdeError` for:
/// - Invalid configuration parameters
/// - A single-sample run, whose variance is undefined
pub fn price<M: FactorModel>(model: &M, cfg: &McConfig, reference: f64) -> SdeResult<PricingResult> {
    cfg.validate()?;
    let timer = Timer::new();

    info!(
        samples = cfg.samples,
        steps = cfg.steps,
        scheme = cfg.scheme.name(),
        payoff = cfg.payoff.name(),
        antithetic = cfg.use_antithetic,
        parallel = cfg.parallel,
        "starting Monte Carlo run"
    );

    let factory = RngFactory::new(cfg.seed);
    let stats = run_batches(
        cfg.samples,
        cfg.batch_size,
        cfg.parallel,
        &factory,
        0,
        reference,
        |source| simulate_sample(model, cfg, source),
    );

    let variance = stats.acc.variance()?;
    let mean = stats.acc.mean();
    let n = stats.acc.count();

    let quality = stats.quality();
    if stats.non_finite > 0 {
        warn!(
            non_finite = stats.non_finite,
            samples = n,
            "non-finite samples kept in the estimate"
        );
    }

    let result = PricingResult {
        mean,
        variance,
        samples: n,
        steps: cfg.steps,
        weak_error: stats.abs_deviation_sum / n as f64,
        strong_error: (mean - reference).abs(),
        reference,
        runtime_secs: timer.elapsed_secs(),
        quality,
        non_finite_samples: stats.non_finite,
    };

    info!(
        mean = result.mean,
        std_error = result.std_error(),
        runtime_secs = result.runtime_secs,
        "Monte Carlo run finished"
    );

    Ok(result)
}
