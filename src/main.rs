//! sde-mlmc command line
//!
//! Prices a European option for every parameter set (a parameter table, or the
//! built-in defaults) with single-level or multilevel Monte Carlo, then prints
//! a report. Trailing `-key=value` arguments override individual parameters,
//! for example:
//!
//! ```text
//! sde-mlmc --method mlmc --scheme milstein -S0=110 -sigmav=0.2 -actual=4.83
//! ```

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, ValueEnum};
use sde_mlmc::analytics::gbm_reference;
use sde_mlmc::config::{
    apply_overrides, load_parameter_file, parse_overrides, partition_args, SimulationParameters,
};
use sde_mlmc::correlation::CorrelationMode;
use sde_mlmc::mc::{self, Allocation, McConfig, MultilevelEstimator, Payoff};
use sde_mlmc::models::{FactorModel, Gbm, Heston};
use sde_mlmc::output::{self, OutputFormat, Outcome, RunRecord};
use sde_mlmc::solvers::Scheme;
use sde_mlmc::SdeResult;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModelArg {
    /// Stochastic volatility and stochastic interest rate
    Svsi,
    /// Geometric Brownian motion with σ = √v0 and constant rate r0
    Gbm,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MethodArg {
    Mc,
    Mlmc,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SchemeArg {
    Euler,
    Milstein,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CorrelationArg {
    Raw,
    Cholesky,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PayoffArg {
    Put,
    Call,
    Terminal,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Table,
    Csv,
    Json,
}

/// Multilevel Monte Carlo pricing under stochastic volatility and rates
#[derive(Parser, Debug)]
#[command(
    name = "sde-mlmc",
    long_about = None,
    after_help = "Parameter overrides: -KEY=VALUE, anywhere on the command line \
                  (e.g. -S0=110 -sims=50000 -actual=4.83). Keys: S0 K T Kv Kr sigmav \
                  sigmar v0 r0 theta vbar rbar rho12 rho13 rho23 steps sims actual"
)]
struct Cli {
    /// Parameter table (CSV, header row first)
    #[arg(long, value_name = "FILE")]
    parameters: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ModelArg::Svsi)]
    model: ModelArg,

    #[arg(long, value_enum, default_value_t = MethodArg::Mc)]
    method: MethodArg,

    #[arg(long, value_enum, default_value_t = SchemeArg::Euler)]
    scheme: SchemeArg,

    /// How the correlation matrix is applied to independent draws
    #[arg(long, value_enum, default_value_t = CorrelationArg::Raw)]
    correlation: CorrelationArg,

    #[arg(long, value_enum, default_value_t = PayoffArg::Put)]
    payoff: PayoffArg,

    /// Average each path with its mirror driven by -z
    #[arg(long)]
    antithetic: bool,

    /// Run sample batches on a rayon thread pool
    #[arg(long)]
    parallel: bool,

    /// Thread pool size (default: number of CPUs)
    #[arg(long)]
    threads: Option<usize>,

    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Finest multilevel level index
    #[arg(long, default_value_t = 4)]
    levels: usize,

    /// Steps on multilevel level 0
    #[arg(long, default_value_t = 8)]
    base_steps: usize,

    /// Target RMS error; switches multilevel allocation to adaptive
    #[arg(long)]
    epsilon: Option<f64>,

    /// Pilot samples per level for adaptive allocation
    #[arg(long, default_value_t = 1000)]
    pilot_samples: usize,

    /// Per-level sample cap for adaptive allocation
    #[arg(long, default_value_t = 10_000_000)]
    max_samples: usize,

    /// Report undiscounted payoffs
    #[arg(long)]
    no_discount: bool,

    #[arg(long, value_enum, default_value_t = FormatArg::Table)]
    format: FormatArg,
}

impl Cli {
    fn scheme(&self) -> Scheme {
        match self.scheme {
            SchemeArg::Euler => Scheme::EulerMaruyama,
            SchemeArg::Milstein => Scheme::Milstein,
        }
    }

    fn correlation_mode(&self) -> CorrelationMode {
        match self.correlation {
            CorrelationArg::Raw => CorrelationMode::Raw,
            CorrelationArg::Cholesky => CorrelationMode::Cholesky,
        }
    }

    fn payoff(&self, strike: f64) -> Payoff {
        match self.payoff {
            PayoffArg::Put => Payoff::EuropeanPut { k: strike },
            PayoffArg::Call => Payoff::EuropeanCall { k: strike },
            PayoffArg::Terminal => Payoff::Terminal,
        }
    }

    fn output_format(&self) -> OutputFormat {
        match self.format {
            FormatArg::Table => OutputFormat::Table,
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Json => OutputFormat::Json,
        }
    }

    fn mc_config(&self, p: &SimulationParameters) -> SdeResult<McConfig> {
        let correlation = match self.model {
            ModelArg::Svsi => p.correlation_matrix()?.transform(self.correlation_mode())?,
            ModelArg::Gbm => Default::default(),
        };
        Ok(McConfig {
            samples: p.samples,
            steps: p.steps,
            maturity: p.t,
            scheme: self.scheme(),
            correlation,
            use_antithetic: self.antithetic,
            parallel: self.parallel,
            seed: self.seed,
            discounted: !self.no_discount,
            payoff: self.payoff(p.k),
            ..Default::default()
        })
    }

    fn run<M: FactorModel>(
        &self,
        model: &M,
        cfg: McConfig,
        p: &SimulationParameters,
        reference: f64,
    ) -> SdeResult<Outcome> {
        match self.method {
            MethodArg::Mc => Ok(Outcome::Mc(mc::price(model, &cfg, reference)?)),
            MethodArg::Mlmc => {
                let allocation = match self.epsilon {
                    Some(epsilon) => Allocation::Adaptive {
                        epsilon,
                        pilot_samples: self.pilot_samples,
                        max_samples_per_level: self.max_samples,
                    },
                    None => Allocation::Uniform {
                        samples_per_level: p.samples,
                    },
                };
                let base = McConfig {
                    steps: self.base_steps,
                    ..cfg
                };
                let estimator = MultilevelEstimator::new(base, self.levels, allocation);
                Ok(Outcome::Mlmc(estimator.estimate(model, reference)?))
            }
        }
    }

    fn run_set(&self, index: usize, p: &SimulationParameters) -> SdeResult<RunRecord> {
        p.validate()?;
        let cfg = self.mc_config(p)?;
        let correlation = cfg.correlation.rows();
        let (model_name, outcome) = match self.model {
            ModelArg::Svsi => {
                let model = Heston::new(p.heston_params())?;
                ("svsi", self.run(&model, cfg, p, p.closed_form)?)
            }
            ModelArg::Gbm => {
                let sigma = p.v0.sqrt();
                let model = Gbm::validated(p.s0, p.r0, sigma)?;
                let reference = if p.closed_form != 0.0 {
                    p.closed_form
                } else {
                    gbm_reference(&self.payoff(p.k), p.s0, p.r0, sigma, p.t, !self.no_discount)
                };
                ("gbm", self.run(&model, cfg, p, reference)?)
            }
        };
        Ok(RunRecord {
            index,
            model: model_name.to_string(),
            scheme: self.scheme(),
            correlation,
            parameters: p.clone(),
            outcome,
        })
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let (flags, override_args) = partition_args(std::env::args());
    let cli = Cli::parse_from(flags);
    let overrides = parse_overrides(&override_args)?;

    if cli.parallel {
        let threads = cli.threads.unwrap_or_else(num_cpus::get);
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to build the rayon thread pool")?;
        info!(threads, "parallel execution enabled");
    }

    let defaults = SimulationParameters::default();
    let mut parameter_sets = match &cli.parameters {
        Some(path) => load_parameter_file(path, &defaults)
            .with_context(|| format!("loading parameters from {}", path.display()))?,
        None => vec![defaults],
    };

    for p in &mut parameter_sets {
        apply_overrides(p, &overrides)?;
    }

    let mut records = Vec::with_capacity(parameter_sets.len());
    let mut failures = 0usize;
    for (i, p) in parameter_sets.iter().enumerate() {
        match cli.run_set(i + 1, p) {
            Ok(record) => records.push(record),
            Err(e) => {
                failures += 1;
                error!(parameter_set = i + 1, error = %e, "parameter set aborted");
            }
        }
    }

    let report = output::render(cli.output_format(), &records, Utc::now())?;
    print!("{report}");

    if failures > 0 {
        bail!("{failures} of {} parameter sets failed", parameter_sets.len());
    }
    Ok(())
}
