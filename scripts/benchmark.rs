// scripts/benchmark.rs
//! Timing comparison: serial vs. parallel batches, Euler vs. Milstein, and
//! single-level vs. multilevel Monte Carlo under the three-factor model.

use anyhow::{Context, Result};
use sde_mlmc::analytics::bs_put_price;
use sde_mlmc::mc::{price, Allocation, McConfig, MultilevelEstimator, Payoff};
use sde_mlmc::models::{Gbm, Heston, HestonParams};
use sde_mlmc::{CorrelationMatrix, CorrelationMode, Scheme};
use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};

#[derive(Debug)]
struct SystemInfo {
    os: String,
    cpu_model: String,
    cpu_cores: usize,
    rustc_flags: String,
    rayon_threads: usize,
}

impl SystemInfo {
    fn gather() -> Self {
        Self {
            os: env::consts::OS.to_string(),
            cpu_model: Self::get_cpu_model(),
            cpu_cores: num_cpus::get(),
            rustc_flags: env::var("RUSTFLAGS").unwrap_or_else(|_| "default".to_string()),
            rayon_threads: rayon::current_num_threads(),
        }
    }

    fn get_cpu_model() -> String {
        std::fs::read_to_string("/proc/cpuinfo")
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .find(|line| line.starts_with("model name"))
                    .and_then(|line| line.split(':').nth(1))
                    .map(|s| s.trim().to_string())
            })
            .unwrap_or_else(|| "Unknown CPU".to_string())
    }
}

#[derive(Debug)]
struct BenchmarkResult {
    name: String,
    samples: u64,
    time_ms: f64,
    value: f64,
    std_error: f64,
    reference: Option<f64>,
}

impl BenchmarkResult {
    fn throughput(&self) -> f64 {
        self.samples as f64 / (self.time_ms / 1000.0)
    }

    fn relative_error(&self) -> Option<f64> {
        self.reference.map(|r| (self.value - r).abs() / r)
    }
}

fn svsi_model() -> Result<Heston> {
    Ok(Heston::new(HestonParams {
        s0: 100.0,
        v0: 0.04,
        r0: 0.04,
        kv: 2.0,
        theta: 0.04,
        sigma_v: 0.3,
        kr: 0.3,
        rbar: 0.04,
        sigma_r: 0.1,
    })?)
}

fn base_config() -> Result<McConfig> {
    let correlation = CorrelationMatrix::from_pairs(-0.5, 0.0, 0.0)?.transform(CorrelationMode::Raw)?;
    Ok(McConfig {
        samples: 100_000,
        steps: 256,
        correlation,
        seed: 42,
        payoff: Payoff::EuropeanPut { k: 100.0 },
        ..Default::default()
    })
}

fn run_parallel_benchmarks() -> Result<Vec<BenchmarkResult>> {
    let model = svsi_model()?;
    let mut results = Vec::new();

    for parallel in [false, true] {
        println!("Benchmarking {} batches...", if parallel { "parallel" } else { "serial" });
        let cfg = McConfig {
            parallel,
            ..base_config()?
        };
        let r = price(&model, &cfg, 0.0)?;
        results.push(BenchmarkResult {
            name: format!("SVSI put, {}", if parallel { "parallel" } else { "serial" }),
            samples: r.samples,
            time_ms: r.runtime_secs * 1000.0,
            value: r.mean,
            std_error: r.std_error(),
            reference: None,
        });
    }
    Ok(results)
}

fn run_scheme_benchmarks() -> Result<Vec<BenchmarkResult>> {
    // GBM has a closed form, so bias is visible
    let (s0, r, sigma, t, k) = (100.0, 0.05, 0.2, 1.0, 100.0);
    let model = Gbm::new(s0, r, sigma);
    let reference = bs_put_price(s0, k, r, sigma, t);
    let mut results = Vec::new();

    for scheme in [Scheme::EulerMaruyama, Scheme::Milstein] {
        for steps in [16, 64, 256] {
            println!("Benchmarking {} with {} steps...", scheme.name(), steps);
            let cfg = McConfig {
                samples: 200_000,
                steps,
                scheme,
                parallel: true,
                seed: 7,
                payoff: Payoff::EuropeanPut { k },
                ..Default::default()
            };
            let res = price(&model, &cfg, reference)?;
            results.push(BenchmarkResult {
                name: format!("GBM put, {} {} steps", scheme.name(), steps),
                samples: res.samples,
                time_ms: res.runtime_secs * 1000.0,
                value: res.mean,
                std_error: res.std_error(),
                reference: Some(reference),
            });
        }
    }
    Ok(results)
}

fn run_multilevel_benchmarks() -> Result<Vec<BenchmarkResult>> {
    let model = svsi_model()?;
    let base = McConfig {
        parallel: true,
        ..base_config()?
    };

    println!("Benchmarking single-level reference at 256 steps...");
    let single = price(&model, &base, 0.0)?;

    println!("Benchmarking adaptive multilevel (8 → 256 steps)...");
    let estimator = MultilevelEstimator::new(
        McConfig { steps: 8, ..base },
        5,
        Allocation::Adaptive {
            epsilon: single.std_error(),
            pilot_samples: 2_000,
            max_samples_per_level: 1_000_000,
        },
    );
    let ml = estimator.estimate(&model, 0.0)?;

    Ok(vec![
        BenchmarkResult {
            name: "SVSI put, single level".to_string(),
            samples: single.samples,
            time_ms: single.runtime_secs * 1000.0,
            value: single.mean,
            std_error: single.std_error(),
            reference: None,
        },
        BenchmarkResult {
            name: "SVSI put, multilevel".to_string(),
            samples: ml.total_samples(),
            time_ms: ml.runtime_secs * 1000.0,
            value: ml.estimate,
            std_error: ml.estimator_variance.sqrt(),
            reference: None,
        },
    ])
}

fn write_results_to_csv(results: &[BenchmarkResult], system_info: &SystemInfo, filename: &str) -> Result<()> {
    let file = File::create(filename).with_context(|| format!("could not create {filename}"))?;
    let mut file = BufWriter::new(file);

    writeln!(file, "# System Information")?;
    writeln!(file, "# OS: {}", system_info.os)?;
    writeln!(file, "# CPU: {}", system_info.cpu_model)?;
    writeln!(file, "# CPU Cores: {}", system_info.cpu_cores)?;
    writeln!(file, "# RUSTFLAGS: {}", system_info.rustc_flags)?;
    writeln!(file, "# Rayon Threads: {}", system_info.rayon_threads)?;
    writeln!(
        file,
        "# Benchmark Date: {}",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(file, "#")?;
    writeln!(
        file,
        "Benchmark,Samples,Time_ms,Throughput_samples_per_sec,Value,Std_Error,Reference,Relative_Error"
    )?;

    for result in results {
        writeln!(
            file,
            "{},{},{:.2},{:.0},{:.6},{:.6},{},{}",
            result.name,
            result.samples,
            result.time_ms,
            result.throughput(),
            result.value,
            result.std_error,
            result
                .reference
                .map(|v| format!("{v:.6}"))
                .unwrap_or_else(|| "N/A".to_string()),
            result
                .relative_error()
                .map(|e| format!("{e:.6}"))
                .unwrap_or_else(|| "N/A".to_string())
        )?;
    }
    file.flush()?;

    println!("Results written to {filename}");
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("sde-mlmc Benchmark Suite");
    println!("========================\n");

    let system_info = SystemInfo::gather();
    println!("System Information:");
    println!("  OS: {}", system_info.os);
    println!("  CPU: {}", system_info.cpu_model);
    println!("  CPU Cores: {}", system_info.cpu_cores);
    println!("  RUSTFLAGS: {}", system_info.rustc_flags);
    println!("  Rayon Threads: {}", system_info.rayon_threads);
    println!();

    let mut all_results = run_parallel_benchmarks()?;
    all_results.extend(run_scheme_benchmarks()?);
    all_results.extend(run_multilevel_benchmarks()?);

    println!("\n{:=<96}", "");
    println!("BENCHMARK RESULTS");
    println!("{:=<96}", "");
    println!(
        "{:<40} {:>9} {:>11} {:>13} {:>10} {:>10} {:>10}",
        "Benchmark", "Samples", "Time (ms)", "Throughput", "Value", "Std Err", "Rel Error"
    );
    for r in &all_results {
        println!(
            "{:<40} {:>9} {:>11.1} {:>13.0} {:>10.4} {:>10.4} {:>10}",
            r.name,
            r.samples,
            r.time_ms,
            r.throughput(),
            r.value,
            r.std_error,
            r.relative_error()
                .map(|e| format!("{e:.4}"))
                .unwrap_or_else(|| "N/A".to_string())
        );
    }

    write_results_to_csv(&all_results, &system_info, "benchmark_results.csv")
}
