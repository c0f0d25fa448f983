// src/output.rs
//! Report rendering for pricing runs (text table, CSV, JSON)

use crate::config::SimulationParameters;
use crate::error::SdeResult;
use crate::mc::result::{MultilevelResult, PricingResult};
use crate::solvers::Scheme;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

/// Result of one estimator run
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum Outcome {
    Mc(PricingResult),
    Mlmc(MultilevelResult),
}

impl Outcome {
    pub fn estimate(&self) -> f64 {
        match self {
            Outcome::Mc(r) => r.mean,
            Outcome::Mlmc(r) => r.estimate,
        }
    }
}

/// One row of a report: the parameter set and what it produced
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub index: usize,
    pub model: String,
    pub scheme: Scheme,
    /// Matrix applied to the independent draws (row-major)
    pub correlation: [[f64; 3]; 3],
    pub parameters: SimulationParameters,
    pub outcome: Outcome,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    runs: &'a [RunRecord],
}

pub fn render(format: OutputFormat, records: &[RunRecord], generated_at: DateTime<Utc>) -> SdeResult<String> {
    match format {
        OutputFormat::Table => render_table(records, generated_at),
        OutputFormat::Csv => render_csv(records),
        OutputFormat::Json => render_json(records, generated_at),
    }
}

fn pct(value: Option<f64>) -> String {
    value.map(|p| format!("{p:.4}%")).unwrap_or_else(|| "n/a".to_string())
}

pub fn render_table(records: &[RunRecord], generated_at: DateTime<Utc>) -> SdeResult<String> {
    let mut out = String::new();
    writeln!(out, "sde-mlmc report generated {}", generated_at.to_rfc3339())?;
    for rec in records {
        write_record(&mut out, rec)?;
    }
    Ok(out)
}

fn write_record(out: &mut String, rec: &RunRecord) -> fmt::Result {
    let p = &rec.parameters;
    writeln!(out)?;
    writeln!(out, "======================")?;
    writeln!(out, "Parameter set {} ({}, {})", rec.index, rec.model, rec.scheme.name())?;
    writeln!(out, "======================")?;
    writeln!(
        out,
        "S0 = {}  K = {}  T = {}  steps = {}  sims = {}",
        p.s0, p.k, p.t, p.steps, p.samples
    )?;
    writeln!(
        out,
        "v0 = {}  Kv = {}  theta = {}  sigmav = {}",
        p.v0, p.kv, p.theta, p.sigma_v
    )?;
    writeln!(
        out,
        "r0 = {}  Kr = {}  rbar = {}  sigmar = {}",
        p.r0, p.kr, p.rbar, p.sigma_r
    )?;
    writeln!(
        out,
        "rho12 = {}  rho13 = {}  rho23 = {}",
        p.rho12, p.rho13, p.rho23
    )?;
    writeln!(out, "Correlation transform:")?;
    for row in &rec.correlation {
        writeln!(out, "  [{:>9.6} {:>9.6} {:>9.6}]", row[0], row[1], row[2])?;
    }

    match &rec.outcome {
        Outcome::Mc(r) => write_mc(out, r),
        Outcome::Mlmc(r) => write_mlmc(out, r),
    }
}

fn write_mc(out: &mut String, r: &PricingResult) -> fmt::Result {
    writeln!(out, "Mean         = {:.6}", r.mean)?;
    writeln!(out, "Variance     = {:.6}", r.variance)?;
    writeln!(out, "Std error    = {:.6}", r.std_error())?;
    writeln!(out, "Samples      = {}", r.samples)?;
    writeln!(out, "Steps        = {}", r.steps)?;
    writeln!(out, "Runtime      = {:.3} s", r.runtime_secs)?;
    if r.reference != 0.0 {
        writeln!(out, "Closed form  = {:.6}", r.reference)?;
        writeln!(out, "Strong error = {:.6e} ({})", r.strong_error, pct(r.strong_error_pct()))?;
        writeln!(out, "Weak error   = {:.6e} ({})", r.weak_error, pct(r.weak_error_pct()))?;
    }
    for warning in r.quality.describe() {
        writeln!(out, "WARNING: {warning} ({} non-finite)", r.non_finite_samples)?;
    }
    Ok(())
}

fn write_mlmc(out: &mut String, r: &MultilevelResult) -> fmt::Result {
    writeln!(out, "Estimate     = {:.6}", r.estimate)?;
    writeln!(out, "Std error    = {:.6}", r.estimator_variance.sqrt())?;
    writeln!(out, "Samples      = {}", r.total_samples())?;
    writeln!(out, "Finest steps = {}", r.finest_steps())?;
    writeln!(out, "Total cost   = {:.3e}", r.total_cost)?;
    writeln!(out, "Runtime      = {:.3} s", r.runtime_secs)?;
    if r.reference != 0.0 {
        writeln!(out, "Closed form  = {:.6}", r.reference)?;
        writeln!(out, "Strong error = {:.6e} ({})", r.strong_error, pct(r.strong_error_pct()))?;
    }
    writeln!(
        out,
        "{:>5} {:>8} {:>10} {:>14} {:>14}",
        "level", "steps", "samples", "mean", "variance"
    )?;
    for l in &r.levels {
        writeln!(
            out,
            "{:>5} {:>8} {:>10} {:>14.6e} {:>14.6e}",
            l.level, l.steps, l.samples, l.mean, l.variance
        )?;
    }
    for warning in r.quality.describe() {
        writeln!(out, "WARNING: {warning}")?;
    }
    Ok(())
}

const CSV_HEADER: [&str; 16] = [
    "index",
    "model",
    "method",
    "scheme",
    "S0",
    "K",
    "T",
    "steps",
    "samples",
    "estimate",
    "variance",
    "runtime_secs",
    "reference",
    "strong_error",
    "weak_error",
    "quality",
];

pub fn render_csv(records: &[RunRecord]) -> SdeResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for rec in records {
        let p = &rec.parameters;
        let (method, steps, samples, variance, runtime, reference, strong, weak, quality) = match &rec.outcome {
            Outcome::Mc(r) => (
                "mc",
                r.steps,
                r.samples,
                r.variance,
                r.runtime_secs,
                r.reference,
                r.strong_error,
                r.weak_error.to_string(),
                r.quality.bits(),
            ),
            Outcome::Mlmc(r) => (
                "mlmc",
                r.finest_steps(),
                r.total_samples(),
                r.estimator_variance,
                r.runtime_secs,
                r.reference,
                r.strong_error,
                String::new(),
                r.quality.bits(),
            ),
        };
        writer.write_record([
            rec.index.to_string(),
            rec.model.clone(),
            method.to_string(),
            rec.scheme.name().to_string(),
            p.s0.to_string(),
            p.k.to_string(),
            p.t.to_string(),
            steps.to_string(),
            samples.to_string(),
            rec.outcome.estimate().to_string(),
            variance.to_string(),
            runtime.to_string(),
            reference.to_string(),
            strong.to_string(),
            weak,
            quality.to_string(),
        ])?;
    }

    let bytes = writer.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| csv::Error::from(std::io::Error::new(std::io::ErrorKind::InvalidData, e)).into())
}

pub fn render_json(records: &[RunRecord], generated_at: DateTime<Utc>) -> SdeResult<String> {
    Ok(serde_json::to_string_pretty(&JsonReport {
        generated_at,
        runs: records,
    })?)
}
