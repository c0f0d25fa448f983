//! Parameter-table import
//!
//! One configuration per row, comma separated, header row first:
//! ```text
//! S0, K, T, Kv, Kr, sigmav, sigmar, v0, r0, rho12, closedForm, steps, sims
//! ```
//! Double quotes group commas into a single cell and are dropped. Cells are
//! trimmed; blank lines are skipped. A cell of the form `a/b` is the fraction
//! a ÷ b.

use super::params::{parse_number, SimulationParameters};
use crate::error::{SdeError, SdeResult};
use std::fs;
use std::path::Path;
use tracing::info;

/// Column order of a parameter row
pub const COLUMNS: [&str; 13] = [
    "S0",
    "K",
    "T",
    "Kv",
    "Kr",
    "sigmav",
    "sigmar",
    "v0",
    "r0",
    "rho12",
    "closedForm",
    "steps",
    "sims",
];

/// Parse a numeric cell, accepting `a/b` fractions
pub fn parse_cell(field: &str, cell: &str) -> SdeResult<f64> {
    match cell.split_once('/') {
        Some((numerator, denominator)) => {
            let n = parse_number(field, numerator)?;
            let d = parse_number(field, denominator)?;
            if d == 0.0 {
                return Err(SdeError::ParseError {
                    field: field.to_string(),
                    value: cell.to_string(),
                });
            }
            Ok(n / d)
        }
        None => parse_number(field, cell),
    }
}

/// Parse the text of a parameter table
///
/// Columns absent from the table (θ, r̄, ρ13, ρ23) keep their values from
/// `defaults`.
pub fn parse_table(text: &str, defaults: &SimulationParameters) -> SdeResult<Vec<SimulationParameters>> {
    // flexible: short and long rows are reported as MalformedRow below
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record?;
        if record.len() == 1 && record.get(0) == Some("") {
            continue;
        }
        let line = record.position().map_or(0, |p| p.line() as usize);
        if record.len() != COLUMNS.len() {
            return Err(SdeError::MalformedRow {
                line,
                expected: COLUMNS.len(),
                found: record.len(),
            });
        }

        let mut params = defaults.clone();
        for (name, cell) in COLUMNS.iter().zip(record.iter()) {
            params.set(name, parse_cell(name, cell)?)?;
        }
        rows.push(params);
    }

    Ok(rows)
}

/// Read and parse a parameter file
pub fn load_parameter_file(
    path: impl AsRef<Path>,
    defaults: &SimulationParameters,
) -> SdeResult<Vec<SimulationParameters>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| SdeError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let rows = parse_table(&text, defaults)?;
    info!(path = %path.display(), parameter_sets = rows.len(), "parameter table loaded");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "S0,K,T,Kv,Kr,sigmav,sigmar,v0,r0,rho12,closedForm,steps,sims";

    #[test]
    fn test_quoted_cells_and_whitespace() {
        let text = format!(
            "{HEADER}\n\"100\", 95 ,1/2,2,0.3,0.1,0.1,0.04,0.04,\"-0.5\",0,500,10000\n   \n"
        );
        let rows = parse_table(&text, &SimulationParameters::default()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].s0, 100.0);
        assert_eq!(rows[0].k, 95.0);
        assert_eq!(rows[0].rho12, -0.5);

        // a quoted comma stays inside its cell: 13 fields, one of them not numeric
        let text = format!("{HEADER}\n100,\"1,5\",1,2,0.3,0.1,0.1,0.04,0.04,0,0,500,10000\n");
        assert!(matches!(
            parse_table(&text, &SimulationParameters::default()),
            Err(SdeError::ParseError { .. })
        ));
    }

    #[test]
    fn test_parse_cell_fraction() {
        assert_eq!(parse_cell("T", "1/4").unwrap(), 0.25);
        assert_eq!(parse_cell("T", "3 / 12").unwrap(), 0.25);
        assert_eq!(parse_cell("S0", "100").unwrap(), 100.0);
        assert!(parse_cell("T", "1/0").is_err());
        assert!(parse_cell("T", "x/2").is_err());
    }

    #[test]
    fn test_parse_table() {
        let text = format!(
            "{HEADER}\n100,100,1/2,2,0.3,0.1,0.1,0.04,0.04,-0.5,5.57,500,10000\n\n90,100,1,2,0.3,0.1,0.1,0.04,0.04,0,12.1,250,2000\n"
        );
        let rows = parse_table(&text, &SimulationParameters::default()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].t, 0.5);
        assert_eq!(rows[0].rho12, -0.5);
        assert_eq!(rows[0].closed_form, 5.57);
        assert_eq!(rows[0].steps, 500);
        assert_eq!(rows[1].s0, 90.0);
        assert_eq!(rows[1].samples, 2000);
        // not in the table
        assert_eq!(rows[1].theta, SimulationParameters::default().theta);
    }

    #[test]
    fn test_wrong_field_count() {
        let text = format!("{HEADER}\n100,100,1,2,0.3,0.1,0.1,0.04,0.04,0,5.57,500,10000\n100,100,1\n");
        match parse_table(&text, &SimulationParameters::default()) {
            Err(SdeError::MalformedRow { line, expected, found }) => {
                assert_eq!(line, 3);
                assert_eq!(expected, 13);
                assert_eq!(found, 3);
            }
            other => panic!("expected MalformedRow, got {other:?}"),
        }
    }

    #[test]
    fn test_non_numeric_cell() {
        let text = format!("{HEADER}\n100,abc,1,2,0.3,0.1,0.1,0.04,0.04,0,5.57,500,10000\n");
        assert!(matches!(
            parse_table(&text, &SimulationParameters::default()),
            Err(SdeError::ParseError { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = load_parameter_file("/nonexistent/parameters.csv", &SimulationParameters::default())
            .unwrap_err();
        assert!(matches!(err, SdeError::Io { .. }));
    }
}
