//! `-key=value` command-line overrides
//!
//! Overrides share the command line with the long `--flag` options. They are
//! separated out with [`partition_args`] before flag parsing, so flags and
//! overrides may appear in any order.

use super::params::SimulationParameters;
use crate::error::{SdeError, SdeResult};
use tracing::debug;

/// A single `-key=value` pair
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Override {
    pub key: String,
    pub value: String,
}

/// Single-dash argument carrying a value, e.g. `-S0=110`
pub fn is_override(arg: &str) -> bool {
    arg.len() > 1 && arg.starts_with('-') && !arg.starts_with("--") && arg.contains('=')
}

/// Split a full command line into (flag arguments, override arguments)
///
/// Relative order is kept within each half; the program name stays first in
/// the flag half.
pub fn partition_args<I, S>(args: I) -> (Vec<String>, Vec<String>)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    args.into_iter().map(Into::into).partition(|arg| !is_override(arg))
}

/// Split `-key=value` arguments into pairs
///
/// Arguments that do not start with `-` are skipped. A missing `=` yields an
/// empty value, which fails later if the key is a recognised one. A `--flag`
/// is rejected: it would otherwise be read as the unknown key `-flag` and
/// dropped.
pub fn parse_overrides<I, S>(args: I) -> SdeResult<Vec<Override>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut overrides = Vec::new();
    for arg in args {
        let arg = arg.as_ref();
        if arg.starts_with("--") {
            return Err(SdeError::InvalidConfiguration {
                field: arg.to_string(),
                reason: "long options are not parameter overrides".to_string(),
            });
        }
        let Some(body) = arg.strip_prefix('-') else {
            debug!(arg, "skipping argument without leading '-'");
            continue;
        };
        let (key, value) = body.split_once('=').unwrap_or((body, ""));
        overrides.push(Override {
            key: key.to_string(),
            value: value.to_string(),
        });
    }
    Ok(overrides)
}

/// Apply overrides in order; returns how many keys were recognised
pub fn apply_overrides(params: &mut SimulationParameters, overrides: &[Override]) -> SdeResult<usize> {
    let mut applied = 0;
    for o in overrides {
        if params.apply_override(&o.key, &o.value)? {
            applied += 1;
        }
    }
    Ok(applied)
}
