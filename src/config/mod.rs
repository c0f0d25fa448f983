//! Simulation parameters, parameter tables and command-line overrides

pub mod cli;
pub mod params;
pub mod table;

pub use cli::{apply_overrides, is_override, parse_overrides, partition_args, Override};
pub use params::SimulationParameters;
pub use table::{load_parameter_file, parse_table};
