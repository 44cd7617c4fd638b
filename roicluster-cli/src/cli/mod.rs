//! Command-line interface for constrained ROI clustering.
//!
//! The single `run` command reads a distance file and a timepoint file,
//! clusters the entities and prints one assignment line per entity.

mod commands;
mod input;

pub use commands::{Cli, CliError, Command, ExecutionSummary, RunCommand, render_summary, run_cli};
pub use input::{DistanceTable, parse_distances, parse_timepoints};
