//! Support library for the `roicluster` binary.
//!
//! Exposes argument parsing, input loading and logging setup so tests can
//! drive the command pipeline in-process.

pub mod cli;
pub mod logging;
