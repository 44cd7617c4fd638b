//! Command implementations and argument parsing for the roicluster CLI.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use roicluster_core::{ClusteringBuilder, ClusteringError, ClusteringOutcome, DistanceMatrix};
use thiserror::Error;
use tracing::{Span, field, info, instrument};

use super::input::{parse_distances, parse_timepoints};

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "roicluster",
    about = "Cluster regions of interest without merging same-timepoint observations."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Cluster the entities described by a distance file and a timepoint file.
    Run(RunCommand),
}

/// Options accepted by the `run` command.
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// File holding an `n <count>` header and `row col distance` triplets.
    #[arg(long)]
    pub distances: PathBuf,

    /// File holding `entity t1 t2 ...` lines.
    #[arg(long)]
    pub timepoints: PathBuf,

    /// Largest tolerated share of occupied timepoints seen more than once.
    #[arg(long = "overlap-threshold", default_value_t = 0.0)]
    pub overlap_threshold: f32,

    /// Distance above which no further merges are considered.
    #[arg(long = "height-threshold", default_value_t = f32::INFINITY)]
    pub height_threshold: f32,

    /// Load distances into a dense matrix and scan it directly.
    #[arg(long)]
    pub dense: bool,

    /// Allow each entity at most one merge.
    #[arg(long = "pair-match")]
    pub pair_match: bool,
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// File I/O failed while loading an input.
    #[error("failed to read `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// An input file was malformed.
    #[error("{path}:{line}: {message}")]
    Parse {
        /// File containing the bad line.
        path: PathBuf,
        /// One-based line number, or zero when the file ended early.
        line: usize,
        /// What was wrong with the line.
        message: String,
    },
    /// Clustering rejected the inputs or configuration.
    #[error(transparent)]
    Core(#[from] ClusteringError),
}

/// Summarises the outcome of executing a CLI command.
#[derive(Debug, Clone)]
pub struct ExecutionSummary {
    /// Assignment and merge statistics from the run.
    pub outcome: ClusteringOutcome,
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when loading or clustering fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use roicluster_cli::cli::{Cli, Command, RunCommand, run_cli};
/// # use tempfile::TempDir;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let dir = TempDir::new()?;
/// let distances = dir.path().join("distances.txt");
/// let timepoints = dir.path().join("timepoints.txt");
/// std::fs::write(&distances, "n 2\n0 1 1.0\n")?;
/// std::fs::write(&timepoints, "0 0\n1 1\n")?;
/// let cli = Cli {
///     command: Command::Run(RunCommand {
///         distances,
///         timepoints,
///         overlap_threshold: 0.0,
///         height_threshold: f32::INFINITY,
///         dense: false,
///         pair_match: false,
///     }),
/// };
/// let summary = run_cli(cli)?;
/// assert_eq!(summary.outcome.assignment().cluster_count(), 1);
/// # Ok(())
/// # }
/// ```
#[instrument(
    name = "cli.run",
    err,
    skip(cli),
    fields(command = field::Empty),
)]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    match cli.command {
        Command::Run(run) => {
            Span::current().record("command", field::display("run"));
            run_command(run)
        }
    }
}

#[instrument(
    name = "cli.execute",
    err,
    skip(command),
    fields(
        distances = %command.distances.display(),
        timepoints = %command.timepoints.display(),
        dense = command.dense,
        entities = field::Empty,
    ),
)]
pub(super) fn run_command(command: RunCommand) -> Result<ExecutionSummary, CliError> {
    let engine = ClusteringBuilder::new()
        .with_overlap_threshold(command.overlap_threshold)
        .with_height_threshold(command.height_threshold)
        .with_sparse_representation(!command.dense)
        .with_pair_match(command.pair_match)
        .build()?;

    let table = parse_distances(open_reader(&command.distances)?, &command.distances)?;
    let entity_count = table.entity_count();
    Span::current().record("entities", entity_count);
    let matrix: DistanceMatrix = if command.dense {
        table.to_dense()?.into()
    } else {
        table.to_sparse()?.into()
    };
    let timepoints = parse_timepoints(
        open_reader(&command.timepoints)?,
        &command.timepoints,
        entity_count,
    )?;

    let outcome = engine.run(&matrix, &timepoints)?;
    info!(
        clusters = outcome.assignment().cluster_count(),
        "command completed"
    );
    Ok(ExecutionSummary { outcome })
}

#[instrument(name = "cli.open", err, skip(path), fields(path = %path.display()))]
pub(super) fn open_reader(path: &Path) -> Result<BufReader<File>, CliError> {
    let file = File::open(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

/// Renders `summary` to `writer`: the cluster count, the merge statistics,
/// then one `entity<TAB>cluster<TAB>root` line per entity.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    let assignment = summary.outcome.assignment();
    let stats = summary.outcome.stats();
    writeln!(writer, "clusters: {}", assignment.cluster_count())?;
    writeln!(writer, "edges examined: {}", stats.examined)?;
    writeln!(writer, "merges accepted: {}", stats.accepted)?;
    writeln!(writer, "merges rejected for overlap: {}", stats.rejected_overlap)?;
    match stats.halted_at {
        Some(distance) => writeln!(writer, "halted at distance: {distance}")?,
        None => writeln!(writer, "halted at distance: none")?,
    }
    for (entity, (label, root)) in assignment
        .labels()
        .iter()
        .zip(assignment.roots())
        .enumerate()
    {
        writeln!(writer, "{entity}\t{}\t{root}", label.get())?;
    }
    Ok(())
}
