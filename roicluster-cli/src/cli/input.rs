//! Loaders for the whitespace-separated input files.
//!
//! Distance files start with an `n <count>` header followed by one
//! `row col distance` triplet per line. Timepoint files hold one
//! `entity t1 t2 ...` line per observed entity. In both, blank lines and
//! lines starting with `#` are skipped and indices are zero-based.

use std::collections::HashSet;
use std::io::BufRead;
use std::path::Path;
use std::str::FromStr;

use roicluster_core::{
    ClusteringError, DenseDistanceMatrix, EntityTimepoints, SparseDistanceMatrix,
};

use super::commands::CliError;

/// Parsed contents of a distance file.
///
/// Pairs are stored with `row <= col`; a pair listed in both orientations
/// keeps its first distance.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceTable {
    entity_count: usize,
    triplets: Vec<(usize, usize, f32)>,
}

impl DistanceTable {
    /// Number of entities declared by the header.
    #[must_use]
    #[rustfmt::skip]
    pub fn entity_count(&self) -> usize { self.entity_count }

    /// Canonicalised `(row, col, distance)` triplets in file order.
    #[must_use]
    #[rustfmt::skip]
    pub fn triplets(&self) -> &[(usize, usize, f32)] { &self.triplets }

    /// Builds a sparse matrix holding exactly the listed pairs.
    ///
    /// # Errors
    /// Returns [`ClusteringError::InvalidDistance`] for negative or
    /// non-finite distances.
    pub fn to_sparse(&self) -> Result<SparseDistanceMatrix, ClusteringError> {
        SparseDistanceMatrix::from_triplets(
            self.entity_count,
            self.entity_count,
            self.triplets.iter().copied(),
        )
    }

    /// Builds a symmetric dense matrix. Unlisted pairs, and listed pairs
    /// with distance zero, read as absent.
    ///
    /// # Errors
    /// Returns [`ClusteringError::InvalidDistance`] for negative or
    /// non-finite distances.
    pub fn to_dense(&self) -> Result<DenseDistanceMatrix, ClusteringError> {
        let mut rows = vec![vec![0.0_f32; self.entity_count]; self.entity_count];
        for &(row, col, distance) in &self.triplets {
            for (r, c) in [(row, col), (col, row)] {
                if let Some(cell) = rows.get_mut(r).and_then(|values| values.get_mut(c)) {
                    *cell = distance;
                }
            }
        }
        DenseDistanceMatrix::from_rows(rows)
    }
}

/// Parses a distance file.
///
/// # Errors
/// Returns [`CliError::Parse`] for a missing or malformed header, malformed
/// triplets, or indices outside the declared entity count, and
/// [`CliError::Io`] when reading fails.
///
/// # Examples
/// ```
/// use std::io::Cursor;
/// use std::path::Path;
/// use roicluster_cli::cli::parse_distances;
///
/// let text = "# demo\nn 3\n0 1 1.5\n2 1 0.5\n1 2 9.0\n";
/// let table = parse_distances(Cursor::new(text), Path::new("demo.txt"))?;
/// assert_eq!(table.entity_count(), 3);
/// assert_eq!(table.triplets(), &[(0, 1, 1.5), (1, 2, 0.5)]);
/// # Ok::<(), roicluster_cli::cli::CliError>(())
/// ```
pub fn parse_distances(reader: impl BufRead, path: &Path) -> Result<DistanceTable, CliError> {
    let mut lines = content_lines(reader, path);
    let Some(header) = lines.next() else {
        return Err(parse_error(path, 0, "missing `n <count>` header"));
    };
    let (number, text) = header?;
    let entity_count = match text.split_whitespace().collect::<Vec<_>>().as_slice() {
        ["n", count] => field::<usize>(path, number, count, "entity count")?,
        _ => return Err(parse_error(path, number, "expected `n <count>` header")),
    };

    let mut seen = HashSet::new();
    let mut triplets = Vec::new();
    for line in lines {
        let (number, text) = line?;
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let [row, col, distance] = tokens.as_slice() else {
            return Err(parse_error(path, number, "expected `row col distance`"));
        };
        let row = entity(path, number, row, entity_count)?;
        let col = entity(path, number, col, entity_count)?;
        let distance = field::<f32>(path, number, distance, "distance")?;
        let pair = (row.min(col), row.max(col));
        if seen.insert(pair) {
            triplets.push((pair.0, pair.1, distance));
        }
    }
    Ok(DistanceTable {
        entity_count,
        triplets,
    })
}

/// Parses a timepoint file for `entity_count` entities.
///
/// Entities without a line are treated as never observed.
///
/// # Errors
/// Returns [`CliError::Parse`] for malformed lines or entities outside
/// `entity_count`, and [`CliError::Io`] when reading fails.
pub fn parse_timepoints(
    reader: impl BufRead,
    path: &Path,
    entity_count: usize,
) -> Result<EntityTimepoints, CliError> {
    let mut pairs = Vec::new();
    for line in content_lines(reader, path) {
        let (number, text) = line?;
        let mut tokens = text.split_whitespace();
        let Some(first) = tokens.next() else {
            continue;
        };
        let subject = entity(path, number, first, entity_count)?;
        for token in tokens {
            pairs.push((subject, field::<usize>(path, number, token, "timepoint")?));
        }
    }
    Ok(EntityTimepoints::from_pairs(entity_count, pairs)?)
}

/// Yields `(line number, trimmed text)` for every non-blank, non-comment
/// line. Line numbers are one-based.
fn content_lines(
    reader: impl BufRead,
    path: &Path,
) -> impl Iterator<Item = Result<(usize, String), CliError>> {
    reader
        .lines()
        .enumerate()
        .filter_map(move |(index, line)| match line {
            Ok(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() || trimmed.starts_with('#') {
                    None
                } else {
                    Some(Ok((index + 1, trimmed.to_owned())))
                }
            }
            Err(source) => Some(Err(CliError::Io {
                path: path.to_path_buf(),
                source,
            })),
        })
}

fn field<T: FromStr>(path: &Path, line: usize, raw: &str, what: &str) -> Result<T, CliError> {
    raw.parse::<T>()
        .map_err(|_| parse_error(path, line, &format!("invalid {what} `{raw}`")))
}

fn entity(path: &Path, line: usize, raw: &str, entity_count: usize) -> Result<usize, CliError> {
    let index = field::<usize>(path, line, raw, "entity")?;
    if index >= entity_count {
        return Err(parse_error(
            path,
            line,
            &format!("entity {index} is outside 0..{entity_count}"),
        ));
    }
    Ok(index)
}

fn parse_error(path: &Path, line: usize, message: &str) -> CliError {
    CliError::Parse {
        path: path.to_path_buf(),
        line,
        message: message.to_owned(),
    }
}
