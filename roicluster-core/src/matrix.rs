//! Pairwise distance inputs.
//!
//! A [`SparseDistanceMatrix`] stores only the structurally present entries as
//! `(row, col, distance)` triplets in insertion order; that order is the
//! tie-break used when two candidate edges share a distance. A stored zero is
//! a real zero-distance edge. [`DenseDistanceMatrix`] cannot tell a zero
//! distance apart from a missing one, so its off-diagonal zeros are treated
//! as absent.

use crate::error::{ClusteringError, Result};

pub(crate) fn require_square(rows: usize, cols: usize) -> Result<usize> {
    if rows == cols {
        Ok(rows)
    } else {
        Err(ClusteringError::DimensionMismatch {
            what: "distance matrix columns",
            left: cols,
            right: rows,
        })
    }
}

/// One stored entry of a sparse distance matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistanceEntry {
    row: usize,
    col: usize,
    distance: f32,
}

impl DistanceEntry {
    /// Row index of the entry.
    #[must_use]
    #[rustfmt::skip]
    pub fn row(&self) -> usize { self.row }

    /// Column index of the entry.
    #[must_use]
    #[rustfmt::skip]
    pub fn col(&self) -> usize { self.col }

    /// Stored distance.
    #[must_use]
    #[rustfmt::skip]
    pub fn distance(&self) -> f32 { self.distance }
}

fn validate_distance(row: usize, col: usize, distance: f32) -> Result<()> {
    if distance.is_finite() && distance >= 0.0 {
        Ok(())
    } else {
        Err(ClusteringError::InvalidDistance { row, col, distance })
    }
}

/// Sparse distance matrix in triplet form.
///
/// # Examples
/// ```
/// use roicluster_core::SparseDistanceMatrix;
///
/// let matrix = SparseDistanceMatrix::from_triplets(3, 3, [(0, 1, 1.5), (1, 2, 0.0)])?;
/// assert_eq!(matrix.stored_len(), 2);
/// assert!(matrix.is_square());
/// # Ok::<(), roicluster_core::ClusteringError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct SparseDistanceMatrix {
    rows: usize,
    cols: usize,
    entries: Vec<DistanceEntry>,
}

impl SparseDistanceMatrix {
    /// Builds a matrix from `(row, col, distance)` triplets.
    ///
    /// Entries keep the order in which they were supplied.
    ///
    /// # Errors
    /// Returns [`ClusteringError::OutOfRange`] when a triplet addresses a
    /// cell outside `rows × cols`, and [`ClusteringError::InvalidDistance`]
    /// when a distance is negative or non-finite.
    pub fn from_triplets(
        rows: usize,
        cols: usize,
        triplets: impl IntoIterator<Item = (usize, usize, f32)>,
    ) -> Result<Self> {
        let entries = triplets
            .into_iter()
            .map(|(row, col, distance)| {
                if row >= rows {
                    return Err(ClusteringError::entity_out_of_range(row, rows));
                }
                if col >= cols {
                    return Err(ClusteringError::entity_out_of_range(col, cols));
                }
                validate_distance(row, col, distance)?;
                Ok(DistanceEntry { row, col, distance })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            rows,
            cols,
            entries,
        })
    }

    /// Number of rows.
    #[must_use]
    #[rustfmt::skip]
    pub fn rows(&self) -> usize { self.rows }

    /// Number of columns.
    #[must_use]
    #[rustfmt::skip]
    pub fn cols(&self) -> usize { self.cols }

    /// Returns `true` when `rows == cols`.
    #[must_use]
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Number of structurally stored entries.
    #[must_use]
    pub fn stored_len(&self) -> usize {
        self.entries.len()
    }

    /// Stored entries in storage order.
    #[must_use]
    #[rustfmt::skip]
    pub fn entries(&self) -> &[DistanceEntry] { &self.entries }
}

/// Dense row-major distance matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct DenseDistanceMatrix {
    rows: usize,
    cols: usize,
    values: Vec<f32>,
}

impl DenseDistanceMatrix {
    /// Builds a matrix from equally long rows.
    ///
    /// # Errors
    /// Returns [`ClusteringError::DimensionMismatch`] when rows differ in
    /// length and [`ClusteringError::InvalidDistance`] for negative or
    /// non-finite values.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut values = Vec::with_capacity(rows.len().saturating_mul(cols));
        for (row, data) in rows.iter().enumerate() {
            if data.len() != cols {
                return Err(ClusteringError::DimensionMismatch {
                    what: "dense row length",
                    left: data.len(),
                    right: cols,
                });
            }
            for (col, &distance) in data.iter().enumerate() {
                validate_distance(row, col, distance)?;
            }
            values.extend_from_slice(data);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            values,
        })
    }

    /// Number of rows.
    #[must_use]
    #[rustfmt::skip]
    pub fn rows(&self) -> usize { self.rows }

    /// Number of columns.
    #[must_use]
    #[rustfmt::skip]
    pub fn cols(&self) -> usize { self.cols }

    /// Returns `true` when `rows == cols`.
    #[must_use]
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Returns the value at `(row, col)`, or `None` outside the matrix.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.values.get(row * self.cols + col).copied()
    }

    /// Iterates the non-zero entries in row-major order.
    pub fn nonzero_entries(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, distance)| **distance != 0.0)
            .map(|(index, &distance)| (index / self.cols, index % self.cols, distance))
    }

    /// Compacts the matrix to its non-zero entries, keeping row-major order.
    #[must_use]
    pub fn to_sparse(&self) -> SparseDistanceMatrix {
        let entries = self
            .nonzero_entries()
            .map(|(row, col, distance)| DistanceEntry { row, col, distance })
            .collect();
        SparseDistanceMatrix {
            rows: self.rows,
            cols: self.cols,
            entries,
        }
    }
}

/// Distance input accepted by the clustering engine.
#[derive(Clone, Debug, PartialEq)]
pub enum DistanceMatrix {
    /// Structurally sparse storage; only stored entries are candidates.
    Sparse(SparseDistanceMatrix),
    /// Dense storage; off-diagonal zeros are treated as absent.
    Dense(DenseDistanceMatrix),
}

impl DistanceMatrix {
    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        match self {
            Self::Sparse(matrix) => matrix.rows(),
            Self::Dense(matrix) => matrix.rows(),
        }
    }

    /// Number of columns.
    #[must_use]
    pub fn cols(&self) -> usize {
        match self {
            Self::Sparse(matrix) => matrix.cols(),
            Self::Dense(matrix) => matrix.cols(),
        }
    }

    /// Fails with [`ClusteringError::DimensionMismatch`] unless the matrix is
    /// square, returning the entity count otherwise.
    ///
    /// # Errors
    /// See above.
    pub fn square_dimension(&self) -> Result<usize> {
        require_square(self.rows(), self.cols())
    }
}

impl From<SparseDistanceMatrix> for DistanceMatrix {
    fn from(matrix: SparseDistanceMatrix) -> Self {
        Self::Sparse(matrix)
    }
}

impl From<DenseDistanceMatrix> for DistanceMatrix {
    fn from(matrix: DenseDistanceMatrix) -> Self {
        Self::Dense(matrix)
    }
}
