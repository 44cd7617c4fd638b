//! Ascending-distance enumeration of candidate merges.
//!
//! Only stored upper-triangle entries (`row < col`) become candidates. The
//! candidates are heapified in linear time and popped lazily, so a run that
//! halts at the height threshold never pays to order the edges it skips.
//! Equal distances pop in storage order.

use std::{cmp::Ordering, cmp::Reverse, collections::BinaryHeap, iter::FusedIterator};

use crate::{
    error::Result,
    matrix::{DenseDistanceMatrix, DistanceMatrix, SparseDistanceMatrix, require_square},
};

/// A candidate merge in canonical form (`source < target`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistanceEdge {
    source: usize,
    target: usize,
    distance: f32,
    sequence: u64,
}

impl DistanceEdge {
    /// Returns the smaller endpoint.
    #[must_use]
    #[rustfmt::skip]
    pub fn source(&self) -> usize { self.source }

    /// Returns the larger endpoint.
    #[must_use]
    #[rustfmt::skip]
    pub fn target(&self) -> usize { self.target }

    /// Returns the distance between the endpoints.
    #[must_use]
    #[rustfmt::skip]
    pub fn distance(&self) -> f32 { self.distance }

    /// Returns the storage position used to break distance ties.
    #[must_use]
    #[rustfmt::skip]
    pub fn sequence(&self) -> u64 { self.sequence }
}

impl Eq for DistanceEdge {}

impl Ord for DistanceEdge {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

impl PartialOrd for DistanceEdge {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Collects the candidate edges of a square distance matrix.
///
/// # Examples
/// ```
/// use roicluster_core::{EdgeSequencer, SparseDistanceMatrix};
///
/// let matrix = SparseDistanceMatrix::from_triplets(
///     3,
///     3,
///     [(0, 2, 3.0), (2, 0, 3.0), (0, 1, 1.0), (1, 1, 0.5)],
/// )?;
/// let sequencer = EdgeSequencer::from_sparse(&matrix)?;
/// assert_eq!(sequencer.candidate_count(), 2);
/// let pairs: Vec<_> = sequencer
///     .into_sequence()
///     .map(|edge| (edge.source(), edge.target()))
///     .collect();
/// assert_eq!(pairs, vec![(0, 1), (0, 2)]);
/// # Ok::<(), roicluster_core::ClusteringError>(())
/// ```
#[derive(Clone, Debug)]
pub struct EdgeSequencer {
    entity_count: usize,
    candidates: Vec<DistanceEdge>,
}

impl EdgeSequencer {
    /// Collects candidates from either matrix representation.
    ///
    /// # Errors
    /// Returns [`crate::ClusteringError::DimensionMismatch`] when the matrix
    /// is not square.
    pub fn new(matrix: &DistanceMatrix) -> Result<Self> {
        match matrix {
            DistanceMatrix::Sparse(sparse) => Self::from_sparse(sparse),
            DistanceMatrix::Dense(dense) => Self::from_dense(dense),
        }
    }

    /// Collects the stored upper-triangle entries of a sparse matrix.
    ///
    /// # Errors
    /// Returns [`crate::ClusteringError::DimensionMismatch`] when the matrix
    /// is not square.
    pub fn from_sparse(matrix: &SparseDistanceMatrix) -> Result<Self> {
        let entity_count = require_square(matrix.rows(), matrix.cols())?;
        let candidates = matrix
            .entries()
            .iter()
            .zip(0u64..)
            .filter(|(entry, _)| entry.row() < entry.col())
            .map(|(entry, sequence)| DistanceEdge {
                source: entry.row(),
                target: entry.col(),
                distance: entry.distance(),
                sequence,
            })
            .collect();
        Ok(Self {
            entity_count,
            candidates,
        })
    }

    /// Scans the upper triangle of a dense matrix, skipping zeros.
    ///
    /// # Errors
    /// Returns [`crate::ClusteringError::DimensionMismatch`] when the matrix
    /// is not square.
    pub fn from_dense(matrix: &DenseDistanceMatrix) -> Result<Self> {
        let entity_count = require_square(matrix.rows(), matrix.cols())?;
        let candidates = matrix
            .nonzero_entries()
            .zip(0u64..)
            .filter(|((row, col, _), _)| row < col)
            .map(|((source, target, distance), sequence)| DistanceEdge {
                source,
                target,
                distance,
                sequence,
            })
            .collect();
        Ok(Self {
            entity_count,
            candidates,
        })
    }

    /// Number of entities (the matrix dimension).
    #[must_use]
    #[rustfmt::skip]
    pub fn entity_count(&self) -> usize { self.entity_count }

    /// Number of candidate edges the sequence will yield.
    #[must_use]
    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// Consumes the sequencer, returning the one-shot ascending sequence.
    #[must_use]
    pub fn into_sequence(self) -> EdgeSequence {
        EdgeSequence {
            heap: self.candidates.into_iter().map(Reverse).collect(),
        }
    }
}

/// Lazy ascending iterator over candidate edges.
#[derive(Clone, Debug)]
pub struct EdgeSequence {
    heap: BinaryHeap<Reverse<DistanceEdge>>,
}

impl Iterator for EdgeSequence {
    type Item = DistanceEdge;

    fn next(&mut self) -> Option<Self::Item> {
        self.heap.pop().map(|Reverse(edge)| edge)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.heap.len(), Some(self.heap.len()))
    }
}

impl ExactSizeIterator for EdgeSequence {}

impl FusedIterator for EdgeSequence {}
