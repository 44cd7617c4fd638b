//! Constrained single-linkage merge loop.
//!
//! Candidate edges arrive in ascending distance order. For each edge the
//! engine resolves both endpoints to their current roots, refuses the merge
//! if it would push the overlap ratio past the threshold, and otherwise
//! joins the clusters and stores their summed timepoint row under the
//! surviving root. The first edge longer than the height threshold ends the
//! run; refused edges are never revisited.
//!
//! All validation happens before the loop starts. Once it starts, the loop
//! cannot fail.

use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, trace, warn};

use crate::{
    builder::ClusteringBuilder,
    edges::{DistanceEdge, EdgeSequencer},
    error::{ClusteringError, Result},
    matrix::DistanceMatrix,
    membership::{EntityTimepoints, TimepointMembership, merge_rows_into, overlap_ratio},
    result::{ClusterAssignment, ClusteringOutcome, MergeStats},
    union_find::DisjointSet,
};

/// Runs constrained clustering with a validated configuration.
///
/// # Examples
/// ```
/// use roicluster_core::{ClusteringBuilder, EntityTimepoints, SparseDistanceMatrix};
///
/// let matrix = SparseDistanceMatrix::from_triplets(3, 3, [(0, 1, 1.0), (1, 2, 2.0)])?;
/// let timepoints = EntityTimepoints::new(vec![vec![0], vec![1], vec![1]]);
/// let engine = ClusteringBuilder::new().with_overlap_threshold(0.0).build()?;
/// let outcome = engine.run(&matrix.into(), &timepoints)?;
///
/// // 1 and 2 share timepoint 1, so the second merge is refused.
/// assert_eq!(outcome.assignment().cluster_count(), 2);
/// assert_eq!(outcome.stats().rejected_overlap, 1);
/// # Ok::<(), roicluster_core::ClusteringError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ClusteringEngine {
    overlap_threshold: f32,
    height_threshold: f32,
    use_sparse_representation: bool,
    pair_match: bool,
    timepoint_count: Option<usize>,
}

impl ClusteringEngine {
    pub(crate) fn new(
        overlap_threshold: f32,
        height_threshold: f32,
        use_sparse_representation: bool,
        pair_match: bool,
        timepoint_count: Option<usize>,
    ) -> Self {
        Self {
            overlap_threshold,
            height_threshold,
            use_sparse_representation,
            pair_match,
            timepoint_count,
        }
    }

    /// Largest tolerated overlap ratio.
    #[must_use]
    #[rustfmt::skip]
    pub fn overlap_threshold(&self) -> f32 { self.overlap_threshold }

    /// Largest distance at which merges are still considered.
    #[must_use]
    #[rustfmt::skip]
    pub fn height_threshold(&self) -> f32 { self.height_threshold }

    /// Whether dense input is compacted before sequencing.
    #[must_use]
    #[rustfmt::skip]
    pub fn use_sparse_representation(&self) -> bool { self.use_sparse_representation }

    /// Whether every entity is limited to one accepted merge.
    #[must_use]
    #[rustfmt::skip]
    pub fn pair_match(&self) -> bool { self.pair_match }

    /// Clusters the entities of `matrix`.
    ///
    /// # Errors
    /// Returns [`ClusteringError::DimensionMismatch`] when the matrix is not
    /// square or `timepoints` covers fewer entities,
    /// [`ClusteringError::InvalidSize`] when the matrix is empty, and
    /// [`ClusteringError::OutOfRange`] when `timepoints` covers extra
    /// entities or records a timepoint beyond the configured column count,
    /// and [`ClusteringError::CapacityExceeded`] when the timepoint arena is
    /// too large to allocate.
    #[instrument(
        name = "core.cluster",
        err,
        skip(self, matrix, timepoints),
        fields(
            entities = matrix.rows(),
            overlap_threshold = self.overlap_threshold,
            height_threshold = self.height_threshold,
            pair_match = self.pair_match,
        ),
    )]
    pub fn run(
        &self,
        matrix: &DistanceMatrix,
        timepoints: &EntityTimepoints,
    ) -> Result<ClusteringOutcome> {
        let started = Instant::now();
        let entity_count = matrix.square_dimension()?;
        if entity_count == 0 {
            return Err(ClusteringError::InvalidSize { got: entity_count });
        }
        let timepoint_count = match self.timepoint_count {
            Some(count) => count,
            None => timepoints.timepoint_count()?,
        };
        let membership = TimepointMembership::build(timepoints, entity_count, timepoint_count)?;
        let sequencer = self.sequencer(matrix)?;
        let forest = DisjointSet::new(entity_count)?;

        if sequencer.candidate_count() == 0 {
            warn!(entities = entity_count, "distance matrix has no candidate edges");
        }

        let mut state = MergeState::new(forest, membership, self.pair_match);
        state.stats.candidates = sequencer.candidate_count();
        for edge in sequencer.into_sequence() {
            state.stats.examined += 1;
            if let MergeDecision::Halt = self.offer(&mut state, &edge) {
                info!(
                    distance = edge.distance(),
                    height_threshold = self.height_threshold,
                    "height threshold reached; remaining edges skipped"
                );
                break;
            }
        }

        let outcome = state.finish();
        record_run(outcome.stats(), started.elapsed());
        info!(
            clusters = outcome.assignment().cluster_count(),
            accepted = outcome.stats().accepted,
            rejected_overlap = outcome.stats().rejected_overlap,
            examined = outcome.stats().examined,
            "clustering completed"
        );
        Ok(outcome)
    }

    fn sequencer(&self, matrix: &DistanceMatrix) -> Result<EdgeSequencer> {
        match matrix {
            DistanceMatrix::Dense(dense) if self.use_sparse_representation => {
                EdgeSequencer::from_sparse(&dense.to_sparse())
            }
            other => EdgeSequencer::new(other),
        }
    }

    fn offer(&self, state: &mut MergeState, edge: &DistanceEdge) -> MergeDecision {
        if edge.distance() > self.height_threshold {
            state.stats.halted_at = Some(edge.distance());
            return MergeDecision::Halt;
        }

        let (source, target) = (edge.source(), edge.target());
        let left = state.forest.find_root(source);
        let right = state.forest.find_root(target);
        if left == right {
            state.stats.skipped_joined += 1;
            return MergeDecision::Joined;
        }

        if let Some(flags) = &state.pair_flags {
            if flags[source] || flags[target] {
                state.stats.skipped_pair_match += 1;
                return MergeDecision::PairTaken;
            }
        }

        merge_rows_into(
            state.membership.row(left),
            state.membership.row(right),
            &mut state.scratch,
        );
        let ratio = overlap_ratio(&state.scratch);
        if ratio > self.overlap_threshold {
            state.stats.rejected_overlap += 1;
            debug!(
                source,
                target,
                distance = edge.distance(),
                ratio,
                "merge refused: overlap above threshold"
            );
            return MergeDecision::Rejected;
        }

        let root = state.forest.union_roots(left, right);
        state.membership.replace_row(root, &state.scratch);
        if let Some(flags) = &mut state.pair_flags {
            flags[source] = true;
            flags[target] = true;
        }
        state.stats.accepted += 1;
        trace!(source, target, root, distance = edge.distance(), ratio, "merge accepted");
        MergeDecision::Accepted
    }
}

/// What the loop did with one edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MergeDecision {
    Halt,
    Joined,
    PairTaken,
    Rejected,
    Accepted,
}

/// Mutable state owned by a single run.
struct MergeState {
    forest: DisjointSet,
    membership: TimepointMembership,
    pair_flags: Option<Vec<bool>>,
    scratch: Vec<u32>,
    stats: MergeStats,
}

impl MergeState {
    fn new(forest: DisjointSet, membership: TimepointMembership, pair_match: bool) -> Self {
        let pair_flags = pair_match.then(|| vec![false; forest.len()]);
        let scratch = Vec::with_capacity(membership.timepoint_count());
        Self {
            forest,
            membership,
            pair_flags,
            scratch,
            stats: MergeStats::default(),
        }
    }

    fn finish(mut self) -> ClusteringOutcome {
        let assignment = ClusterAssignment::from_disjoint_set(&mut self.forest);
        ClusteringOutcome::new(assignment, self.stats, self.pair_flags)
    }
}

#[cfg(feature = "metrics")]
fn record_run(stats: &MergeStats, elapsed: Duration) {
    metrics::counter!("clustering_edges_examined").increment(stats.examined as u64);
    metrics::counter!("clustering_merges_accepted").increment(stats.accepted as u64);
    metrics::counter!("clustering_merges_rejected_overlap")
        .increment(stats.rejected_overlap as u64);
    metrics::histogram!("clustering_run_seconds").record(elapsed.as_secs_f64());
}

#[cfg(not(feature = "metrics"))]
fn record_run(_stats: &MergeStats, _elapsed: Duration) {}

/// Clusters `matrix` in one call.
///
/// Equivalent to configuring a [`ClusteringBuilder`] with the given values
/// and keeping only the assignment.
///
/// # Errors
/// Returns [`ClusteringError::InvalidThreshold`] for out-of-range
/// thresholds, plus every error [`ClusteringEngine::run`] can return.
///
/// # Examples
/// ```
/// use roicluster_core::{EntityTimepoints, SparseDistanceMatrix, cluster};
///
/// let matrix = SparseDistanceMatrix::from_triplets(2, 2, [(0, 1, 1.0)])?;
/// let timepoints = EntityTimepoints::new(vec![vec![0], vec![1]]);
/// let assignment = cluster(&matrix.into(), &timepoints, 0.0, 2.0, true, false)?;
/// assert_eq!(assignment.cluster_count(), 1);
/// # Ok::<(), roicluster_core::ClusteringError>(())
/// ```
pub fn cluster(
    matrix: &DistanceMatrix,
    timepoints: &EntityTimepoints,
    overlap_threshold: f32,
    height_threshold: f32,
    use_sparse_representation: bool,
    pair_match: bool,
) -> Result<ClusterAssignment> {
    let engine = ClusteringBuilder::new()
        .with_overlap_threshold(overlap_threshold)
        .with_height_threshold(height_threshold)
        .with_sparse_representation(use_sparse_representation)
        .with_pair_match(pair_match)
        .build()?;
    Ok(engine.run(matrix, timepoints)?.into_assignment())
}

#[cfg(test)]
mod property;
