//! Result types for clustering runs.
//!
//! A [`ClusterAssignment`] records each entity's final root and a contiguous
//! [`ClusterId`] label; [`ClusteringOutcome`] adds the run statistics and,
//! in pair-match mode, the participation flags.

use std::collections::HashMap;

use crate::union_find::DisjointSet;

/// Identifier assigned to a cluster.
///
/// # Examples
/// ```
/// use roicluster_core::ClusterId;
///
/// let id = ClusterId::new(4);
/// assert_eq!(id.get(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterId(u64);

impl ClusterId {
    /// Creates a new cluster identifier.
    #[rustfmt::skip]
    #[must_use]
    pub fn new(id: u64) -> Self { Self(id) }

    /// Returns the underlying numeric identifier.
    #[rustfmt::skip]
    #[must_use]
    pub fn get(self) -> u64 { self.0 }
}

/// Cluster membership of every entity after a run.
///
/// Labels are contiguous from zero and numbered in order of each cluster's
/// first member, so they are stable for a given input.
///
/// # Examples
/// ```
/// use roicluster_core::{ClusterAssignment, DisjointSet};
///
/// let mut set = DisjointSet::new(3)?;
/// set.union(2, 1)?;
/// let assignment = ClusterAssignment::from_disjoint_set(&mut set);
/// assert_eq!(assignment.cluster_count(), 2);
/// assert_eq!(assignment.label_of(1), assignment.label_of(2));
/// assert_eq!(assignment.members(), vec![vec![0], vec![1, 2]]);
/// # Ok::<(), roicluster_core::ClusteringError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterAssignment {
    roots: Vec<usize>,
    labels: Vec<ClusterId>,
    cluster_count: usize,
}

impl ClusterAssignment {
    /// Resolves every entity in `set` and labels the resulting clusters.
    pub fn from_disjoint_set(set: &mut DisjointSet) -> Self {
        let roots = set.roots();
        let mut ids: HashMap<usize, ClusterId> = HashMap::with_capacity(set.component_count());
        let labels = roots
            .iter()
            .map(|&root| {
                let next = ClusterId::new(ids.len() as u64);
                *ids.entry(root).or_insert(next)
            })
            .collect();
        Self {
            roots,
            labels,
            cluster_count: ids.len(),
        }
    }

    /// Number of entities.
    #[must_use]
    #[rustfmt::skip]
    pub fn len(&self) -> usize { self.roots.len() }

    /// Returns `true` when no entities are assigned.
    #[must_use]
    #[rustfmt::skip]
    pub fn is_empty(&self) -> bool { self.roots.is_empty() }

    /// Number of distinct clusters.
    #[must_use]
    #[rustfmt::skip]
    pub fn cluster_count(&self) -> usize { self.cluster_count }

    /// Root entity of every entity's cluster, in entity order.
    #[must_use]
    #[rustfmt::skip]
    pub fn roots(&self) -> &[usize] { &self.roots }

    /// Contiguous cluster label of every entity, in entity order.
    #[must_use]
    #[rustfmt::skip]
    pub fn labels(&self) -> &[ClusterId] { &self.labels }

    /// Root of `entity`'s cluster, or `None` for an unknown entity.
    #[must_use]
    pub fn root_of(&self, entity: usize) -> Option<usize> {
        self.roots.get(entity).copied()
    }

    /// Label of `entity`'s cluster, or `None` for an unknown entity.
    #[must_use]
    pub fn label_of(&self, entity: usize) -> Option<ClusterId> {
        self.labels.get(entity).copied()
    }

    /// Entities grouped by label, each group in ascending entity order.
    #[must_use]
    pub fn members(&self) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); self.cluster_count];
        for (entity, label) in self.labels.iter().enumerate() {
            if let Some(group) = groups.get_mut(label.get() as usize) {
                group.push(entity);
            }
        }
        groups
    }

    /// Size of each cluster, indexed by label.
    #[must_use]
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.cluster_count];
        for label in &self.labels {
            if let Some(size) = sizes.get_mut(label.get() as usize) {
                *size += 1;
            }
        }
        sizes
    }
}

/// Counters describing how the merge loop treated the candidate edges.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MergeStats {
    /// Candidate edges produced by the sequencer.
    pub candidates: usize,
    /// Edges popped from the sequence, including the one that halted it.
    pub examined: usize,
    /// Merges performed.
    pub accepted: usize,
    /// Merges refused because the overlap ratio exceeded the threshold.
    pub rejected_overlap: usize,
    /// Edges whose endpoints already shared a cluster.
    pub skipped_joined: usize,
    /// Edges skipped because an endpoint had already merged in pair-match
    /// mode.
    pub skipped_pair_match: usize,
    /// Distance of the first edge above the height threshold, if the loop
    /// halted early.
    pub halted_at: Option<f32>,
}

/// Everything a clustering run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusteringOutcome {
    assignment: ClusterAssignment,
    stats: MergeStats,
    pair_flags: Option<Vec<bool>>,
}

impl ClusteringOutcome {
    pub(crate) fn new(
        assignment: ClusterAssignment,
        stats: MergeStats,
        pair_flags: Option<Vec<bool>>,
    ) -> Self {
        Self {
            assignment,
            stats,
            pair_flags,
        }
    }

    /// Final cluster assignment.
    #[must_use]
    #[rustfmt::skip]
    pub fn assignment(&self) -> &ClusterAssignment { &self.assignment }

    /// Merge loop counters.
    #[must_use]
    #[rustfmt::skip]
    pub fn stats(&self) -> &MergeStats { &self.stats }

    /// Per-entity "already merged" flags; `None` outside pair-match mode.
    #[must_use]
    pub fn pair_flags(&self) -> Option<&[bool]> {
        self.pair_flags.as_deref()
    }

    /// Discards the statistics and returns the assignment.
    #[must_use]
    pub fn into_assignment(self) -> ClusterAssignment {
        self.assignment
    }
}
