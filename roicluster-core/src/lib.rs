//! Constrained single-linkage clustering of regions observed over time.
//!
//! Entities are merged in ascending order of pairwise distance. A merge is
//! refused when the combined cluster would contain too many sub-clusters
//! observed at the same timepoint, and the whole run stops at the first
//! distance above the height threshold.
//!
//! # Metrics
//!
//! When the `metrics` feature is enabled each run emits:
//!
//! - `clustering_edges_examined` (counter)
//! - `clustering_merges_accepted` (counter)
//! - `clustering_merges_rejected_overlap` (counter)
//! - `clustering_run_seconds` (histogram, seconds)
#![cfg_attr(docsrs, feature(doc_cfg))]

mod builder;
mod edges;
mod engine;
mod error;
mod matrix;
mod membership;
mod result;
mod union_find;

#[cfg(test)]
mod test_utils;

pub use crate::{
    builder::ClusteringBuilder,
    edges::{DistanceEdge, EdgeSequence, EdgeSequencer},
    engine::{ClusteringEngine, cluster},
    error::{ClusteringError, ClusteringErrorCode, IndexKind, Result},
    matrix::{DenseDistanceMatrix, DistanceEntry, DistanceMatrix, SparseDistanceMatrix},
    membership::{EntityTimepoints, TimepointMembership, merged_row, overlap_ratio},
    result::{ClusterAssignment, ClusterId, ClusteringOutcome, MergeStats},
    union_find::DisjointSet,
};
