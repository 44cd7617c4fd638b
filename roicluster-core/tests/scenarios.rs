//! End-to-end clustering runs through the public API.

use roicluster_core::{
    ClusteringBuilder, ClusteringError, DenseDistanceMatrix, DistanceMatrix, EntityTimepoints,
    SparseDistanceMatrix, cluster,
};
use roicluster_test_support::tracing::capture;
use rstest::{fixture, rstest};
use tracing::Level;

fn sparse(entity_count: usize, triplets: &[(usize, usize, f32)]) -> DistanceMatrix {
    SparseDistanceMatrix::from_triplets(entity_count, entity_count, triplets.iter().copied())
        .expect("triplets are in range")
        .into()
}

/// Four entities, each seen at its own timepoint.
#[fixture]
fn disjoint_observations() -> EntityTimepoints {
    EntityTimepoints::from_pairs(4, [(0, 0), (1, 1), (2, 2), (3, 3)])
        .expect("entities are in range")
}

#[rstest]
fn height_threshold_stops_before_long_edges(disjoint_observations: EntityTimepoints) {
    let matrix = sparse(4, &[(0, 1, 1.0), (2, 3, 2.0), (0, 2, 5.0)]);
    let outcome = ClusteringBuilder::new()
        .with_overlap_threshold(1.0)
        .with_height_threshold(3.0)
        .build()
        .expect("thresholds are valid")
        .run(&matrix, &disjoint_observations)
        .expect("inputs are valid");

    let assignment = outcome.assignment();
    assert_eq!(assignment.members(), vec![vec![0, 1], vec![2, 3]]);
    assert_eq!(assignment.root_of(0), assignment.root_of(1));
    assert_ne!(assignment.root_of(1), assignment.root_of(2));
    assert_eq!(outcome.stats().halted_at, Some(5.0));
    assert_eq!(outcome.stats().accepted, 2);
    assert_eq!(outcome.stats().examined, 3);
}

#[rstest]
fn shared_timepoint_blocks_every_merge() {
    let timepoints = EntityTimepoints::new(vec![vec![0], vec![0], vec![0]]);
    let matrix = sparse(3, &[(0, 1, 1.0), (0, 2, 1.5), (1, 2, 2.0)]);
    let outcome = ClusteringBuilder::new()
        .with_overlap_threshold(0.0)
        .build()
        .expect("thresholds are valid")
        .run(&matrix, &timepoints)
        .expect("inputs are valid");

    assert_eq!(outcome.assignment().cluster_count(), 3);
    assert_eq!(outcome.assignment().roots(), &[0, 1, 2]);
    assert_eq!(outcome.stats().rejected_overlap, 3);
}

#[rstest]
fn pair_match_limits_each_entity_to_one_partner() {
    let timepoints = EntityTimepoints::new(vec![vec![0], vec![1], vec![2]]);
    let matrix = sparse(3, &[(0, 1, 1.0), (0, 2, 2.0), (1, 2, 1.5)]);
    let outcome = ClusteringBuilder::new()
        .with_overlap_threshold(1.0)
        .with_pair_match(true)
        .build()
        .expect("thresholds are valid")
        .run(&matrix, &timepoints)
        .expect("inputs are valid");

    assert_eq!(outcome.assignment().members(), vec![vec![0, 1], vec![2]]);
    assert_eq!(outcome.pair_flags(), Some(&[true, true, false][..]));
    assert_eq!(outcome.stats().skipped_pair_match, 2);
}

#[rstest]
fn lower_triangle_entries_are_ignored(disjoint_observations: EntityTimepoints) {
    let matrix = sparse(4, &[(1, 0, 1.0), (3, 2, 1.0), (2, 2, 0.5)]);
    let assignment = cluster(&matrix, &disjoint_observations, 0.0, f32::INFINITY, true, false)
        .expect("inputs are valid");
    assert_eq!(assignment.cluster_count(), 4);
}

#[rstest]
fn dense_and_sparse_inputs_agree(disjoint_observations: EntityTimepoints) {
    let dense = DenseDistanceMatrix::from_rows(vec![
        vec![0.0, 1.0, 6.0, 0.0],
        vec![0.0, 0.0, 3.0, 0.0],
        vec![0.0, 0.0, 0.0, 2.0],
        vec![0.0, 0.0, 0.0, 0.0],
    ])
    .expect("rows are rectangular");
    let sparse = dense.to_sparse();
    let from_dense = cluster(&dense.into(), &disjoint_observations, 0.0, 4.0, false, false)
        .expect("inputs are valid");
    let from_sparse = cluster(&sparse.into(), &disjoint_observations, 0.0, 4.0, true, false)
        .expect("inputs are valid");
    assert_eq!(from_dense, from_sparse);
    assert_eq!(from_dense.cluster_count(), 1);
}

#[rstest]
fn run_is_traced(disjoint_observations: EntityTimepoints) {
    let matrix = sparse(4, &[(0, 1, 1.0), (2, 3, 2.0), (0, 2, 5.0)]);
    let engine = ClusteringBuilder::new()
        .with_overlap_threshold(1.0)
        .with_height_threshold(3.0)
        .build()
        .expect("thresholds are valid");
    let (result, layer) = capture(|| engine.run(&matrix, &disjoint_observations));
    result.expect("inputs are valid");

    let span = layer.span("core.cluster").expect("run span recorded");
    assert_eq!(span.field("entities"), Some("4"));
    assert_eq!(span.field("pair_match"), Some("false"));

    let halted = layer
        .event("height threshold reached; remaining edges skipped")
        .expect("halt is logged");
    assert_eq!(halted.level, Level::INFO);
    assert_eq!(halted.field("distance"), Some("5"));

    let completed = layer
        .event("clustering completed")
        .expect("completion is logged");
    assert_eq!(completed.field("clusters"), Some("2"));
    assert_eq!(completed.field("accepted"), Some("2"));
}

#[rstest]
fn empty_candidate_set_is_warned(disjoint_observations: EntityTimepoints) {
    let matrix = sparse(4, &[]);
    let engine = ClusteringBuilder::new().build().expect("defaults are valid");
    let (result, layer) = capture(|| engine.run(&matrix, &disjoint_observations));
    let outcome = result.expect("inputs are valid");
    assert_eq!(outcome.assignment().cluster_count(), 4);

    let warning = layer
        .event("distance matrix has no candidate edges")
        .expect("warning is logged");
    assert_eq!(warning.level, Level::WARN);
}

#[rstest]
fn failed_run_records_the_error(disjoint_observations: EntityTimepoints) {
    let matrix: DistanceMatrix = SparseDistanceMatrix::from_triplets(4, 3, std::iter::empty())
        .expect("no entries to check")
        .into();
    let engine = ClusteringBuilder::new().build().expect("defaults are valid");
    let (result, layer) = capture(|| engine.run(&matrix, &disjoint_observations));
    let err = result.expect_err("matrix is not square");
    assert!(matches!(err, ClusteringError::DimensionMismatch { .. }));

    assert!(layer.span("core.cluster").is_some());
    let logged = layer
        .events()
        .into_iter()
        .find(|event| event.level == Level::ERROR)
        .expect("error is logged");
    assert_eq!(logged.field("error"), Some(err.to_string().as_str()));
}
