//! Per-cluster timepoint bookkeeping for the overlap constraint.
//!
//! Each entity owns one row of counters, one column per timepoint. A row is
//! only meaningful while its entity is a cluster root; after a merge the
//! surviving root's row holds the elementwise sum of both clusters and the
//! absorbed root's row is never read again. Counters are summed rather than
//! OR-ed: a column above one means at least two merged sub-clusters were
//! observed at that timepoint.

use crate::error::{ClusteringError, Result};

/// Timepoints at which each entity was observed.
///
/// # Examples
/// ```
/// use roicluster_core::EntityTimepoints;
///
/// let table = EntityTimepoints::new(vec![vec![0, 2], vec![], vec![1]]);
/// assert_eq!(table.entity_count(), 3);
/// assert_eq!(table.timepoint_count()?, 3);
/// assert_eq!(table.timepoints(0), Some(&[0, 2][..]));
/// # Ok::<(), roicluster_core::ClusteringError>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntityTimepoints {
    observations: Vec<Vec<usize>>,
}

impl EntityTimepoints {
    /// Wraps one timepoint list per entity.
    #[must_use]
    pub fn new(observations: Vec<Vec<usize>>) -> Self {
        Self { observations }
    }

    /// Builds the table from `(entity, timepoint)` observations.
    ///
    /// Entities without observations get an empty list.
    ///
    /// # Errors
    /// Returns [`ClusteringError::OutOfRange`] when an observation names an
    /// entity `>= entity_count`.
    pub fn from_pairs(
        entity_count: usize,
        pairs: impl IntoIterator<Item = (usize, usize)>,
    ) -> Result<Self> {
        let mut observations = vec![Vec::new(); entity_count];
        for (entity, timepoint) in pairs {
            observations
                .get_mut(entity)
                .ok_or(ClusteringError::entity_out_of_range(entity, entity_count))?
                .push(timepoint);
        }
        Ok(Self { observations })
    }

    /// Number of entities covered by the table.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.observations.len()
    }

    /// Timepoints recorded for `entity`, or `None` when it is not covered.
    #[must_use]
    pub fn timepoints(&self, entity: usize) -> Option<&[usize]> {
        self.observations.get(entity).map(Vec::as_slice)
    }

    /// Implied column count: one past the largest recorded timepoint, or
    /// zero when nothing was observed.
    ///
    /// # Errors
    /// Returns [`ClusteringError::CapacityExceeded`] when the largest
    /// recorded timepoint is `usize::MAX`.
    pub fn timepoint_count(&self) -> Result<usize> {
        match self.observations.iter().flatten().max() {
            None => Ok(0),
            Some(&max) => max
                .checked_add(1)
                .ok_or(ClusteringError::CapacityExceeded {
                    entities: self.entity_count(),
                    timepoints: usize::MAX,
                }),
        }
    }
}

/// Row-per-entity counter matrix over timepoints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimepointMembership {
    timepoint_count: usize,
    counts: Vec<u32>,
}

impl TimepointMembership {
    /// Seeds one row per entity from `table`.
    ///
    /// A timepoint listed twice for the same entity still counts once. Every
    /// timepoint is checked before the arena is allocated.
    ///
    /// # Errors
    /// Returns [`ClusteringError::OutOfRange`] when `table` covers more than
    /// `entity_count` entities or records a timepoint `>= timepoint_count`,
    /// [`ClusteringError::DimensionMismatch`] when it covers fewer, and
    /// [`ClusteringError::CapacityExceeded`] when the
    /// `entity_count * timepoint_count` arena cannot be allocated.
    pub fn build(
        table: &EntityTimepoints,
        entity_count: usize,
        timepoint_count: usize,
    ) -> Result<Self> {
        let covered = table.entity_count();
        if covered > entity_count {
            return Err(ClusteringError::entity_out_of_range(
                covered - 1,
                entity_count,
            ));
        }
        if covered < entity_count {
            return Err(ClusteringError::DimensionMismatch {
                what: "timepoint table entities",
                left: covered,
                right: entity_count,
            });
        }

        if let Some(&timepoint) = table
            .observations
            .iter()
            .flatten()
            .find(|&&timepoint| timepoint >= timepoint_count)
        {
            return Err(ClusteringError::timepoint_out_of_range(
                timepoint,
                timepoint_count,
            ));
        }

        let mut counts = zeroed_arena(entity_count, timepoint_count)?;
        for (row, timepoints) in counts
            .chunks_exact_mut(timepoint_count.max(1))
            .zip(&table.observations)
        {
            for &timepoint in timepoints {
                row[timepoint] = 1;
            }
        }
        Ok(Self {
            timepoint_count,
            counts,
        })
    }

    /// Number of timepoint columns.
    #[must_use]
    #[rustfmt::skip]
    pub fn timepoint_count(&self) -> usize { self.timepoint_count }

    /// Row stored for `root`. Callers resolve `root` through the disjoint set
    /// first; rows of absorbed entities are stale.
    pub(crate) fn row(&self, root: usize) -> &[u32] {
        let start = root * self.timepoint_count;
        &self.counts[start..start + self.timepoint_count]
    }

    /// Overwrites `root`'s row with `merged`, which must be one row long.
    pub(crate) fn replace_row(&mut self, root: usize, merged: &[u32]) {
        let start = root * self.timepoint_count;
        self.counts[start..start + self.timepoint_count].copy_from_slice(merged);
    }
}

fn zeroed_arena(entity_count: usize, timepoint_count: usize) -> Result<Vec<u32>> {
    let exceeded = ClusteringError::CapacityExceeded {
        entities: entity_count,
        timepoints: timepoint_count,
    };
    let len = entity_count
        .checked_mul(timepoint_count)
        .ok_or_else(|| exceeded.clone())?;
    let mut counts = Vec::new();
    counts.try_reserve_exact(len).map_err(|_| exceeded)?;
    counts.resize(len, 0);
    Ok(counts)
}

/// Elementwise sum of two rows.
///
/// # Examples
/// ```
/// use roicluster_core::merged_row;
///
/// assert_eq!(merged_row(&[1, 0, 1], &[1, 1, 0]), vec![2, 1, 1]);
/// ```
#[must_use]
pub fn merged_row(left: &[u32], right: &[u32]) -> Vec<u32> {
    let mut merged = Vec::with_capacity(left.len());
    merge_rows_into(left, right, &mut merged);
    merged
}

/// Writes the elementwise sum of `left` and `right` into `out`, reusing its
/// allocation.
pub(crate) fn merge_rows_into(left: &[u32], right: &[u32], out: &mut Vec<u32>) {
    out.clear();
    out.extend(
        left.iter()
            .zip(right)
            .map(|(&a, &b)| a.saturating_add(b)),
    );
}

/// Fraction of occupied columns that more than one sub-cluster contributes
/// to.
///
/// An all-zero row has no occupied columns and therefore no collisions; its
/// ratio is `0.0`.
///
/// # Examples
/// ```
/// use roicluster_core::overlap_ratio;
///
/// assert_eq!(overlap_ratio(&[2, 1, 0, 1]), 1.0 / 3.0);
/// assert_eq!(overlap_ratio(&[0, 0]), 0.0);
/// ```
#[must_use]
pub fn overlap_ratio(row: &[u32]) -> f32 {
    let (colliding, occupied) = row
        .iter()
        .fold((0usize, 0usize), |(colliding, occupied), &count| {
            (
                colliding + usize::from(count > 1),
                occupied + usize::from(count > 0),
            )
        });
    if occupied == 0 {
        return 0.0;
    }
    colliding as f32 / occupied as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case::disjoint(vec![1, 0, 1, 0], vec![0, 1, 0, 1], 0.0)]
    #[case::identical_single(vec![0, 1, 0], vec![0, 1, 0], 1.0)]
    #[case::empty(vec![0, 0, 0], vec![0, 0, 0], 0.0)]
    #[case::half(vec![1, 1, 0, 0], vec![1, 0, 1, 0], 1.0 / 3.0)]
    #[case::one_side_empty(vec![0, 0], vec![1, 1], 0.0)]
    fn overlap_of_merged_rows(
        #[case] left: Vec<u32>,
        #[case] right: Vec<u32>,
        #[case] expected: f32,
    ) {
        let merged = merged_row(&left, &right);
        assert_eq!(overlap_ratio(&merged), expected);
    }

    #[test]
    fn merged_row_sums_instead_of_or() {
        assert_eq!(merged_row(&[2, 1, 0], &[1, 1, 0]), vec![3, 2, 0]);
    }

    #[test]
    fn build_seeds_one_row_per_entity() {
        let table = EntityTimepoints::new(vec![vec![0, 2, 2], vec![], vec![1]]);
        let membership = TimepointMembership::build(&table, 3, 3).expect("valid table");
        assert_eq!(membership.row(0), &[1, 0, 1]);
        assert_eq!(membership.row(1), &[0, 0, 0]);
        assert_eq!(membership.row(2), &[0, 1, 0]);
    }

    #[test]
    fn build_rejects_timepoints_past_bound() {
        let table = EntityTimepoints::new(vec![vec![0], vec![3]]);
        let err = TimepointMembership::build(&table, 2, 3).expect_err("timepoint 3 >= 3");
        assert_eq!(err, ClusteringError::timepoint_out_of_range(3, 3));
    }

    #[test]
    fn build_checks_timepoints_before_allocating() {
        let table = EntityTimepoints::new(vec![vec![0], vec![usize::MAX]]);
        let err = TimepointMembership::build(&table, 2, usize::MAX).expect_err("past bound");
        assert_eq!(
            err,
            ClusteringError::timepoint_out_of_range(usize::MAX, usize::MAX)
        );
    }

    #[rstest]
    #[case::product_overflows(3, usize::MAX / 2)]
    #[case::bytes_overflow(2, usize::MAX / 2)]
    #[case::single_row_overflows(1, usize::MAX)]
    fn build_reports_unallocatable_arenas(#[case] entities: usize, #[case] timepoints: usize) {
        let table = EntityTimepoints::new(vec![vec![0]; entities]);
        let err = TimepointMembership::build(&table, entities, timepoints)
            .expect_err("arena is too large");
        assert_eq!(
            err,
            ClusteringError::CapacityExceeded {
                entities,
                timepoints,
            }
        );
    }

    #[test]
    fn implied_count_past_usize_is_an_error() {
        let table = EntityTimepoints::new(vec![vec![0], vec![usize::MAX]]);
        let err = table.timepoint_count().expect_err("count overflows");
        assert_eq!(err.code(), crate::ClusteringErrorCode::CapacityExceeded);
    }

    #[test]
    fn build_rejects_tables_covering_extra_entities() {
        let table = EntityTimepoints::new(vec![vec![0], vec![0], vec![0]]);
        let err = TimepointMembership::build(&table, 2, 1).expect_err("three rows for two");
        assert_eq!(err, ClusteringError::entity_out_of_range(2, 2));
    }

    #[test]
    fn build_rejects_tables_missing_entities() {
        let table = EntityTimepoints::new(vec![vec![0]]);
        let err = TimepointMembership::build(&table, 2, 1).expect_err("one row for two");
        assert!(matches!(err, ClusteringError::DimensionMismatch { .. }));
    }

    #[test]
    fn replace_row_only_touches_target() {
        let table = EntityTimepoints::new(vec![vec![0], vec![0]]);
        let mut membership = TimepointMembership::build(&table, 2, 2).expect("valid table");
        let merged = merged_row(membership.row(0), membership.row(1));
        membership.replace_row(1, &merged);
        assert_eq!(membership.row(1), &[2, 0]);
        assert_eq!(membership.row(0), &[1, 0]);
    }

    #[test]
    fn from_pairs_groups_observations() {
        let table = EntityTimepoints::from_pairs(3, [(2, 4), (0, 1), (2, 0)]).expect("in range");
        assert_eq!(table.timepoints(2), Some(&[4, 0][..]));
        assert_eq!(table.timepoints(1), Some(&[][..]));
        assert_eq!(table.timepoint_count(), Ok(5));
        assert!(EntityTimepoints::from_pairs(1, [(1, 0)]).is_err());
    }

    #[test]
    fn timepoint_count_is_zero_without_observations() {
        let table = EntityTimepoints::new(vec![vec![], vec![]]);
        assert_eq!(table.timepoint_count(), Ok(0));
        let membership = TimepointMembership::build(&table, 2, 0).expect("valid table");
        assert!(membership.row(1).is_empty());
    }
}
