//! Builder utilities for configuring clustering runs.
//!
//! Validates thresholds once, before any [`ClusteringEngine`] exists, so a
//! constructed engine always holds a usable configuration.

use crate::{
    engine::ClusteringEngine,
    error::{ClusteringError, Result},
};

/// Configures and constructs [`ClusteringEngine`] instances.
///
/// # Examples
/// ```
/// use roicluster_core::ClusteringBuilder;
///
/// let engine = ClusteringBuilder::new()
///     .with_overlap_threshold(0.25)
///     .with_height_threshold(3.0)
///     .with_pair_match(true)
///     .build()
///     .expect("builder configuration is valid");
/// assert_eq!(engine.overlap_threshold(), 0.25);
/// assert_eq!(engine.height_threshold(), 3.0);
/// assert!(engine.pair_match());
/// ```
#[derive(Debug, Clone)]
pub struct ClusteringBuilder {
    overlap_threshold: f32,
    height_threshold: f32,
    use_sparse_representation: bool,
    pair_match: bool,
    timepoint_count: Option<usize>,
}

impl Default for ClusteringBuilder {
    fn default() -> Self {
        Self {
            overlap_threshold: 0.0,
            height_threshold: f32::INFINITY,
            use_sparse_representation: true,
            pair_match: false,
            timepoint_count: None,
        }
    }
}

impl ClusteringBuilder {
    /// Creates a builder populated with default parameters: no tolerated
    /// overlap, no height limit, sparse representation, pair-match off.
    ///
    /// # Examples
    /// ```
    /// use roicluster_core::ClusteringBuilder;
    ///
    /// let builder = ClusteringBuilder::new();
    /// assert_eq!(builder.overlap_threshold(), 0.0);
    /// assert!(builder.height_threshold().is_infinite());
    /// assert!(builder.use_sparse_representation());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the largest tolerated overlap ratio, in `[0, 1]`.
    #[must_use]
    pub fn with_overlap_threshold(mut self, threshold: f32) -> Self {
        self.overlap_threshold = threshold;
        self
    }

    /// Returns the configured overlap threshold.
    #[must_use]
    #[rustfmt::skip]
    pub fn overlap_threshold(&self) -> f32 { self.overlap_threshold }

    /// Sets the largest distance at which merges are still considered.
    #[must_use]
    pub fn with_height_threshold(mut self, threshold: f32) -> Self {
        self.height_threshold = threshold;
        self
    }

    /// Returns the configured height threshold.
    #[must_use]
    #[rustfmt::skip]
    pub fn height_threshold(&self) -> f32 { self.height_threshold }

    /// Chooses whether dense input is compacted to its non-zero entries
    /// before sequencing. Sparse input is unaffected.
    #[must_use]
    pub fn with_sparse_representation(mut self, enabled: bool) -> Self {
        self.use_sparse_representation = enabled;
        self
    }

    /// Returns whether dense input is compacted before sequencing.
    #[must_use]
    #[rustfmt::skip]
    pub fn use_sparse_representation(&self) -> bool { self.use_sparse_representation }

    /// Restricts every entity to at most one accepted merge.
    #[must_use]
    pub fn with_pair_match(mut self, enabled: bool) -> Self {
        self.pair_match = enabled;
        self
    }

    /// Returns whether pair-match mode is enabled.
    #[must_use]
    #[rustfmt::skip]
    pub fn pair_match(&self) -> bool { self.pair_match }

    /// Fixes the number of timepoint columns instead of deriving it from the
    /// largest recorded timepoint.
    ///
    /// # Examples
    /// ```
    /// use roicluster_core::ClusteringBuilder;
    ///
    /// let builder = ClusteringBuilder::new().with_timepoint_count(12);
    /// assert_eq!(builder.timepoint_count(), Some(12));
    /// ```
    #[must_use]
    pub fn with_timepoint_count(mut self, count: usize) -> Self {
        self.timepoint_count = Some(count);
        self
    }

    /// Returns the explicit timepoint column count, if any.
    #[must_use]
    #[rustfmt::skip]
    pub fn timepoint_count(&self) -> Option<usize> { self.timepoint_count }

    /// Validates the configuration and constructs a [`ClusteringEngine`].
    ///
    /// # Errors
    /// Returns [`ClusteringError::InvalidThreshold`] when the overlap
    /// threshold lies outside `[0, 1]` or the height threshold is negative
    /// or NaN.
    ///
    /// # Examples
    /// ```
    /// use roicluster_core::{ClusteringBuilder, ClusteringError};
    ///
    /// let err = ClusteringBuilder::new()
    ///     .with_overlap_threshold(1.5)
    ///     .build()
    ///     .expect_err("overlap above one is invalid");
    /// assert!(matches!(err, ClusteringError::InvalidThreshold { name: "overlap", .. }));
    /// ```
    pub fn build(self) -> Result<ClusteringEngine> {
        if !(0.0..=1.0).contains(&self.overlap_threshold) {
            return Err(ClusteringError::InvalidThreshold {
                name: "overlap",
                value: self.overlap_threshold,
                expected: "a ratio in [0, 1]",
            });
        }
        if self.height_threshold.is_nan() || self.height_threshold < 0.0 {
            return Err(ClusteringError::InvalidThreshold {
                name: "height",
                value: self.height_threshold,
                expected: "a non-negative distance",
            });
        }
        Ok(ClusteringEngine::new(
            self.overlap_threshold,
            self.height_threshold,
            self.use_sparse_representation,
            self.pair_match,
            self.timepoint_count,
        ))
    }
}
