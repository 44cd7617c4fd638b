//! Error types for the roicluster core library.
//!
//! Every failure is a caller error detected before the merge loop starts;
//! nothing here is recovered locally.

use std::fmt;

use thiserror::Error;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// Names the index space an [`ClusteringError::OutOfRange`] value belongs to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum IndexKind {
    /// An entity (row/column of the distance matrix).
    Entity,
    /// A timepoint column of the membership matrix.
    Timepoint,
}

impl IndexKind {
    /// Returns a lowercase label for messages and log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Entity => "entity",
            Self::Timepoint => "timepoint",
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type produced when constructing inputs or running a clustering.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ClusteringError {
    /// The entity count was zero.
    #[error("entity count must be at least 1 (got {got})")]
    InvalidSize {
        /// The rejected entity count.
        got: usize,
    },
    /// A shape did not match: a non-square distance matrix, or a timepoint
    /// table whose entity count disagrees with the matrix.
    #[error("dimension mismatch: {what} has {left} but {right} was expected")]
    DimensionMismatch {
        /// Which pair of dimensions disagreed.
        what: &'static str,
        /// The observed dimension.
        left: usize,
        /// The dimension it was checked against.
        right: usize,
    },
    /// An index lay outside its declared bounds.
    #[error("{kind} index {index} is out of range (bound {bound})")]
    OutOfRange {
        /// The index space the offending value belongs to.
        kind: IndexKind,
        /// The offending index.
        index: usize,
        /// Exclusive upper bound for the index.
        bound: usize,
    },
    /// A threshold was outside its admissible range.
    #[error("{name} threshold {value} is invalid; expected {expected}")]
    InvalidThreshold {
        /// Which threshold was rejected.
        name: &'static str,
        /// The rejected value.
        value: f32,
        /// Human-readable description of the admissible range.
        expected: &'static str,
    },
    /// A stored distance was negative or non-finite.
    #[error("distance {distance} for pair ({row}, {col}) must be finite and non-negative")]
    InvalidDistance {
        /// Row of the offending entry.
        row: usize,
        /// Column of the offending entry.
        col: usize,
        /// The rejected value.
        distance: f32,
    },
    /// The timepoint membership arena could not be sized or allocated.
    #[error("membership arena of {entities} entities by {timepoints} timepoints cannot be allocated")]
    CapacityExceeded {
        /// Number of rows requested.
        entities: usize,
        /// Number of timepoint columns requested.
        timepoints: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`ClusteringError`] variants.
    enum ClusteringErrorCode for ClusteringError {
        /// The entity count was zero.
        InvalidSize => InvalidSize { .. } => "CLUSTER_INVALID_SIZE",
        /// A shape did not match.
        DimensionMismatch => DimensionMismatch { .. } => "CLUSTER_DIMENSION_MISMATCH",
        /// An index lay outside its declared bounds.
        OutOfRange => OutOfRange { .. } => "CLUSTER_OUT_OF_RANGE",
        /// A threshold was outside its admissible range.
        InvalidThreshold => InvalidThreshold { .. } => "CLUSTER_INVALID_THRESHOLD",
        /// A stored distance was negative or non-finite.
        InvalidDistance => InvalidDistance { .. } => "CLUSTER_INVALID_DISTANCE",
        /// The membership arena could not be allocated.
        CapacityExceeded => CapacityExceeded { .. } => "CLUSTER_CAPACITY_EXCEEDED",
    }
}

impl ClusteringError {
    pub(crate) const fn entity_out_of_range(index: usize, bound: usize) -> Self {
        Self::OutOfRange {
            kind: IndexKind::Entity,
            index,
            bound,
        }
    }

    pub(crate) const fn timepoint_out_of_range(index: usize, bound: usize) -> Self {
        Self::OutOfRange {
            kind: IndexKind::Timepoint,
            index,
            bound,
        }
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, ClusteringError>;
