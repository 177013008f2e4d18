//! Streaming statistical data structures operating in bounded memory.
//!
//! Five independent primitives: [`running_stats`], [`p2_quantile`],
//! [`p2_histogram`], [`cms`], and a ring-buffered [`time_series`] with a
//! SCRIMP-style [`matrix_profile`]. [`matrix`] is a small dense-array helper
//! used by the time-series/matrix-profile path.

pub mod cms;
pub mod endian;
pub mod hash;
pub mod matrix;
pub mod matrix_profile;
pub mod p2_histogram;
pub mod p2_quantile;
pub mod running_stats;
pub mod time_series;

pub use cms::CountMinSketch;
pub use matrix::{MatrixFlt, MatrixInt, PccMode};
pub use matrix_profile::MatrixProfile;
pub use p2_histogram::P2Histogram;
pub use p2_quantile::P2Quantile;
pub use running_stats::RunningStats;
pub use time_series::{MergeOp, StatKind, TimeSeries};

use std::error::Error as StdError;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A constructor argument was out of its valid range.
    InvalidParameter(String),
    /// A `deserialize` buffer's length didn't match what the receiver expects.
    InvalidLength,
    /// A deserialized `count`/`cnt` field was structurally impossible.
    InvalidCount,
    /// A deserialized quantile target `p` didn't match the receiver's `p`.
    MismatchedParameter,
    /// A deserialized matrix's row count didn't match the receiver's.
    MismatchedRows,
    /// A deserialized matrix's column count didn't match the receiver's.
    MismatchedCols,
    /// A deserialized time series' `ns_per_row` didn't match the receiver's.
    MismatchedNsPerRow,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidParameter(msg) => write!(f, "invalid parameter: {}", msg),
            Error::InvalidLength => write!(f, "serialized buffer has the wrong length"),
            Error::InvalidCount => write!(f, "serialized count field is out of range"),
            Error::MismatchedParameter => write!(f, "serialized parameter does not match receiver"),
            Error::MismatchedRows => write!(f, "serialized row count does not match receiver"),
            Error::MismatchedCols => write!(f, "serialized column count does not match receiver"),
            Error::MismatchedNsPerRow => {
                write!(f, "serialized ns_per_row does not match receiver")
            }
        }
    }
}

impl StdError for Error {}

pub type Result<T> = std::result::Result<T, Error>;
