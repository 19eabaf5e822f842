//! Error types for shapr

use thiserror::Error;

/// Result type alias using shapr's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in shapr operations
#[derive(Error, Debug)]
pub enum Error {
    /// Descriptor rank exceeds the supported limit
    #[error("Rank {rank} exceeds the maximum supported rank of {max}")]
    RankExceedsLimit {
        /// The offending rank
        rank: usize,
        /// Maximum supported rank
        max: usize,
    },

    /// Shape and stride vectors disagree with the declared rank
    #[error("Shape/stride mismatch: rank {rank} with {shape_len} extents and {strides_len} strides")]
    ShapeStrideMismatch {
        /// Number of shape extents
        shape_len: usize,
        /// Number of strides
        strides_len: usize,
        /// Declared rank
        rank: usize,
    },

    /// A flat shape-info buffer could not be decoded
    #[error("Malformed shape info: {reason}")]
    MalformedShapeInfo {
        /// Why decoding failed
        reason: String,
    },

    /// Invalid dimension index for a given rank
    #[error("Invalid dimension {dim} for an array of rank {rank}")]
    InvalidDimension {
        /// The invalid dimension
        dim: usize,
        /// Rank of the array
        rank: usize,
    },

    /// Shapes cannot be broadcast together
    #[error("Cannot broadcast shapes {lhs:?} and {rhs:?}")]
    BroadcastError {
        /// Left-hand side shape
        lhs: Vec<i64>,
        /// Right-hand side shape
        rhs: Vec<i64>,
    },

    /// A TAD request does not tile the array evenly
    #[error("Cannot decompose an array of {array_len} elements into tads of {tad_len} elements")]
    TadDecomposition {
        /// Total element count of the base array
        array_len: i64,
        /// Element count of a single tad
        tad_len: i64,
    },

    /// Device ordinal outside the known device range
    #[error("Device {device_id} out of range: {device_count} device(s) available")]
    DeviceOutOfRange {
        /// The requested device ordinal
        device_id: usize,
        /// Number of known devices
        device_count: usize,
    },

    /// Out of memory
    #[error("Out of memory: failed to allocate {size} bytes")]
    OutOfMemory {
        /// Requested size in bytes
        size: usize,
    },

    /// Backend-specific error
    #[error("Backend error: {0}")]
    Backend(String),
}

impl Error {
    /// Create a rank limit error
    pub fn rank_exceeds_limit(rank: usize) -> Self {
        Self::RankExceedsLimit {
            rank,
            max: crate::shape::MAX_RANK,
        }
    }

    /// Create a malformed shape-info error
    pub fn malformed_shape_info(reason: impl Into<String>) -> Self {
        Self::MalformedShapeInfo {
            reason: reason.into(),
        }
    }

    /// Create an invalid dimension error
    pub fn invalid_dimension(dim: usize, rank: usize) -> Self {
        Self::InvalidDimension { dim, rank }
    }

    /// Create a broadcast error
    pub fn broadcast(lhs: &[i64], rhs: &[i64]) -> Self {
        Self::BroadcastError {
            lhs: lhs.to_vec(),
            rhs: rhs.to_vec(),
        }
    }

    /// Create a backend error
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}
