//! Error types.
//!
//! Input and configuration errors are raised before any concurrent work is
//! dispatched. [`SsspError::BucketLimit`] and [`SsspError::Allocation`] can
//! also stop a run midway; the partial distances are dropped. Nothing is
//! retried.

use thiserror::Error;

use crate::{VertexId, Weight};

/// Errors reported by [`compute_sssp`](crate::compute_sssp) and the execution context.
#[derive(Debug, Error)]
pub enum SsspError {
    /// The source vertex is outside `0..vertices`.
    #[error("source vertex {vertex} is out of range for a graph with {vertices} vertices")]
    InvalidSource {
        /// The rejected vertex.
        vertex: VertexId,
        /// Number of vertices in the graph.
        vertices: usize,
    },
    /// `delta` was zero.
    #[error("delta must be positive")]
    InvalidDelta,
    /// A configuration field outside `delta` was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// The execution backend could not be brought up.
    #[error("execution backend unavailable: {0}")]
    Backend(String),
    /// Per-run state could not be allocated.
    #[error("failed to allocate {bytes} bytes of run state")]
    Allocation {
        /// Requested size.
        bytes: usize,
    },
    /// A tentative distance fell into a bucket at or above the configured limit.
    #[error("bucket {index} exceeds the limit of {limit} buckets; use a larger delta")]
    BucketLimit {
        /// Bucket index that was refused.
        index: usize,
        /// Configured `max_buckets`.
        limit: usize,
    },
}

/// Errors raised while building, loading or generating a [`Graph`](crate::Graph).
#[derive(Debug, Error)]
pub enum GraphError {
    /// An edge endpoint is outside `0..vertices`.
    #[error("edge {from} -> {to} references a vertex outside 0..{vertices}")]
    VertexOutOfRange {
        /// Tail of the rejected edge.
        from: VertexId,
        /// Head of the rejected edge.
        to: VertexId,
        /// Number of vertices in the graph.
        vertices: usize,
    },
    /// Random generation was asked for a probability outside `(0, 1]`.
    #[error("edge probability {0} is outside (0, 1]")]
    InvalidProbability(f64),
    /// Random generation was asked for a zero maximum weight.
    #[error("maximum edge weight must be positive, got {0}")]
    InvalidMaxWeight(Weight),
    /// An edge-list file could not be parsed.
    #[error("line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What was wrong with it.
        message: String,
    },
    /// Reading or writing an edge list failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading an [`SsspConfig`](crate::SsspConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid JSON for the config schema.
    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// The document parsed but a value is out of range.
    #[error(transparent)]
    Invalid(#[from] SsspError),
}
