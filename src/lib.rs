//! # `delta-sssp` - Parallel Delta-Stepping Shortest Paths
//!
//! A single-source shortest path engine built on the delta-stepping algorithm
//! (Meyer & Sanders). Vertices are grouped into buckets of width `delta` by
//! tentative distance; each bucket is drained through repeated *light-edge*
//! waves until it stays empty, followed by one *heavy-edge* pass over every
//! vertex the bucket settled. Waves are bulk-synchronous: all relaxations of a
//! wave complete before the driver looks at bucket state again.
//!
//! ## Architecture
//!
//! Leaves first:
//!
//! 1. **Graph input** ([`graph::Graph`]): vertex count plus a directed, weighted
//!    edge list. Static for the duration of a run.
//! 2. **Edge partitioner** ([`graph::EdgePartition`]): splits every vertex's
//!    outgoing edges into light (`weight < delta`) and heavy (`weight >= delta`)
//!    CSR sets, once, before the timed region.
//! 3. **Bucket structure** ([`sssp::BucketArray`]): segmented, lazily allocated
//!    array of atomic membership bitsets. Growing never moves existing buckets.
//! 4. **Relaxation protocol** ([`sssp::relax()`]): atomic fetch-min on the target
//!    distance, then bucket migration computed from the value the min replaced.
//! 5. **Phase driver**: the main loop over bucket indices.
//! 6. **Execution backends** ([`backend`]): sequential, persistent thread pool and
//!    an accelerator-offload queue, all behind [`backend::ExecutionBackend`].
//!
//! ## Concurrency model
//!
//! - `distance[]` and bucket membership are the only shared mutable state, and
//!   the only write path is fetch-min followed by erase/insert.
//! - The light/heavy partition is immutable and shared by reference.
//! - A relaxation that loses the fetch-min race never erases the vertex from
//!   the bucket the winner inserted it into; a vertex can transiently sit in a
//!   higher, stale bucket, which the driver skips when it gets there.
//!
//! ## Example
//!
//! ```rust
//! use delta_sssp::{compute_sssp, ExecutionContext, Graph, INF};
//!
//! let graph = Graph::with_edges(
//!     5,
//!     [(0, 1, 2), (0, 2, 5), (1, 2, 1), (1, 3, 4), (2, 3, 1), (3, 4, 3)],
//! )
//! .unwrap();
//!
//! let ctx = ExecutionContext::sequential();
//! let paths = compute_sssp(&graph, 0, 3, &ctx).unwrap();
//! assert_eq!(paths.distances(), &[0, 2, 3, 4, 7]);
//! assert!(paths.distances().iter().all(|&d| d < INF));
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

#[macro_use]
mod trace;

pub mod backend;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod graph;
pub mod harness;
pub mod sssp;

pub use backend::{BackendKind, ExecutionBackend, ExecutionContext};
pub use config::SsspConfig;
pub use error::{ConfigError, GraphError, SsspError};
pub use graph::{Edge, EdgeDirection, EdgePartition, Graph};
pub use sssp::{compute_sssp, compute_sssp_with, RunStats, ShortestPaths};

/// Dense vertex index in `0..vertex_count`.
pub type VertexId = usize;

/// Non-negative edge weight.
pub type Weight = u32;

/// Tentative or final shortest-path distance.
pub type Distance = u64;

/// Sentinel for "unreached".
///
/// Large but finite, so adding any edge weight to it cannot wrap.
pub const INF: Distance = Distance::MAX / 2;

/// Largest edge weight assumed when sizing the initial bucket array.
pub const DEFAULT_MAX_EDGE_WEIGHT: Weight = 100;

/// Default bucket width.
pub const DEFAULT_DELTA: Distance = 10;

/// Multiplier applied to `max_edge_weight / delta + 1` for the initial bucket reservation.
pub const DEFAULT_BUCKET_SAFETY_FACTOR: usize = 3;

/// Default bound on bucket indices a run may touch.
///
/// Bucket headers are allocated per segment up to the highest index reached, so
/// this bounds header memory at about twice this many headers.
pub const DEFAULT_MAX_BUCKETS: usize = 1 << 24;

const _: () = {
    // Relaxing from any finite distance can never wrap.
    assert!(INF.checked_add(Weight::MAX as Distance).is_some());
    assert!(INF + (Weight::MAX as Distance) < Distance::MAX);

    // Distances live in `AtomicU64` slots.
    assert!(
        core::mem::size_of::<Distance>() == core::mem::size_of::<core::sync::atomic::AtomicU64>()
    );
};
