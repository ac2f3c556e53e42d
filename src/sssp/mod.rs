//! Delta-stepping entry points.
//!
//! [`compute_sssp`] validates its inputs, partitions the graph's edges into
//! light and heavy sets, allocates the per-run distance table and bucket array,
//! and hands them to the phase driver on the caller's [`ExecutionContext`].
//! Nothing outlives the call except the returned [`ShortestPaths`].

pub mod buckets;
mod driver;
pub mod relax;

pub use buckets::BucketArray;
pub use driver::RunStats;
pub use relax::{bucket_of, relax, DistanceTable};

use std::time::{Duration, Instant};

use crate::backend::ExecutionContext;
use crate::config::SsspConfig;
use crate::error::SsspError;
use crate::graph::{EdgePartition, Graph};
use crate::{Distance, VertexId, INF};
use driver::PhaseDriver;

/// Result of one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShortestPaths {
    distances: Vec<Distance>,
    elapsed: Duration,
    stats: RunStats,
}

impl ShortestPaths {
    /// Distance from the source to every vertex; [`INF`] where unreachable.
    pub fn distances(&self) -> &[Distance] {
        &self.distances
    }

    /// Distance to `vertex`, or `None` if it is unreachable or out of range.
    pub fn distance(&self, vertex: VertexId) -> Option<Distance> {
        self.distances.get(vertex).copied().filter(|&d| d != INF)
    }

    /// Whether `vertex` is reachable from the source.
    pub fn is_reachable(&self, vertex: VertexId) -> bool {
        self.distance(vertex).is_some()
    }

    /// Wall-clock time of the phase driver, excluding partitioning and allocation.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Counters collected by the phase driver.
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Splits into the distance vector and elapsed time.
    pub fn into_parts(self) -> (Vec<Distance>, Duration) {
        (self.distances, self.elapsed)
    }
}

/// Computes shortest-path distances from `source` with bucket width `delta`
/// and otherwise default settings.
///
/// # Errors
/// [`SsspError::InvalidSource`] if `source` is not a vertex of `graph`,
/// [`SsspError::InvalidDelta`] if `delta == 0`, [`SsspError::Allocation`] if
/// run state cannot be allocated, [`SsspError::BucketLimit`] if some distance
/// divided by `delta` reaches [`DEFAULT_MAX_BUCKETS`](crate::DEFAULT_MAX_BUCKETS).
pub fn compute_sssp(
    graph: &Graph,
    source: VertexId,
    delta: Distance,
    ctx: &ExecutionContext,
) -> Result<ShortestPaths, SsspError> {
    compute_sssp_with(graph, source, &SsspConfig::new(delta), ctx)
}

/// Like [`compute_sssp`], with every run parameter taken from `config`.
///
/// Waves run on `ctx`'s backend; `config.backend` only matters to
/// [`ExecutionContext::from_config`].
///
/// # Errors
/// As [`compute_sssp`], plus [`SsspError::InvalidConfig`] for out-of-range
/// config fields. The bucket limit is `config.max_buckets`.
pub fn compute_sssp_with(
    graph: &Graph,
    source: VertexId,
    config: &SsspConfig,
    ctx: &ExecutionContext,
) -> Result<ShortestPaths, SsspError> {
    let vertices = graph.vertex_count();
    if source >= vertices {
        return Err(SsspError::InvalidSource {
            vertex: source,
            vertices,
        });
    }
    config.validate()?;

    let partition = EdgePartition::build(graph, config.delta, config.direction);
    let distances = DistanceTable::new(vertices)?;
    let backend = ctx.backend();
    let driver = PhaseDriver::new(
        &partition,
        &distances,
        backend,
        config.initial_bucket_count(),
        config.max_buckets,
    )?;

    let start = Instant::now();
    let stats = driver.run(source)?;
    let elapsed = start.elapsed();

    sssp_info!(
        backend = backend.name(),
        vertices,
        edges = graph.edge_count(),
        delta = config.delta,
        buckets = stats.bucket_count,
        relaxations = stats.relaxations,
        elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
        "sssp complete"
    );

    Ok(ShortestPaths {
        distances: distances.into_vec(),
        elapsed,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_hide_inf() {
        let g = Graph::with_edges(3, [(0, 1, 4)]).unwrap();
        let paths = compute_sssp(&g, 0, 2, &ExecutionContext::sequential()).unwrap();
        assert_eq!(paths.distance(1), Some(4));
        assert_eq!(paths.distance(2), None);
        assert_eq!(paths.distance(99), None);
        assert!(paths.is_reachable(0));
        assert!(!paths.is_reachable(2));
        let (d, _) = paths.into_parts();
        assert_eq!(d, vec![0, 4, INF]);
    }

    #[test]
    fn source_is_checked_before_delta() {
        let g = Graph::new(2);
        let ctx = ExecutionContext::sequential();
        assert!(matches!(
            compute_sssp(&g, 2, 0, &ctx),
            Err(SsspError::InvalidSource { vertex: 2, vertices: 2 })
        ));
        assert!(matches!(compute_sssp(&g, 0, 0, &ctx), Err(SsspError::InvalidDelta)));
    }

    #[test]
    fn huge_weight_with_unit_delta_is_refused() {
        let g = Graph::with_edges(2, [(0, 1, 1u32 << 31)]).unwrap();
        let err = compute_sssp(&g, 0, 1, &ExecutionContext::sequential()).unwrap_err();
        assert!(matches!(
            err,
            SsspError::BucketLimit { index, limit }
                if index == 1 << 31 && limit == crate::DEFAULT_MAX_BUCKETS
        ));
        // a wider bucket brings the same graph back in range
        let paths = compute_sssp(&g, 0, 1 << 20, &ExecutionContext::sequential()).unwrap();
        assert_eq!(paths.distance(1), Some(1 << 31));
    }

    #[test]
    fn max_buckets_comes_from_the_config() {
        let g = Graph::with_edges(2, [(0, 1, 40)]).unwrap();
        let config = SsspConfig {
            max_buckets: 4,
            ..SsspConfig::new(10)
        };
        let ctx = ExecutionContext::sequential();
        assert!(matches!(
            compute_sssp_with(&g, 0, &config, &ctx),
            Err(SsspError::BucketLimit { index: 4, limit: 4 })
        ));
        let config = SsspConfig {
            max_buckets: 5,
            ..config
        };
        assert_eq!(compute_sssp_with(&g, 0, &config, &ctx).unwrap().distance(1), Some(40));
    }
}
