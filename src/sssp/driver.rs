//! Phase driver: the delta-stepping main loop.
//!
//! For each bucket index `i`, in increasing order:
//!
//! 1. While bucket `i` is non-empty: merge its members into the phase's
//!    settled set, take (snapshot and clear) them, and relax every light edge
//!    leaving them as one wave.
//! 2. Relax every heavy edge leaving the settled set as one more wave.
//! 3. Release bucket `i` and jump to the next non-empty bucket.
//!
//! A wave is flattened into `(vertex, edge)` work items: prefix sums over the
//! frontier's degrees give each vertex a contiguous item range, and each item
//! finds its vertex by binary search. `parallel_for` returning is the barrier
//! after which bucket state is read again. The first error a work item hits
//! is kept and returned once the wave's barrier has passed.

use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use crossbeam_utils::CachePadded;
use serde::{Deserialize, Serialize};

use super::buckets::BucketArray;
use super::relax::{bucket_of, relax, DistanceTable};
use crate::backend::ExecutionBackend;
use crate::concurrency::AtomicBitset;
use crate::error::SsspError;
use crate::graph::{CsrEdges, EdgePartition};
use crate::{Distance, VertexId};

/// Counters collected over one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Bucket indices that held at least one vertex when reached.
    pub buckets_visited: usize,
    /// Light-edge waves dispatched.
    pub light_waves: usize,
    /// Heavy-edge passes dispatched.
    pub heavy_passes: usize,
    /// Edge relaxations attempted.
    pub relaxations: usize,
    /// Relaxations that lowered a distance.
    pub improvements: usize,
    /// One past the highest bucket index created.
    pub bucket_count: usize,
}

pub(crate) struct PhaseDriver<'a> {
    partition: &'a EdgePartition,
    distances: &'a DistanceTable,
    backend: &'a dyn ExecutionBackend,
    buckets: BucketArray,
    settled: AtomicBitset,
    delta: Distance,
    stats: RunStats,
}

impl<'a> PhaseDriver<'a> {
    pub(crate) fn new(
        partition: &'a EdgePartition,
        distances: &'a DistanceTable,
        backend: &'a dyn ExecutionBackend,
        initial_buckets: usize,
        max_buckets: usize,
    ) -> Result<Self, SsspError> {
        let vertices = distances.len();
        let settled = AtomicBitset::try_new(vertices).map_err(|_| SsspError::Allocation {
            bytes: vertices.div_ceil(8),
        })?;
        let buckets = BucketArray::with_limit(vertices, max_buckets);
        buckets.reserve(initial_buckets.min(max_buckets))?;
        Ok(Self {
            partition,
            distances,
            backend,
            buckets,
            settled,
            delta: partition.delta(),
            stats: RunStats::default(),
        })
    }

    /// Runs to completion from `source` and returns the collected counters.
    pub(crate) fn run(mut self, source: VertexId) -> Result<RunStats, SsspError> {
        self.distances.slot(source).store(0, Ordering::Release);
        self.buckets.insert(0, source)?;

        let mut current = Some(0);
        while let Some(i) = current {
            self.process_bucket(i)?;
            current = self.buckets.next_non_empty(i + 1);
            self.buckets.retire_range(i..current.unwrap_or(i + 1));
        }

        self.stats.bucket_count = self.buckets.bucket_count();
        Ok(self.stats)
    }

    fn process_bucket(&mut self, i: usize) -> Result<(), SsspError> {
        let partition = self.partition;
        while !self.buckets.is_empty(i) {
            self.buckets.union_into(&self.settled, i);
            let frontier = self.current_members(self.buckets.take_members(i), i);
            sssp_trace!(bucket = i, frontier = frontier.len(), "light wave");
            self.relax_wave(partition.light(), &frontier)?;
            self.stats.light_waves += 1;
        }

        let settled = self.current_members(self.settled.drain(), i);
        if !settled.is_empty() {
            self.stats.buckets_visited += 1;
        }
        sssp_debug!(
            bucket = i,
            settled = settled.len(),
            light_waves = self.stats.light_waves,
            "bucket drained"
        );
        self.relax_wave(partition.heavy(), &settled)?;
        self.stats.heavy_passes += 1;
        Ok(())
    }

    /// Drops members whose distance has since moved to a lower bucket.
    fn current_members(&self, mut members: Vec<VertexId>, i: usize) -> Vec<VertexId> {
        members.retain(|&u| bucket_of(self.distances.get(u), self.delta) == i);
        members
    }

    fn relax_wave(&mut self, edges: &CsrEdges, frontier: &[VertexId]) -> Result<(), SsspError> {
        let mut starts = Vec::with_capacity(frontier.len() + 1);
        let mut total = 0usize;
        starts.push(0);
        for &u in frontier {
            total += edges.degree(u);
            starts.push(total);
        }
        if total == 0 {
            return Ok(());
        }

        let improved = CachePadded::new(AtomicUsize::new(0));
        let failure = OnceLock::new();
        let (distances, buckets, backend, delta) =
            (self.distances, &self.buckets, self.backend, self.delta);
        let starts = &starts[..];

        self.backend.parallel_for(total, &|item| {
            let slot = starts.partition_point(|&s| s <= item) - 1;
            let u = frontier[slot];
            let (v, w) = edges.edge_at(u, item - starts[slot]);
            match relax(u, v, w, delta, distances, buckets, backend) {
                Ok(true) => {
                    improved.fetch_add(1, Ordering::Relaxed);
                }
                Ok(false) => {}
                Err(e) => {
                    let _ = failure.set(e);
                }
            }
        });

        self.stats.relaxations += total;
        self.stats.improvements += improved.load(Ordering::Relaxed);
        match failure.into_inner() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SequentialBackend;
    use crate::graph::{EdgeDirection, Graph};
    use crate::{DEFAULT_MAX_BUCKETS, INF};

    fn run(graph: &Graph, delta: Distance) -> (Vec<Distance>, RunStats) {
        let partition = EdgePartition::build(graph, delta, EdgeDirection::Directed);
        let distances = DistanceTable::new(graph.vertex_count()).unwrap();
        let driver =
            PhaseDriver::new(&partition, &distances, &SequentialBackend, 4, DEFAULT_MAX_BUCKETS)
                .unwrap();
        let stats = driver.run(0).unwrap();
        (distances.into_vec(), stats)
    }

    #[test]
    fn light_waves_repeat_until_bucket_is_stable() {
        // 0 -1-> 1 -1-> 2 -1-> 3, all inside bucket 0 for delta 10
        let g = Graph::with_edges(4, [(0, 1, 1), (1, 2, 1), (2, 3, 1)]).unwrap();
        let (d, stats) = run(&g, 10);
        assert_eq!(d, vec![0, 1, 2, 3]);
        assert_eq!(stats.light_waves, 4);
        assert_eq!(stats.heavy_passes, 1);
        assert_eq!(stats.buckets_visited, 1);
    }

    #[test]
    fn heavy_edges_feed_later_buckets() {
        let g = Graph::with_edges(3, [(0, 1, 5), (1, 2, 5)]).unwrap();
        let (d, stats) = run(&g, 3);
        assert_eq!(d, vec![0, 5, 10]);
        assert_eq!(stats.light_waves, 3);
        assert_eq!(stats.buckets_visited, 3);
        assert_eq!(stats.bucket_count, 4);
        assert_eq!(stats.improvements, 2);
    }

    #[test]
    fn unreachable_vertices_stay_inf() {
        let g = Graph::with_edges(3, [(1, 2, 1)]).unwrap();
        let (d, stats) = run(&g, 2);
        assert_eq!(d, vec![0, INF, INF]);
        assert_eq!(stats.relaxations, 0);
    }

    #[test]
    fn sparse_bucket_range_finishes() {
        // buckets 1..1_000_000 are never touched
        let g = Graph::with_edges(2, [(0, 1, 1_000_000)]).unwrap();
        let (d, stats) = run(&g, 1);
        assert_eq!(d, vec![0, 1_000_000]);
        assert_eq!(stats.buckets_visited, 2);
        assert_eq!(stats.bucket_count, 1_000_001);
    }

    #[test]
    fn stale_members_are_skipped() {
        let g = Graph::with_edges(2, [(0, 1, 1)]).unwrap();
        let partition = EdgePartition::build(&g, 2, EdgeDirection::Directed);
        let distances = DistanceTable::new(2).unwrap();
        let driver =
            PhaseDriver::new(&partition, &distances, &SequentialBackend, 0, DEFAULT_MAX_BUCKETS)
                .unwrap();
        // A losing relaxation left vertex 1 behind in bucket 5.
        driver.buckets.insert(5, 1).unwrap();
        let stats = driver.run(0).unwrap();
        assert_eq!(distances.get(1), 1);
        assert_eq!(stats.buckets_visited, 1);
        assert_eq!(stats.relaxations, 1);
    }

    #[test]
    fn bucket_limit_aborts_the_run() {
        let g = Graph::with_edges(3, [(0, 1, 1), (1, 2, 50)]).unwrap();
        let partition = EdgePartition::build(&g, 1, EdgeDirection::Directed);
        let distances = DistanceTable::new(3).unwrap();
        let err = PhaseDriver::new(&partition, &distances, &SequentialBackend, 4, 16)
            .unwrap()
            .run(0)
            .unwrap_err();
        assert!(matches!(err, SsspError::BucketLimit { index: 51, limit: 16 }));
    }
}
