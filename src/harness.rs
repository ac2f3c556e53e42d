//! Cross-backend comparison harness.
//!
//! Runs the same graph and source on several backends, times each one, and
//! checks that every backend produced exactly the distances the first one did.
//! [`reference_distances`] is an independent binary-heap Dijkstra for
//! verifying the engine itself.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use crate::backend::{BackendKind, ExecutionContext};
use crate::config::SsspConfig;
use crate::error::SsspError;
use crate::graph::{EdgeDirection, Graph};
use crate::sssp::{compute_sssp_with, RunStats};
use crate::{Distance, VertexId, INF};

/// Samples trimmed from each end once there are enough of them.
const TRIM: usize = 2;

/// Timing of one backend over all repeats.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackendTiming {
    /// Backend that ran.
    pub backend: BackendKind,
    /// Worker count it ran with.
    pub parallelism: usize,
    /// Every sample, in run order, in seconds.
    pub samples: Vec<f64>,
    /// Trimmed mean of `samples`, in seconds.
    pub mean_secs: f64,
    /// Counters from the last repeat.
    pub stats: RunStats,
}

/// First vertex where a backend disagreed with the reference backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    /// Backend that disagreed.
    pub backend: BackendKind,
    /// Vertex with differing distances.
    pub vertex: VertexId,
    /// Reference backend's distance.
    pub expected: Distance,
    /// Disagreeing backend's distance.
    pub actual: Distance,
}

/// Outcome of [`run_backends`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HarnessReport {
    /// Vertices in the graph.
    pub vertices: usize,
    /// Stored edges in the graph.
    pub edges: usize,
    /// Source vertex.
    pub source: VertexId,
    /// Bucket width.
    pub delta: Distance,
    /// Per-backend timing, in the order the backends ran.
    pub timings: Vec<BackendTiming>,
    /// Whether every backend matched the first.
    pub agreed: bool,
    /// The first disagreement found, if any.
    pub mismatch: Option<Mismatch>,
}

/// Runs each of `kinds` `repeats` times and compares their distances.
///
/// Returns the report and the first backend's distances.
///
/// # Errors
/// Propagates the first [`SsspError`] any run or backend construction raises.
pub fn run_backends(
    graph: &Graph,
    source: VertexId,
    config: &SsspConfig,
    kinds: &[BackendKind],
    repeats: usize,
) -> Result<(HarnessReport, Vec<Distance>), SsspError> {
    let repeats = repeats.max(1);
    let mut timings = Vec::with_capacity(kinds.len());
    let mut reference: Option<Vec<Distance>> = None;
    let mut mismatch = None;

    for &kind in kinds {
        let ctx = ExecutionContext::from_config(&config.clone().with_backend(kind))?;
        let mut samples = Vec::with_capacity(repeats);
        let mut last = None;
        for _ in 0..repeats {
            let paths = compute_sssp_with(graph, source, config, &ctx)?;
            samples.push(paths.elapsed().as_secs_f64());
            last = Some(paths);
        }
        let Some(paths) = last else { continue };
        let stats = *paths.stats();
        let (distances, _) = paths.into_parts();

        if let Some(expected) = &reference {
            if mismatch.is_none() {
                mismatch = first_mismatch(expected, &distances).map(|vertex| Mismatch {
                    backend: kind,
                    vertex,
                    expected: expected.get(vertex).copied().unwrap_or(INF),
                    actual: distances.get(vertex).copied().unwrap_or(INF),
                });
            }
        } else {
            reference = Some(distances);
        }

        let mean_secs = trimmed_mean(&samples);
        sssp_info!(backend = %kind, mean_secs, repeats, "backend timed");
        timings.push(BackendTiming {
            backend: kind,
            parallelism: ctx.backend().parallelism(),
            samples,
            mean_secs,
            stats,
        });
    }

    let report = HarnessReport {
        vertices: graph.vertex_count(),
        edges: graph.edge_count(),
        source,
        delta: config.delta,
        timings,
        agreed: mismatch.is_none(),
        mismatch,
    };
    Ok((report, reference.unwrap_or_default()))
}

/// Mean after dropping the two smallest and two largest samples.
///
/// With too few samples to trim, the plain mean. `0.0` for no samples.
pub fn trimmed_mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    let kept = if sorted.len() > 2 * TRIM {
        &sorted[TRIM..sorted.len() - TRIM]
    } else {
        &sorted[..]
    };
    #[allow(clippy::cast_precision_loss)]
    let len = kept.len() as f64;
    kept.iter().sum::<f64>() / len
}

/// Index of the first position where `a` and `b` differ, including a length difference.
pub fn first_mismatch(a: &[Distance], b: &[Distance]) -> Option<VertexId> {
    a.iter()
        .zip(b)
        .position(|(x, y)| x != y)
        .or_else(|| (a.len() != b.len()).then(|| a.len().min(b.len())))
}

/// Single-threaded binary-heap Dijkstra.
///
/// # Panics
/// Panics if `source` is not a vertex of `graph`.
pub fn reference_distances(
    graph: &Graph,
    source: VertexId,
    direction: EdgeDirection,
) -> Vec<Distance> {
    let n = graph.vertex_count();
    assert!(source < n, "source {source} out of range for n={n}");

    let mut adjacency = graph.adjacency();
    if direction == EdgeDirection::Undirected {
        for e in graph.edges() {
            adjacency[e.to].push((e.from, e.weight));
        }
    }

    let mut dist = vec![INF; n];
    let mut heap = BinaryHeap::new();
    dist[source] = 0;
    heap.push(Reverse((0, source)));

    while let Some(Reverse((d, u))) = heap.pop() {
        if d > dist[u] {
            continue;
        }
        for &(v, w) in &adjacency[u] {
            let candidate = d.saturating_add(Distance::from(w)).min(INF);
            if candidate < dist[v] {
                dist[v] = candidate;
                heap.push(Reverse((candidate, v)));
            }
        }
    }
    dist
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trimmed_mean_drops_two_from_each_end() {
        assert!((trimmed_mean(&[100.0, 1.0, 5.0, 6.0, 7.0, 0.0, 50.0]) - 6.0).abs() < 1e-12);
        assert!((trimmed_mean(&[1.0, 3.0]) - 2.0).abs() < 1e-12);
        assert!((trimmed_mean(&[4.0, 1.0, 2.0, 3.0]) - 2.5).abs() < 1e-12);
        assert_eq!(trimmed_mean(&[]), 0.0);
    }

    #[test]
    fn first_mismatch_reports_index_or_length() {
        assert_eq!(first_mismatch(&[0, 1, 2], &[0, 1, 2]), None);
        assert_eq!(first_mismatch(&[0, 1, 2], &[0, 9, 2]), Some(1));
        assert_eq!(first_mismatch(&[0, 1], &[0, 1, 2]), Some(2));
    }

    #[test]
    fn reference_matches_hand_computed_example() {
        let g = Graph::with_edges(
            5,
            [(0, 1, 2), (0, 2, 5), (1, 2, 1), (1, 3, 4), (2, 3, 1), (3, 4, 3)],
        )
        .unwrap();
        assert_eq!(reference_distances(&g, 0, EdgeDirection::Directed), vec![0, 2, 3, 4, 7]);
        assert_eq!(
            reference_distances(&g, 4, EdgeDirection::Directed),
            vec![INF, INF, INF, INF, 0]
        );
        assert_eq!(reference_distances(&g, 4, EdgeDirection::Undirected), vec![7, 5, 4, 3, 0]);
    }

    #[test]
    fn all_backends_agree_on_a_small_graph() {
        let g = Graph::with_edges(4, [(0, 1, 3), (1, 2, 30), (0, 2, 40), (2, 3, 1)]).unwrap();
        let config = SsspConfig::new(5).with_threads(2);
        let (report, distances) = run_backends(&g, 0, &config, &BackendKind::ALL, 3).unwrap();
        assert!(report.agreed, "{report:?}");
        assert_eq!(distances, vec![0, 3, 33, 34]);
        assert_eq!(report.timings.len(), 3);
        assert!(report.timings.iter().all(|t| t.samples.len() == 3));
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"thread-pool\""));
    }
}
