//! Graph input and the light/heavy edge partitioner.
//!
//! - [`Graph`]: vertex count plus a directed, weighted edge list.
//! - [`EdgePartition`]: per-vertex CSR split of outgoing edges by `delta`.
//! - Edge-list text persistence lives in `edge_list`.

mod edge_list;
pub mod partition;

pub use partition::{CsrEdges, EdgeDirection, EdgePartition};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{error::GraphError, VertexId, Weight};

/// A directed, weighted edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Tail vertex.
    pub from: VertexId,
    /// Head vertex.
    pub to: VertexId,
    /// Non-negative weight.
    pub weight: Weight,
}

impl From<(VertexId, VertexId, Weight)> for Edge {
    fn from((from, to, weight): (VertexId, VertexId, Weight)) -> Self {
        Self { from, to, weight }
    }
}

/// A static directed graph with non-negative integer weights.
///
/// Edges are stored exactly as added; parallel edges and self loops are kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Graph {
    vertices: usize,
    edges: Vec<Edge>,
}

impl Graph {
    /// Creates a graph with `vertices` vertices and no edges.
    pub fn new(vertices: usize) -> Self {
        Self {
            vertices,
            edges: Vec::new(),
        }
    }

    /// Builds a graph from `(from, to, weight)` triples.
    ///
    /// # Errors
    /// Returns [`GraphError::VertexOutOfRange`] for the first edge whose endpoint
    /// is not below `vertices`.
    pub fn with_edges<I>(vertices: usize, edges: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = (VertexId, VertexId, Weight)>,
    {
        let mut graph = Self::new(vertices);
        for (from, to, weight) in edges {
            graph.add_edge(from, to, weight)?;
        }
        Ok(graph)
    }

    /// Adds the directed edge `from -> to`.
    ///
    /// # Errors
    /// Returns [`GraphError::VertexOutOfRange`] if either endpoint is not below
    /// [`vertex_count`](Self::vertex_count).
    pub fn add_edge(
        &mut self,
        from: VertexId,
        to: VertexId,
        weight: Weight,
    ) -> Result<(), GraphError> {
        if from >= self.vertices || to >= self.vertices {
            return Err(GraphError::VertexOutOfRange {
                from,
                to,
                vertices: self.vertices,
            });
        }
        self.edges.push(Edge { from, to, weight });
        Ok(())
    }

    /// Generates a random graph.
    ///
    /// For every pair `i < j` an edge `i -> j` is emitted with probability
    /// `probability`, with a weight drawn uniformly from `1..=max_weight`.
    /// Only forward edges are generated, so the result is a DAG rooted at 0.
    ///
    /// # Errors
    /// Rejects probabilities outside `(0, 1]` and a zero `max_weight`.
    pub fn random<R: Rng + ?Sized>(
        vertices: usize,
        probability: f64,
        max_weight: Weight,
        rng: &mut R,
    ) -> Result<Self, GraphError> {
        if !(probability > 0.0 && probability <= 1.0) {
            return Err(GraphError::InvalidProbability(probability));
        }
        if max_weight == 0 {
            return Err(GraphError::InvalidMaxWeight(max_weight));
        }

        let mut graph = Self::new(vertices);
        for from in 0..vertices {
            for to in from + 1..vertices {
                if rng.gen::<f64>() < probability {
                    let weight = rng.gen_range(1..=max_weight);
                    graph.edges.push(Edge { from, to, weight });
                }
            }
        }
        Ok(graph)
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices
    }

    /// Number of stored (directed) edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All edges, in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Largest edge weight, or `None` for an edgeless graph.
    pub fn max_weight(&self) -> Option<Weight> {
        self.edges.iter().map(|e| e.weight).max()
    }

    /// Per-vertex outgoing `(to, weight)` lists.
    pub fn adjacency(&self) -> Vec<Vec<(VertexId, Weight)>> {
        let mut adjacency = vec![Vec::new(); self.vertices];
        for e in &self.edges {
            adjacency[e.from].push((e.to, e.weight));
        }
        adjacency
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn add_edge_rejects_out_of_range_endpoints() {
        let mut g = Graph::new(3);
        assert!(g.add_edge(0, 2, 1).is_ok());
        let err = g.add_edge(1, 3, 1).unwrap_err();
        assert!(matches!(err, GraphError::VertexOutOfRange { to: 3, vertices: 3, .. }));
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn adjacency_groups_by_tail() {
        let g = Graph::with_edges(3, [(0, 1, 4), (2, 0, 1), (0, 2, 7)]).unwrap();
        assert_eq!(g.adjacency(), vec![vec![(1, 4), (2, 7)], vec![], vec![(0, 1)]]);
        assert_eq!(g.max_weight(), Some(7));
        assert_eq!(Graph::new(2).max_weight(), None);
    }

    #[test]
    fn random_graph_is_forward_only_and_weight_bounded() {
        let mut rng = StdRng::seed_from_u64(7);
        let g = Graph::random(40, 0.3, 100, &mut rng).unwrap();
        assert_eq!(g.vertex_count(), 40);
        assert!(g.edge_count() > 0);
        for e in g.edges() {
            assert!(e.from < e.to);
            assert!((1..=100).contains(&e.weight));
        }
    }

    #[test]
    fn random_graph_validates_parameters() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            Graph::random(4, 0.0, 10, &mut rng),
            Err(GraphError::InvalidProbability(_))
        ));
        assert!(matches!(
            Graph::random(4, 1.5, 10, &mut rng),
            Err(GraphError::InvalidProbability(_))
        ));
        assert!(matches!(
            Graph::random(4, 0.5, 0, &mut rng),
            Err(GraphError::InvalidMaxWeight(0))
        ));
    }
}
