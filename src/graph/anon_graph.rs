//! Undirected grouping graph over rows and Steiner vertices

use crate::graph::components::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::VecDeque;

/// Vertex identifier; `0..row_count` are rows, higher ids are Steiner vertices
pub type VertexId = usize;

/// Vertex payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vertex {
    /// A table row, by index
    Row(usize),

    /// Synthetic vertex that keeps detached pieces connected
    Steiner,
}

/// Arena graph used by the forest builder and the decomposer
///
/// Vertices are never removed, so ids stay stable while edges change.
#[derive(Debug, Clone)]
pub struct AnonGraph {
    graph: UnGraph<Vertex, ()>,
    row_count: usize,
}

impl AnonGraph {
    /// Graph with one isolated vertex per row
    pub fn with_rows(row_count: usize) -> Self {
        let mut graph = UnGraph::with_capacity(row_count, row_count);
        for row in 0..row_count {
            graph.add_node(Vertex::Row(row));
        }
        Self { graph, row_count }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn steiner_count(&self) -> usize {
        self.node_count() - self.row_count
    }

    pub fn vertex(&self, id: VertexId) -> Option<Vertex> {
        self.graph.node_weight(NodeIndex::new(id)).copied()
    }

    pub fn is_row(&self, id: VertexId) -> bool {
        matches!(self.vertex(id), Some(Vertex::Row(_)))
    }

    pub fn add_steiner(&mut self) -> VertexId {
        self.graph.add_node(Vertex::Steiner).index()
    }

    /// Add an undirected edge; returns false for self loops, unknown
    /// vertices and existing edges
    pub fn add_edge(&mut self, a: VertexId, b: VertexId) -> bool {
        if a == b || a >= self.node_count() || b >= self.node_count() || self.has_edge(a, b) {
            return false;
        }
        self.graph.add_edge(NodeIndex::new(a), NodeIndex::new(b), ());
        true
    }

    pub fn remove_edge(&mut self, a: VertexId, b: VertexId) -> bool {
        if a >= self.node_count() || b >= self.node_count() {
            return false;
        }
        match self.graph.find_edge(NodeIndex::new(a), NodeIndex::new(b)) {
            Some(edge) => self.graph.remove_edge(edge).is_some(),
            None => false,
        }
    }

    pub fn has_edge(&self, a: VertexId, b: VertexId) -> bool {
        if a >= self.node_count() || b >= self.node_count() {
            return false;
        }
        self.graph.find_edge(NodeIndex::new(a), NodeIndex::new(b)).is_some()
    }

    /// Neighbours in ascending id order
    pub fn neighbors(&self, id: VertexId) -> Vec<VertexId> {
        if id >= self.node_count() {
            return Vec::new();
        }
        let mut neighbors: Vec<VertexId> = self
            .graph
            .neighbors(NodeIndex::new(id))
            .map(|n| n.index())
            .collect();
        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors
    }

    pub fn degree(&self, id: VertexId) -> usize {
        self.neighbors(id).len()
    }

    /// Number of row vertices among `members`
    pub fn real_size(&self, members: &[VertexId]) -> usize {
        members.iter().filter(|&&id| self.is_row(id)).count()
    }

    /// Vertices reachable from `start` without passing through `blocked`
    pub fn reachable_without(&self, start: VertexId, blocked: Option<VertexId>) -> Vec<VertexId> {
        if start >= self.node_count() {
            return Vec::new();
        }

        let mut seen = vec![false; self.node_count()];
        if let Some(blocked) = blocked.filter(|&b| b < self.node_count()) {
            seen[blocked] = true;
        }
        seen[start] = true;

        let mut members = Vec::new();
        let mut queue = VecDeque::from([start]);
        while let Some(id) = queue.pop_front() {
            members.push(id);
            for next in self.neighbors(id) {
                if !seen[next] {
                    seen[next] = true;
                    queue.push_back(next);
                }
            }
        }

        members.sort_unstable();
        members
    }

    /// All components, each sorted, ordered by their smallest vertex
    pub fn connected_components(&self) -> Vec<Vec<VertexId>> {
        let edges = self
            .graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(a, b)| (a.index(), b.index()));
        connected_components(self.node_count(), edges)
    }

    /// Row indices of every component, Steiner vertices dropped and empty
    /// groups skipped
    pub fn row_groups(&self) -> Vec<Vec<usize>> {
        self.connected_components()
            .into_iter()
            .map(|component| {
                component
                    .into_iter()
                    .filter_map(|id| match self.vertex(id) {
                        Some(Vertex::Row(row)) => Some(row),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
            })
            .filter(|rows| !rows.is_empty())
            .collect()
    }

    /// Undirected graph over `row_count` rows from an edge list
    pub fn from_edges<I>(row_count: usize, edges: I) -> Self
    where
        I: IntoIterator<Item = (VertexId, VertexId)>,
    {
        let mut graph = Self::with_rows(row_count);
        for (a, b) in edges {
            graph.add_edge(a, b);
        }
        graph
    }
}
