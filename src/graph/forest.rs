//! Greedy minimum-cost merge forest
//!
//! Every undersized component links one of its vertices to the cheapest row
//! outside of it until all components hold at least k rows. A vertex gets
//! at most one outgoing link, which keeps the skeleton acyclic.

use crate::error::{AnonError, Result};
use crate::graph::anon_graph::AnonGraph;
use crate::graph::components::connected_components;
use crate::graph::cost::CostGraph;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use rand::seq::SliceRandom;
use rand::Rng;

/// Directed forest over row indices
#[derive(Debug, Clone)]
pub struct MergeForest {
    graph: DiGraph<usize, ()>,
}

impl MergeForest {
    /// Forest of isolated rows
    pub fn with_rows(row_count: usize) -> Self {
        let mut graph = DiGraph::with_capacity(row_count, row_count);
        for row in 0..row_count {
            graph.add_node(row);
        }
        Self { graph }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn out_degree(&self, u: usize) -> usize {
        if u >= self.node_count() {
            return 0;
        }
        self.graph
            .neighbors_directed(NodeIndex::new(u), Direction::Outgoing)
            .count()
    }

    /// Target of the outgoing link of `u`, if it has one
    pub fn target(&self, u: usize) -> Option<usize> {
        if u >= self.node_count() {
            return None;
        }
        self.graph
            .neighbors_directed(NodeIndex::new(u), Direction::Outgoing)
            .next()
            .map(|n| n.index())
    }

    /// Add the link `u -> v`
    pub fn add_link(&mut self, u: usize, v: usize) -> Result<()> {
        if u == v || u >= self.node_count() || v >= self.node_count() {
            return Err(AnonError::Invariant(format!("cannot link {} to {}", u, v)));
        }
        if let Some(existing) = self.target(u) {
            return Err(AnonError::Invariant(format!(
                "vertex {} already links to {}",
                u, existing
            )));
        }
        self.graph.add_edge(NodeIndex::new(u), NodeIndex::new(v), ());
        Ok(())
    }

    /// All links as `(source, target)` pairs
    pub fn links(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(a, b)| (a.index(), b.index()))
    }

    /// Components of the forest with link directions ignored
    pub fn components(&self) -> Vec<Vec<usize>> {
        connected_components(self.node_count(), self.links())
    }

    /// Undirected copy of the forest
    pub fn undirected(&self) -> AnonGraph {
        AnonGraph::from_edges(self.node_count(), self.links())
    }
}

/// Grow the merge forest until every component holds at least `k` rows
pub fn build_merge_forest<R: Rng + ?Sized>(
    cost_graph: &CostGraph,
    k: usize,
    rng: &mut R,
) -> Result<MergeForest> {
    let n = cost_graph.node_count;
    if k == 0 {
        return Err(AnonError::InvalidK);
    }
    if n > 0 && n < k {
        return Err(AnonError::NotEnoughRows { rows: n, k });
    }

    log::info!("Building merge forest over {} rows with k = {}", n, k);

    let mut forest = MergeForest::with_rows(n);
    loop {
        let components = forest.components();
        let Some(component) = pick_component_to_extend(&components, k) else {
            break;
        };

        let u = pick_source_vertex(&forest, component, rng)?;
        let v = pick_target_vertex(cost_graph, component, u, rng).ok_or_else(|| {
            AnonError::Invariant(format!("no merge target outside the component of {}", u))
        })?;
        forest.add_link(u, v)?;
    }

    log::info!("Merge forest has {} links", forest.edge_count());
    Ok(forest)
}

/// First component with fewer than `k` vertices
pub(crate) fn pick_component_to_extend(components: &[Vec<usize>], k: usize) -> Option<&[usize]> {
    components
        .iter()
        .find(|c| c.len() < k)
        .map(|c| c.as_slice())
}

/// A vertex of the component without an outgoing link
pub(crate) fn pick_source_vertex<R: Rng + ?Sized>(
    forest: &MergeForest,
    component: &[usize],
    rng: &mut R,
) -> Result<usize> {
    let candidates: Vec<usize> = component
        .iter()
        .copied()
        .filter(|&u| forest.out_degree(u) == 0)
        .collect();
    candidates.choose(rng).copied().ok_or_else(|| {
        AnonError::Invariant("every vertex of the component already links out".to_string())
    })
}

/// Cheapest row outside the component, ties broken at random
pub(crate) fn pick_target_vertex<R: Rng + ?Sized>(
    cost_graph: &CostGraph,
    component: &[usize],
    u: usize,
    rng: &mut R,
) -> Option<usize> {
    let mut best = f64::INFINITY;
    let mut candidates = Vec::new();
    for v in 0..cost_graph.node_count {
        if component.contains(&v) {
            continue;
        }
        let Some(weight) = cost_graph.weight(u, v) else {
            continue;
        };
        if weight < best {
            best = weight;
            candidates.clear();
            candidates.push(v);
        } else if weight == best {
            candidates.push(v);
        }
    }
    candidates.choose(rng).copied()
}
