//! Graph representation and grouping algorithms

pub mod anon_graph;
pub mod components;
pub mod cost;
pub mod decompose;
pub mod forest;

pub use anon_graph::{AnonGraph, Vertex, VertexId};
pub use cost::{build_cost_graph, calculate_cost, CostGraph};
pub use decompose::{threshold, CutType, Decomposer};
pub use forest::{build_merge_forest, MergeForest};
