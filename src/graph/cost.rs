//! Pairwise generalization cost between rows

use crate::error::{AnonError, Result};
use crate::generalization::Generalizer;
use crate::model::{Column, Row, Schema, Table};
use crate::partition::Partition;
use rayon::prelude::*;
use std::mem;

/// Complete weighted undirected graph over rows
///
/// Weights are stored as a flat upper triangle: pair `(i, j)` with `i < j`
/// lives at `i * (2n - i - 1) / 2 + (j - i - 1)`.
#[derive(Debug, Clone)]
pub struct CostGraph {
    /// Number of rows in the graph
    pub node_count: usize,

    weights: Vec<f64>,
}

impl CostGraph {
    /// Graph with every weight set to zero
    pub fn new(node_count: usize) -> Self {
        Self {
            node_count,
            weights: vec![0.0; pair_count(node_count)],
        }
    }

    fn pair_index(&self, i: usize, j: usize) -> Option<usize> {
        if i == j || i >= self.node_count || j >= self.node_count {
            return None;
        }
        let (i, j) = if i < j { (i, j) } else { (j, i) };
        Some(i * (2 * self.node_count - i - 1) / 2 + (j - i - 1))
    }

    /// Cost of merging rows `i` and `j`; zero on the diagonal
    pub fn weight(&self, i: usize, j: usize) -> Option<f64> {
        if i == j && i < self.node_count {
            return Some(0.0);
        }
        self.pair_index(i, j).map(|idx| self.weights[idx])
    }

    pub fn set_weight(&mut self, i: usize, j: usize, weight: f64) {
        if let Some(idx) = self.pair_index(i, j) {
            self.weights[idx] = weight;
        }
    }

    /// Number of stored pairs
    pub fn edge_count(&self) -> usize {
        self.weights.len()
    }

    /// Estimate memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        mem::size_of::<Self>() + self.weights.capacity() * mem::size_of::<f64>()
    }
}

fn pair_count(node_count: usize) -> usize {
    node_count * node_count.saturating_sub(1) / 2
}

/// Build the cost graph of a table
///
/// Rows are processed in parallel once the table has `parallel_threshold`
/// rows or more.
pub fn build_cost_graph(table: &Table, parallel_threshold: usize) -> Result<CostGraph> {
    let rows = table.rows();
    let schema = table.schema();
    let n = rows.len();

    log::info!("Building cost graph over {} rows ({} pairs)", n, pair_count(n));

    let row_costs = |i: usize| -> Result<Vec<f64>> {
        ((i + 1)..n)
            .map(|j| calculate_cost(schema, &rows[i], &rows[j]))
            .collect()
    };

    let per_row: Vec<Vec<f64>> = if n < parallel_threshold {
        (0..n).map(row_costs).collect::<Result<_>>()?
    } else {
        (0..n).into_par_iter().map(row_costs).collect::<Result<_>>()?
    };

    let mut weights = Vec::with_capacity(pair_count(n));
    for costs in per_row {
        weights.extend(costs);
    }

    let graph = CostGraph {
        node_count: n,
        weights,
    };
    log::debug!("Cost graph uses {} bytes", graph.memory_usage());

    Ok(graph)
}

/// Weighted sum of per-column cost fractions over identifier columns
pub fn calculate_cost(schema: &Schema, r1: &Row, r2: &Row) -> Result<f64> {
    let mut cost = 0.0;
    for (idx, column, generalizer) in schema.identifiers() {
        cost += column.weight() * cost_fraction(column, generalizer, &r1.data[idx], &r2.data[idx])?;
    }
    Ok(cost)
}

/// Smallest level at which both partitions generalize to the same
/// partition, divided by the top level
fn cost_fraction(
    column: &Column,
    generalizer: &dyn Generalizer,
    p1: &Partition,
    p2: &Partition,
) -> Result<f64> {
    let levels = generalizer.levels();
    for level in 0..levels {
        let g1 = generalizer.generalize(p1, level);
        if g1.is_some() && g1 == generalizer.generalize(p2, level) {
            return Ok(level as f64 / (levels.saturating_sub(1)).max(1) as f64);
        }
    }

    Err(AnonError::Ungeneralizable {
        column: column.name().to_string(),
        left: p1.to_string(),
        right: p2.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::generalization::PrefixGeneralizer;
    use crate::partition::Value;
    use approx::assert_relative_eq;

    fn pair_cost(a: &[i64], b: &[i64]) -> Result<f64> {
        let table = fixtures::int_table(&[a, b]);
        calculate_cost(table.schema(), &table.rows()[0], &table.rows()[1])
    }

    #[test]
    fn test_row_pair_costs() {
        let cases: [(&[i64], &[i64], f64); 9] = [
            (&[8], &[8], 0.0),
            (&[1], &[1], 0.0),
            (&[1], &[2], 0.5),
            (&[8], &[9], 0.25),
            (&[1], &[4], 0.75),
            (&[1], &[5], 1.0),
            (&[1, 1], &[3, 6], 1.75),
            (&[1, 1], &[1, 1], 0.0),
            (&[1, 1, 1, 1], &[4, 5, 1, 2], 2.25),
        ];
        for (a, b, expected) in cases {
            assert_relative_eq!(pair_cost(a, b).unwrap(), expected);
            assert_relative_eq!(pair_cost(b, a).unwrap(), expected);
        }
    }

    #[test]
    fn test_non_identifier_columns_are_ignored() {
        let mut table = Table::new(Schema::new(vec![
            Column::identifier("Col1", fixtures::int_generalizer()),
            Column::identifier("Col2", fixtures::int_generalizer()),
            Column::plain("Col3"),
        ]));
        table.add_row([Value::from(5), Value::from(1), Value::from("Test1")]).unwrap();
        table.add_row([Value::from(6), Value::from(9), Value::from("Test2")]).unwrap();
        let cost = calculate_cost(table.schema(), &table.rows()[0], &table.rows()[1]).unwrap();
        assert_relative_eq!(cost, 1.5);
    }

    #[test]
    fn test_prefix_cost() {
        let mut table = Table::new(Schema::new(vec![Column::identifier(
            "Col1",
            PrefixGeneralizer::new(5),
        )]));
        table.add_row(["cats are wonderful little beings"]).unwrap();
        table.add_row(["dogs are my pets"]).unwrap();
        let cost = calculate_cost(table.schema(), &table.rows()[0], &table.rows()[1]).unwrap();
        assert_relative_eq!(cost, 1.0);
    }

    #[test]
    fn test_weights_scale_the_cost() {
        let mut table = Table::new(Schema::new(vec![
            Column::identifier("Col1", fixtures::int_generalizer()).with_weight(2.0),
        ]));
        table.add_row([8]).unwrap();
        table.add_row([9]).unwrap();
        let cost = calculate_cost(table.schema(), &table.rows()[0], &table.rows()[1]).unwrap();
        assert_relative_eq!(cost, 0.5);
    }

    #[test]
    fn test_ungeneralizable_pair() {
        let err = pair_cost(&[5], &[100]).unwrap_err();
        match err {
            AnonError::Ungeneralizable { column, left, right } => {
                assert_eq!(column, "Col1");
                assert_eq!(left, "[5]");
                assert_eq!(right, "[100]");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_build_int_table_1() {
        let table = fixtures::int_table_1();
        let graph = build_cost_graph(&table, usize::MAX).unwrap();
        assert_eq!(graph.node_count, 4);
        assert_eq!(graph.edge_count(), 6);

        let expected = [
            ((0, 1), 0.5),
            ((0, 2), 1.75),
            ((0, 3), 2.75),
            ((1, 2), 2.25),
            ((1, 3), 2.75),
            ((2, 3), 3.75),
        ];
        for ((i, j), cost) in expected {
            assert_relative_eq!(graph.weight(i, j).unwrap(), cost);
            assert_relative_eq!(graph.weight(j, i).unwrap(), cost);
        }
        assert_eq!(graph.weight(2, 2), Some(0.0));
        assert_eq!(graph.weight(0, 4), None);
    }

    #[test]
    fn test_parallel_build_matches_sequential() {
        let table = fixtures::student_table();
        let sequential = build_cost_graph(&table, usize::MAX).unwrap();
        let parallel = build_cost_graph(&table, 0).unwrap();
        for i in 0..table.len() {
            for j in 0..table.len() {
                assert_eq!(sequential.weight(i, j), parallel.weight(i, j));
            }
        }
    }

    #[test]
    fn test_build_propagates_errors() {
        let table = fixtures::int_table(&[&[1], &[2], &[100]]);
        assert!(build_cost_graph(&table, usize::MAX).is_err());
        assert!(build_cost_graph(&table, 0).is_err());
    }

    #[test]
    fn test_set_weight() {
        let mut graph = CostGraph::new(3);
        graph.set_weight(2, 0, 1.5);
        assert_eq!(graph.weight(0, 2), Some(1.5));
        assert_eq!(graph.weight(0, 1), Some(0.0));
    }
}
