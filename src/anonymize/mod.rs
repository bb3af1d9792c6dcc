//! k-anonymization of a table
//!
//! Rows are grouped with the graph engine (cost graph, merge forest,
//! decomposition) and every identifier column of a group is raised to the
//! lowest level at which all its rows agree.

pub mod metrics;

use crate::config::Config;
use crate::error::{AnonError, Result};
use crate::graph::{build_cost_graph, build_merge_forest, AnonGraph, Decomposer};
use crate::model::{Schema, Table};
use crate::partition::Partition;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// A group of rows that share their identifier partitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowGroup {
    /// Position of the group in the report
    pub id: usize,

    /// Row indices, ascending
    pub members: Vec<usize>,

    /// Number of rows in the group
    pub size: usize,

    /// Level each identifier column converged on; `None` for other columns
    pub levels: Vec<Option<usize>>,

    pub information_loss: f64,
}

impl RowGroup {
    pub fn new(id: usize, members: Vec<usize>, levels: Vec<Option<usize>>, information_loss: f64) -> Self {
        Self {
            id,
            size: members.len(),
            members,
            levels,
            information_loss,
        }
    }
}

/// Outcome of one anonymization run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnonymizationReport {
    pub k: usize,
    pub row_count: usize,
    pub groups: Vec<RowGroup>,

    /// Splits performed by the decomposer
    pub splits: usize,

    /// Steiner vertices introduced by the decomposer
    pub steiner_vertices: usize,
}

/// Partitions chosen for one group, computed before anything is written
struct GroupGeneralization {
    members: Vec<usize>,
    levels: Vec<Option<usize>>,
    partitions: Vec<Option<Partition>>,
}

/// Runs the grouping engine and generalizes a table in place
#[derive(Debug)]
pub struct Anonymizer {
    config: Config,
    rng: StdRng,
}

impl Anonymizer {
    pub fn new(config: Config) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { config, rng }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Make `table` k-anonymous
    ///
    /// The whole table is regrouped on every call, so rows appended after a
    /// previous run are handled together with the already generalized ones.
    /// On error the table is left unchanged.
    pub fn anonymize(&mut self, table: &mut Table) -> Result<AnonymizationReport> {
        let k = self.config.k;
        if k == 0 {
            return Err(AnonError::InvalidK);
        }

        let n = table.len();
        if n == 0 {
            log::info!("Table is empty, nothing to anonymize");
            return Ok(AnonymizationReport {
                k,
                ..Default::default()
            });
        }
        if n < k {
            return Err(AnonError::NotEnoughRows { rows: n, k });
        }

        log::info!("Anonymizing {} rows with k = {}", n, k);

        let (graph, splits) = self.compute_anon_graph(table)?;
        let member_groups = graph.row_groups();
        log::info!("Found {} row groups", member_groups.len());

        let generalized = member_groups
            .into_iter()
            .map(|members| generalize_group(table, members))
            .collect::<Result<Vec<_>>>()?;

        let mut groups = Vec::with_capacity(generalized.len());
        for (id, group) in generalized.into_iter().enumerate() {
            let loss = metrics::information_loss(table.schema(), &group.levels);
            apply_group(table, &group);
            groups.push(RowGroup::new(id, group.members, group.levels, loss));
        }

        log::info!("Anonymization complete");

        Ok(AnonymizationReport {
            k,
            row_count: n,
            groups,
            splits,
            steiner_vertices: graph.steiner_count(),
        })
    }

    /// Build the decomposed grouping graph of a table
    fn compute_anon_graph(&mut self, table: &Table) -> Result<(AnonGraph, usize)> {
        let k = self.config.k;
        let cost_graph = build_cost_graph(table, self.config.parallel_threshold)?;
        let forest = build_merge_forest(&cost_graph, k, &mut self.rng)?;

        let mut graph = forest.undirected();
        let splits = Decomposer::new(&mut graph, k).decompose(&mut self.rng)?;
        Ok((graph, splits))
    }
}

/// Anonymize a table with the default configuration and the given k
pub fn anonymize(table: &mut Table, k: usize) -> Result<AnonymizationReport> {
    Anonymizer::new(Config {
        k,
        ..Default::default()
    })
    .anonymize(table)
}

/// Lowest common level and partition of every identifier column of a group
fn generalize_group(table: &Table, members: Vec<usize>) -> Result<GroupGeneralization> {
    let schema: &Schema = table.schema();
    let rows = table.rows();

    let mut levels = vec![None; schema.len()];
    let mut partitions = vec![None; schema.len()];

    for (idx, column, generalizer) in schema.identifiers() {
        let cells: Vec<&Partition> = members.iter().map(|&row| &rows[row].data[idx]).collect();
        let Some((&first, rest)) = cells.split_first() else {
            continue;
        };

        let converged = (0..generalizer.levels()).find_map(|level| {
            let target = generalizer.generalize(first, level)?;
            rest.iter()
                .all(|cell| generalizer.generalize(cell, level).as_ref() == Some(&target))
                .then_some((level, target))
        });

        let Some((level, partition)) = converged else {
            let other = rest.iter().find(|cell| **cell != first).copied().unwrap_or(first);
            return Err(AnonError::Ungeneralizable {
                column: column.name().to_string(),
                left: first.to_string(),
                right: other.to_string(),
            });
        };

        levels[idx] = Some(level);
        partitions[idx] = Some(partition);
    }

    Ok(GroupGeneralization {
        members,
        levels,
        partitions,
    })
}

fn apply_group(table: &mut Table, group: &GroupGeneralization) {
    let rows = table.rows_mut();
    for &member in &group.members {
        for (idx, partition) in group.partitions.iter().enumerate() {
            if let Some(partition) = partition {
                rows[member].data[idx] = partition.clone();
            }
        }
    }
}
