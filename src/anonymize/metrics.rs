//! Group statistics and information loss

use crate::anonymize::AnonymizationReport;
use crate::model::{Schema, Table};
use crate::partition::Partition;
use serde::{Deserialize, Serialize};

/// Information loss of a group: the weighted sum over identifier columns of
/// the level the group converged on, relative to the top level
pub fn information_loss(schema: &Schema, levels: &[Option<usize>]) -> f64 {
    schema
        .identifiers()
        .map(|(idx, column, generalizer)| {
            let top = generalizer.levels().saturating_sub(1).max(1) as f64;
            let level = levels.get(idx).copied().flatten().unwrap_or(0) as f64;
            column.weight() * level / top
        })
        .sum()
}

/// Sizes of the equivalence classes of a table: rows sharing every
/// identifier partition, largest class first
///
/// Rows are compared with partition equality, so `-0.0` and `0.0` bounds
/// fall into the same class.
pub fn equivalence_classes(table: &Table) -> Vec<usize> {
    let identifiers: Vec<usize> = table.schema().identifiers().map(|(idx, _, _)| idx).collect();

    let mut classes: Vec<(Vec<&Partition>, usize)> = Vec::new();
    for row in table.rows() {
        let key: Vec<&Partition> = identifiers.iter().map(|&idx| &row.data[idx]).collect();
        match classes.iter_mut().find(|(class, _)| *class == key) {
            Some((_, size)) => *size += 1,
            None => classes.push((key, 1)),
        }
    }

    let mut sizes: Vec<usize> = classes.into_iter().map(|(_, size)| size).collect();
    sizes.sort_unstable_by(|a, b| b.cmp(a));
    sizes
}

/// Whether every row shares its identifier partitions with at least k-1
/// other rows
pub fn is_k_anonymous(table: &Table, k: usize) -> bool {
    equivalence_classes(table).iter().all(|&size| size >= k)
}

/// Aggregate statistics over the groups of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub row_count: usize,
    pub group_count: usize,
    pub smallest_group: usize,
    pub largest_group: usize,
    pub avg_group_size: f64,
    pub total_information_loss: f64,
    pub avg_information_loss: f64,
    pub steiner_vertices: usize,
}

/// Summarize a report
pub fn summarize(report: &AnonymizationReport) -> Summary {
    let groups = &report.groups;
    let divisor = if groups.is_empty() { 1.0 } else { groups.len() as f64 };
    let total_loss: f64 = groups.iter().map(|g| g.information_loss).sum();

    Summary {
        row_count: report.row_count,
        group_count: groups.len(),
        smallest_group: groups.iter().map(|g| g.size).min().unwrap_or(0),
        largest_group: groups.iter().map(|g| g.size).max().unwrap_or(0),
        avg_group_size: groups.iter().map(|g| g.size).sum::<usize>() as f64 / divisor,
        total_information_loss: total_loss,
        avg_information_loss: total_loss / divisor,
        steiner_vertices: report.steiner_vertices,
    }
}
