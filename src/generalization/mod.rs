//! Generalizers: per-column strategies for coarsening values

pub mod hierarchy;
pub mod prefix;
pub mod range;

pub use hierarchy::{Hierarchy, HierarchyGeneralizer, Node};
pub use prefix::PrefixGeneralizer;
pub use range::{FloatRangeGeneralizer, IntRangeGeneralizer};

use crate::partition::{Partition, Value};
use std::fmt;

/// Maps a partition to its coarser version at a given level
///
/// Level 0 is the original value and `levels() - 1` the coarsest level.
/// `generalize` returns `None` when the partition is unknown to the
/// generalizer or the level is out of range.
pub trait Generalizer: fmt::Debug + Send + Sync {
    fn generalize(&self, partition: &Partition, level: usize) -> Option<Partition>;

    /// Number of levels, including level 0
    fn levels(&self) -> usize;

    /// Initial partition for a raw value entering the table
    fn init_item(&self, value: Value) -> Partition {
        Partition::Item(value)
    }
}

/// Two-level generalizer: the value itself, then `*`
#[derive(Debug, Clone, Copy, Default)]
pub struct Suppressor;

impl Generalizer for Suppressor {
    fn generalize(&self, partition: &Partition, level: usize) -> Option<Partition> {
        match level {
            0 => Some(partition.clone()),
            1 => Some(Partition::suppressed()),
            _ => None,
        }
    }

    fn levels(&self) -> usize {
        2
    }
}
