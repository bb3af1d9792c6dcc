//! Generalization hierarchies
//!
//! A hierarchy is a full tree of set partitions: the root covers the whole
//! domain, every node contains its children and all leaves sit at the same
//! depth. The level of a node is its height minus one, so leaves are level 0
//! and the root is level `levels() - 1`.

use crate::error::{AnonError, Result};
use crate::generalization::Generalizer;
use crate::partition::{Partition, Value};
use itertools::Itertools;

/// Tree description used to build a [`Hierarchy`]
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub partition: Partition,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(partition: Partition, children: Vec<Node>) -> Self {
        Self { partition, children }
    }

    pub fn leaf(partition: Partition) -> Self {
        Self::new(partition, Vec::new())
    }

    /// Height of the subtree; a leaf has height 1
    pub fn height(&self) -> usize {
        1 + self.children.iter().map(Node::height).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
struct Slot {
    partition: Partition,
    parent: Option<usize>,
    height: usize,
}

/// Validated hierarchy with parent links, stored as a preorder arena
#[derive(Debug, Clone)]
pub struct Hierarchy {
    root: Node,
    slots: Vec<Slot>,
}

impl Hierarchy {
    /// Validate a tree and index it for lookups
    pub fn build(root: Node) -> Result<Self> {
        let levels = root.height();
        validate_depth(&root, 1, levels)?;
        validate_partitions(&root)?;

        let mut slots = Vec::new();
        flatten(&root, None, &mut slots);

        Ok(Self { root, slots })
    }

    /// Split `items` into `n_children` chunks on each level until every
    /// leaf holds a single item
    pub fn auto_build<I, V>(n_children: usize, items: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        if n_children < 2 {
            return Err(AnonError::InvalidHierarchy(
                "nodes need at least two children".to_string(),
            ));
        }

        let items: Vec<Value> = items.into_iter().map(Into::into).unique().collect();
        if items.len() < n_children {
            return Err(AnonError::InvalidHierarchy(format!(
                "{} items cannot be split into {} children",
                items.len(),
                n_children
            )));
        }

        let depth = depth_for(n_children, items.len());
        let children = auto_children(n_children, 1, depth, &items);
        Self::build(Node::new(Partition::set(items), children))
    }

    /// Integer hierarchy built by splitting at the median until every
    /// partition is a single value
    pub fn median_split<I>(items: I) -> Result<Self>
    where
        I: IntoIterator<Item = i64>,
    {
        let mut values: Vec<i64> = items.into_iter().collect();
        values.sort_unstable();
        values.dedup();
        if values.is_empty() {
            return Err(AnonError::InvalidHierarchy(
                "cannot build a hierarchy without items".to_string(),
            ));
        }

        let height = split_height(&values);
        Self::build(median_node(&values, height))
    }

    pub fn levels(&self) -> usize {
        self.slots.first().map_or(0, |slot| slot.height)
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Topmost node holding exactly this partition
    fn find(&self, partition: &Partition) -> Option<usize> {
        self.slots.iter().position(|slot| &slot.partition == partition)
    }

    /// Level of the topmost node equal to `partition`
    pub fn level_of(&self, partition: &Partition) -> Option<usize> {
        self.find(partition).map(|index| self.slots[index].height - 1)
    }

    /// Partition covering `partition` at `level`; a partition already coarser
    /// than `level` is returned unchanged
    pub fn generalize(&self, partition: &Partition, level: usize) -> Option<Partition> {
        if level >= self.levels() {
            return None;
        }

        let mut index = self.find(partition)?;
        let mut current = self.slots[index].height - 1;
        while current < level {
            index = self.slots[index].parent?;
            current += 1;
        }

        Some(self.slots[index].partition.clone())
    }
}

fn validate_depth(node: &Node, depth: usize, levels: usize) -> Result<()> {
    if node.children.is_empty() && depth != levels {
        return Err(AnonError::InvalidHierarchy(format!(
            "leaf {} sits at depth {} of {}, the tree must be full",
            node.partition, depth, levels
        )));
    }
    for child in &node.children {
        validate_depth(child, depth + 1, levels)?;
    }
    Ok(())
}

fn validate_partitions(node: &Node) -> Result<()> {
    for child in &node.children {
        if !node.partition.contains_partition(&child.partition) {
            return Err(AnonError::InvalidHierarchy(format!(
                "{} does not contain child {}",
                node.partition, child.partition
            )));
        }
        validate_partitions(child)?;
    }
    Ok(())
}

fn flatten(node: &Node, parent: Option<usize>, slots: &mut Vec<Slot>) {
    let index = slots.len();
    slots.push(Slot {
        partition: node.partition.clone(),
        parent,
        height: node.height(),
    });
    for child in &node.children {
        flatten(child, Some(index), slots);
    }
}

/// Smallest depth at which chunks of `items` are single values
fn depth_for(split: usize, items: usize) -> usize {
    let mut depth = 0;
    let mut reach = 1usize;
    while reach < items {
        reach = reach.saturating_mul(split);
        depth += 1;
    }
    depth
}

fn chop(split: usize, items: &[Value]) -> Vec<&[Value]> {
    let size = if split >= items.len() {
        1
    } else {
        (items.len() + split - 1) / split
    };
    items.chunks(size).collect()
}

fn auto_children(split: usize, level: usize, depth: usize, items: &[Value]) -> Vec<Node> {
    chop(split, items)
        .into_iter()
        .map(|part| {
            let partition = Partition::set(part.iter().cloned());
            if level >= depth {
                Node::leaf(partition)
            } else {
                Node::new(partition, auto_children(split, level + 1, depth, part))
            }
        })
        .collect()
}

/// Values below the median, then the rest
fn median_halves(values: &[i64]) -> (&[i64], &[i64]) {
    let mid = values.len() / 2;
    let median = if values.len() % 2 == 0 {
        (values[mid - 1] as f64 + values[mid] as f64) / 2.0
    } else {
        values[mid] as f64
    };
    let at = values.partition_point(|&v| (v as f64) < median);
    values.split_at(at)
}

fn split_height(values: &[i64]) -> usize {
    if values.len() <= 1 {
        return 1;
    }
    let (low, high) = median_halves(values);
    1 + split_height(low).max(split_height(high))
}

fn median_node(values: &[i64], height: usize) -> Node {
    let partition = Partition::set(values.iter().copied());
    if height <= 1 {
        return Node::leaf(partition);
    }

    // single values are carried down to keep the tree full
    let children = if values.len() == 1 {
        vec![median_node(values, height - 1)]
    } else {
        let (low, high) = median_halves(values);
        vec![median_node(low, height - 1), median_node(high, height - 1)]
    };
    Node::new(partition, children)
}

/// Generalizer backed by a [`Hierarchy`]
#[derive(Debug, Clone)]
pub struct HierarchyGeneralizer {
    hierarchy: Hierarchy,
}

impl HierarchyGeneralizer {
    pub fn new(hierarchy: Hierarchy) -> Self {
        Self { hierarchy }
    }

    /// Median-split hierarchy over a list of integers
    pub fn from_ints<I>(items: I) -> Result<Self>
    where
        I: IntoIterator<Item = i64>,
    {
        Hierarchy::median_split(items).map(Self::new)
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }
}

impl Generalizer for HierarchyGeneralizer {
    fn generalize(&self, partition: &Partition, level: usize) -> Option<Partition> {
        self.hierarchy.generalize(partition, level)
    }

    fn levels(&self) -> usize {
        self.hierarchy.levels()
    }

    fn init_item(&self, value: Value) -> Partition {
        Partition::set([value])
    }
}
