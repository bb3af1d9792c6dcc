//! Splitting oversized components
//!
//! A component whose real size `s` exceeds `threshold(k)` is split in two
//! pieces of real size at least k. The split point is found by walking from
//! a random vertex towards the largest sub-tree until the rest of the
//! component holds at least `k - 1` rows. Steiner vertices keep detached
//! sub-trees connected to each other so the pieces stay trees.

use crate::error::{AnonError, Result};
use crate::graph::anon_graph::{AnonGraph, VertexId};
use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Reverse;

/// Largest real size a component may keep: `max(2k - 1, 3k - 5)`
pub fn threshold(k: usize) -> usize {
    (2 * k).saturating_sub(1).max((3 * k).saturating_sub(5))
}

/// How a component was split
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutType {
    /// Both sides of the edge `(u, v)` are large enough; the edge is removed
    A,

    /// The side of `u` holds `k - 1` rows and takes `v` along
    B,

    /// The sub-tree of `v` holds `k - 1` rows and takes `u` along
    C,

    /// The sub-trees of `u` are regrouped onto two sides
    D,

    /// A depth-first prefix of exactly k rows is cut out
    Prefix,
}

/// A component of the graph with one vertex removed
#[derive(Debug, Clone)]
pub(crate) struct SubTree {
    /// Neighbour of the removed vertex inside this sub-tree
    pub root: VertexId,
    pub real: usize,
}

/// Edge chosen by the split walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SplitPoint {
    pub u: VertexId,
    pub v: VertexId,
    /// Real size of the sub-tree rooted at `v`
    pub t: usize,
}

/// Splits every component above the threshold until none is left
pub struct Decomposer<'g> {
    graph: &'g mut AnonGraph,
    k: usize,
}

impl<'g> Decomposer<'g> {
    pub fn new(graph: &'g mut AnonGraph, k: usize) -> Self {
        Self { graph, k }
    }

    pub fn threshold(&self) -> usize {
        threshold(self.k)
    }

    /// Split components until each holds at most `threshold(k)` rows;
    /// returns the number of splits performed
    pub fn decompose<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<usize> {
        if self.k == 0 {
            return Err(AnonError::InvalidK);
        }

        let limit = self.threshold();
        log::info!("Decomposing components above {} rows", limit);

        let mut splits = 0;
        while let Some(component) = self.pick_component(limit) {
            let cut = self.partition_component(&component, rng)?;
            splits += 1;
            log::debug!(
                "Split component of {} rows with a type {:?} cut",
                self.graph.real_size(&component),
                cut
            );
        }

        log::info!(
            "Decomposition finished after {} splits, {} Steiner vertices",
            splits,
            self.graph.steiner_count()
        );
        Ok(splits)
    }

    /// First component with more than `limit` rows
    pub(crate) fn pick_component(&self, limit: usize) -> Option<Vec<VertexId>> {
        self.graph
            .connected_components()
            .into_iter()
            .find(|c| self.graph.real_size(c) > limit)
    }

    fn partition_component<R: Rng + ?Sized>(
        &mut self,
        component: &[VertexId],
        rng: &mut R,
    ) -> Result<CutType> {
        let k = self.k;
        let s = self.graph.real_size(component);
        let SplitPoint { u, v, t } = self.split_point(component, rng)?;

        if t >= k && s - t >= k {
            self.cut_type_a(u, v);
            return Ok(CutType::A);
        }
        if s - t == k - 1 && self.graph.is_row(v) {
            self.cut_type_b(u, v);
            return Ok(CutType::B);
        }
        if t == k - 1 && self.graph.is_row(u) {
            self.cut_type_c(u, v);
            return Ok(CutType::C);
        }
        if self.cut_type_d(u, s) {
            return Ok(CutType::D);
        }

        self.cut_prefix(u)?;
        Ok(CutType::Prefix)
    }

    /// Walk towards the largest sub-tree until the rest of the component
    /// holds at least `k - 1` rows
    pub(crate) fn split_point<R: Rng + ?Sized>(
        &self,
        component: &[VertexId],
        rng: &mut R,
    ) -> Result<SplitPoint> {
        let s = self.graph.real_size(component);
        let mut u = *component
            .choose(rng)
            .ok_or_else(|| AnonError::Invariant("cannot split an empty component".to_string()))?;

        // the walk never revisits a vertex, so it ends within |C| steps
        for _ in 0..=component.len() {
            let largest = self
                .sub_trees(u)
                .into_iter()
                .min_by_key(|st| (Reverse(st.real), st.root))
                .ok_or_else(|| {
                    AnonError::Invariant(format!("vertex {} of an oversized component is isolated", u))
                })?;

            if s - largest.real >= self.k - 1 {
                return Ok(SplitPoint {
                    u,
                    v: largest.root,
                    t: largest.real,
                });
            }
            u = largest.root;
        }

        Err(AnonError::Invariant("split walk did not settle on an edge".to_string()))
    }

    /// Components left when `u` is removed, one per neighbour
    pub(crate) fn sub_trees(&self, u: VertexId) -> Vec<SubTree> {
        self.graph
            .neighbors(u)
            .into_iter()
            .map(|root| {
                let members = self.graph.reachable_without(root, Some(u));
                SubTree {
                    root,
                    real: self.graph.real_size(&members),
                }
            })
            .collect()
    }

    pub(crate) fn cut_type_a(&mut self, u: VertexId, v: VertexId) {
        self.graph.remove_edge(u, v);
    }

    /// Keep `v` attached to `u` only, its other sub-trees move to a new
    /// Steiner vertex
    pub(crate) fn cut_type_b(&mut self, u: VertexId, v: VertexId) {
        let detached = self
            .sub_trees(v)
            .into_iter()
            .filter(|st| st.root != u)
            .map(|st| (v, st))
            .collect();
        self.detach(detached);
    }

    pub(crate) fn cut_type_c(&mut self, u: VertexId, v: VertexId) {
        self.cut_type_b(v, u);
    }

    /// Keep a group of u's sub-trees on `u` so that its side holds at least
    /// k rows, and move the others off; false when no such group exists
    pub(crate) fn cut_type_d(&mut self, u: VertexId, s: usize) -> bool {
        let sub_trees = self.sub_trees(u);
        let own = usize::from(self.graph.is_row(u));
        let low = self.k.saturating_sub(own);
        let Some(high) = s.checked_sub(own + self.k) else {
            return false;
        };
        if low > high {
            return false;
        }

        let sizes: Vec<usize> = sub_trees.iter().map(|st| st.real).collect();
        let Some(keep) = subset_with_sum_in(&sizes, low, high) else {
            return false;
        };

        let detached = sub_trees
            .into_iter()
            .enumerate()
            .filter(|(idx, _)| !keep.contains(idx))
            .map(|(_, st)| (u, st))
            .collect();
        self.detach(detached);
        true
    }

    /// Keep the depth-first prefix of exactly k rows starting at `u`
    /// together; every other piece moves to a new Steiner vertex
    pub(crate) fn cut_prefix(&mut self, u: VertexId) -> Result<()> {
        let mut in_prefix = vec![false; self.graph.node_count()];
        let mut seen = vec![false; self.graph.node_count()];
        let mut prefix = Vec::new();
        let mut real = 0;

        seen[u] = true;
        let mut stack = vec![u];
        while let Some(x) = stack.pop() {
            in_prefix[x] = true;
            prefix.push(x);
            if self.graph.is_row(x) {
                real += 1;
                if real == self.k {
                    break;
                }
            }
            for next in self.graph.neighbors(x).into_iter().rev() {
                if !seen[next] {
                    seen[next] = true;
                    stack.push(next);
                }
            }
        }

        if real < self.k {
            return Err(AnonError::Invariant(format!(
                "component around {} holds only {} rows",
                u, real
            )));
        }

        let mut detached = Vec::new();
        for &p in &prefix {
            for q in self.graph.neighbors(p) {
                if in_prefix[q] {
                    continue;
                }
                let members = self.graph.reachable_without(q, Some(p));
                let real = self.graph.real_size(&members);
                detached.push((p, SubTree { root: q, real }));
            }
        }
        self.detach(detached);
        Ok(())
    }

    /// Cut each `(anchor, sub-tree)` edge and join the detached sub-trees
    /// under a fresh Steiner vertex
    ///
    /// Sub-trees without rows stay where they are. A single detached
    /// sub-tree is just cut off.
    fn detach(&mut self, cuts: Vec<(VertexId, SubTree)>) {
        let roots: Vec<VertexId> = cuts
            .into_iter()
            .filter(|(_, st)| st.real > 0)
            .map(|(anchor, st)| {
                self.graph.remove_edge(anchor, st.root);
                st.root
            })
            .collect();

        if roots.len() < 2 {
            return;
        }

        let steiner = self.graph.add_steiner();
        log::debug!("Joining {} sub-trees under Steiner vertex {}", roots.len(), steiner);
        for root in roots {
            self.graph.add_edge(steiner, root);
        }
    }
}

/// Indices of a subset of `sizes` whose sum is the smallest reachable value
/// in `low..=high`
///
/// Zero sizes are never picked.
pub(crate) fn subset_with_sum_in(sizes: &[usize], low: usize, high: usize) -> Option<Vec<usize>> {
    if low > high {
        return None;
    }

    // from[sum] = item that first reached `sum`
    let mut reachable = vec![false; high + 1];
    let mut from: Vec<Option<usize>> = vec![None; high + 1];
    reachable[0] = true;

    for (idx, &size) in sizes.iter().enumerate() {
        if size == 0 || size > high {
            continue;
        }
        for sum in (size..=high).rev() {
            if reachable[sum - size] && !reachable[sum] {
                reachable[sum] = true;
                from[sum] = Some(idx);
            }
        }
    }

    let target = (low..=high).find(|&sum| reachable[sum])?;
    let mut picked = Vec::new();
    let mut sum = target;
    while sum > 0 {
        let idx = from[sum]?;
        picked.push(idx);
        sum -= sizes[idx];
    }
    Some(picked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    //                   ---------- 0 ---------------------------------
    //                   |                      |          |           |
    //         --------- 1 ---------          - 5 -      - 6 -       - 7 -
    //         |         |          |        |     |     |     |    |     |
    //       - 2 -     - 3 -      - 4 -     14    15    16     17  18     19
    //      |     |   |     |    |     |
    //      8     9  10     11  12     13
    fn graph1() -> AnonGraph {
        AnonGraph::from_edges(
            20,
            [
                (0, 1), (1, 2), (1, 3), (1, 4), (2, 8), (2, 9), (3, 10), (3, 11), (4, 12),
                (4, 13), (0, 5), (0, 6), (0, 7), (5, 14), (5, 15), (6, 16), (6, 17), (7, 18),
                (7, 19),
            ],
        )
    }

    //            ------- 0 ------
    //           |                |
    //      ---- 1 ----           6
    //     |     |     |          |
    //     2     3     4          7
    //           |
    //           5
    fn graph2() -> AnonGraph {
        AnonGraph::from_edges(8, [(0, 1), (1, 2), (1, 3), (1, 4), (3, 5), (0, 6), (6, 7)])
    }

    //         ------ 0 -------
    //        |    |      |    |
    //        1    3      5    7
    //        |    |      |    |
    //        2    4      6    8
    fn graph3() -> AnonGraph {
        AnonGraph::from_edges(9, [(0, 1), (0, 3), (0, 5), (0, 7), (1, 2), (3, 4), (5, 6), (7, 8)])
    }

    fn assert_bounded(graph: &AnonGraph, k: usize) {
        for component in graph.connected_components() {
            let real = graph.real_size(&component);
            assert!(real >= k, "component {:?} holds {} rows", component, real);
            assert!(real <= threshold(k), "component {:?} holds {} rows", component, real);
        }
    }

    /// Random tree: every row after the first links to an earlier one
    fn random_tree(n: usize, rng: &mut StdRng) -> AnonGraph {
        AnonGraph::from_edges(n, (1..n).map(|v| (v, rng.gen_range(0..v))).collect::<Vec<_>>())
    }

    #[test]
    fn test_threshold() {
        let expected = [(1, 1), (2, 3), (3, 5), (4, 7), (5, 10), (6, 13), (7, 16)];
        for (k, t) in expected {
            assert_eq!(threshold(k), t, "threshold({})", k);
        }
        assert_eq!(threshold(0), 0);
    }

    // 0 -- 1
    // 2 -- 3 -- 4
    // 5 -- 6
    #[test]
    fn test_pick_component_nothing_to_pick() {
        let mut g = AnonGraph::from_edges(7, [(0, 1), (2, 3), (3, 4), (5, 6)]);
        let d = Decomposer::new(&mut g, 2);
        assert_eq!(d.pick_component(d.threshold()), None);
    }

    // 0 -- 1
    // 2 -- 3 -- 4 -- 5
    // 6 -- 7
    #[test]
    fn test_pick_component_above_threshold() {
        let mut g = AnonGraph::from_edges(8, [(0, 1), (2, 3), (3, 4), (4, 5), (6, 7)]);
        let d = Decomposer::new(&mut g, 2);
        assert_eq!(d.pick_component(d.threshold()), Some(vec![2, 3, 4, 5]));
    }

    // 0 -- 1 -- s -- 2
    #[test]
    fn test_pick_component_skips_steiner_vertices() {
        let mut g = AnonGraph::from_edges(3, [(0, 1)]);
        let s = g.add_steiner();
        g.add_edge(s, 1);
        g.add_edge(s, 2);
        let d = Decomposer::new(&mut g, 2);
        assert_eq!(d.pick_component(d.threshold()), None);
    }

    #[test]
    fn test_decompose_terminates_when_finished() {
        let mut g = AnonGraph::with_rows(2);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(Decomposer::new(&mut g, 2).decompose(&mut rng).unwrap(), 0);
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn test_decompose_rejects_zero_k() {
        let mut g = graph1();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            Decomposer::new(&mut g, 0).decompose(&mut rng),
            Err(AnonError::InvalidK)
        ));
    }

    #[test]
    fn test_decompose_graph1() {
        for k in 2..=6 {
            for seed in 0..8 {
                let mut g = graph1();
                let mut rng = StdRng::seed_from_u64(seed);
                let splits = Decomposer::new(&mut g, k).decompose(&mut rng).unwrap();
                assert!(splits > 0);
                assert_bounded(&g, k);
                assert_eq!(g.row_groups().iter().map(Vec::len).sum::<usize>(), 20);
            }
        }
    }

    #[test]
    fn test_decompose_random_trees() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..40 {
            let n = rng.gen_range(1..80);
            let k = rng.gen_range(1..=n.min(8));
            let mut g = random_tree(n, &mut rng);
            Decomposer::new(&mut g, k).decompose(&mut rng).unwrap();
            assert_bounded(&g, k);

            let mut rows: Vec<usize> = g.row_groups().into_iter().flatten().collect();
            rows.sort_unstable();
            assert_eq!(rows, (0..n).collect::<Vec<_>>());
        }
    }

    //   -- 0 --
    //  |       |
    //  1       3
    //  |
    //  2
    #[test]
    fn test_type_a_cut() {
        let mut g = AnonGraph::from_edges(4, [(0, 1), (0, 3), (1, 2)]);
        Decomposer::new(&mut g, 2).cut_type_a(0, 1);
        assert!(!g.has_edge(0, 1));
        assert_eq!(g.connected_components(), vec![vec![0, 3], vec![1, 2]]);
    }

    #[test]
    fn test_type_b_cut() {
        let mut g = graph2();
        Decomposer::new(&mut g, 4).cut_type_b(0, 1);
        assert_eq!(g.neighbors(1), vec![0]);
        assert_eq!(g.neighbors(8), vec![2, 3, 4]);
        assert!(!g.is_row(8));
        assert_eq!(g.connected_components(), vec![vec![0, 1, 6, 7], vec![2, 3, 4, 5, 8]]);
    }

    // graph2 seen from 1: the sub-tree of 0 holds k - 1 rows
    #[test]
    fn test_type_c_cut() {
        let mut g = graph2();
        Decomposer::new(&mut g, 4).cut_type_c(1, 0);
        assert_eq!(g.neighbors(1), vec![0]);
        assert_eq!(g.neighbors(8), vec![2, 3, 4]);
    }

    #[test]
    fn test_type_d_cut() {
        let mut g = graph3();
        assert!(Decomposer::new(&mut g, 4).cut_type_d(0, 9));

        let components = g.connected_components();
        assert_eq!(components.len(), 2);
        assert!(components.iter().all(|c| c.len() == 5));
        assert_eq!(g.steiner_count(), 1);
        assert_eq!(g.degree(9), 2);
        let real: Vec<usize> = components.iter().map(|c| g.real_size(c)).collect();
        assert!(real.contains(&5) && real.contains(&4));
    }

    #[test]
    fn test_type_d_without_valid_group() {
        // Steiner hub with three chains of two rows, k = 3
        let mut g = AnonGraph::from_edges(6, [(0, 1), (2, 3), (4, 5)]);
        let hub = g.add_steiner();
        for root in [0, 2, 4] {
            g.add_edge(hub, root);
        }
        assert!(!Decomposer::new(&mut g, 3).cut_type_d(hub, 6));
        assert_eq!(g.edge_count(), 6);
    }

    #[test]
    fn test_prefix_cut_on_steiner_hub() {
        let mut g = AnonGraph::from_edges(6, [(0, 1), (2, 3), (4, 5)]);
        let hub = g.add_steiner();
        for root in [0, 2, 4] {
            g.add_edge(hub, root);
        }
        Decomposer::new(&mut g, 3).cut_prefix(hub).unwrap();

        assert_bounded(&g, 3);
        assert_eq!(g.steiner_count(), 2);
        assert_eq!(g.row_groups(), vec![vec![0, 1, 2], vec![3, 4, 5]]);
    }

    #[test]
    fn test_decompose_steiner_hub() {
        for seed in 0..10 {
            let mut g = AnonGraph::from_edges(6, [(0, 1), (2, 3), (4, 5)]);
            let hub = g.add_steiner();
            for root in [0, 2, 4] {
                g.add_edge(hub, root);
            }
            let mut rng = StdRng::seed_from_u64(seed);
            Decomposer::new(&mut g, 3).decompose(&mut rng).unwrap();
            assert_bounded(&g, 3);
        }
    }

    #[test]
    fn test_split_point_balances_sides() {
        let g = graph1();
        let k = 3;
        let mut graph = g.clone();
        let d = Decomposer::new(&mut graph, k);
        let component: Vec<usize> = (0..20).collect();
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let SplitPoint { u, v, t } = d.split_point(&component, &mut rng).unwrap();
            assert!(g.has_edge(u, v));
            assert!(20 - t >= k - 1);
        }
    }

    #[test]
    fn test_subset_with_sum_in() {
        assert_eq!(subset_with_sum_in(&[2, 2, 2, 2], 3, 4), Some(vec![1, 0]));
        assert_eq!(subset_with_sum_in(&[2, 2, 2], 3, 3), None);
        assert_eq!(subset_with_sum_in(&[5, 1, 3], 4, 4), Some(vec![2, 1]));
        assert_eq!(subset_with_sum_in(&[0, 3], 0, 2), Some(vec![]));
        assert_eq!(subset_with_sum_in(&[1], 3, 2), None);
    }
}
