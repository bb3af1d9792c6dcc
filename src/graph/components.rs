//! Connected components via union-find

/// Union-Find data structure for connected component analysis
#[derive(Debug, Clone)]
pub struct DisjointSets {
    /// Parent pointers (parent[i] = parent of node i)
    parent: Vec<usize>,

    /// Size of each set, valid for roots only
    size: Vec<usize>,
}

impl DisjointSets {
    /// Create a new DisjointSets data structure
    pub fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            size: vec![1; size],
        }
    }

    /// Find the root of the set containing x with path compression
    pub fn find(&mut self, x: usize) -> usize {
        let px = self.parent[x];
        if px != x {
            self.parent[x] = self.find(px);
        }
        self.parent[x]
    }

    /// Union the sets containing x and y
    pub fn union(&mut self, x: usize, y: usize) {
        let root_x = self.find(x);
        let root_y = self.find(y);

        if root_x == root_y {
            return;
        }

        // attach the smaller tree under the root of the larger one
        if self.size[root_x] > self.size[root_y] {
            self.parent[root_y] = root_x;
            self.size[root_x] += self.size[root_y];
        } else {
            self.parent[root_x] = root_y;
            self.size[root_y] += self.size[root_x];
        }
    }

    /// Get the size of the set containing x
    pub fn size(&mut self, x: usize) -> usize {
        let root = self.find(x);
        self.size[root]
    }

    /// All sets, each sorted, ordered by their smallest member
    pub fn groups(&mut self) -> Vec<Vec<usize>> {
        let mut slot_of_root = vec![usize::MAX; self.parent.len()];
        let mut groups: Vec<Vec<usize>> = Vec::new();

        for node in 0..self.parent.len() {
            let root = self.find(node);
            if slot_of_root[root] == usize::MAX {
                slot_of_root[root] = groups.len();
                groups.push(Vec::new());
            }
            groups[slot_of_root[root]].push(node);
        }

        groups
    }
}

/// Components of a graph given as an edge list over `0..node_count`
pub fn connected_components<I>(node_count: usize, edges: I) -> Vec<Vec<usize>>
where
    I: IntoIterator<Item = (usize, usize)>,
{
    let mut sets = DisjointSets::new(node_count);
    for (a, b) in edges {
        sets.union(a, b);
    }
    sets.groups()
}
