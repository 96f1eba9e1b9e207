//! Dimension-subset lattice
//!
//! All non-empty subsets of {0..D-1} arranged as a DAG: level 0 holds the
//! full set, level D-1 the singletons, and each node's children are the
//! subsets obtained by deleting one element. A subset is reachable from
//! several supersets, so this is a true DAG and nodes live in an arena
//! addressed by index rather than in owned tree structures.
//!
//! Pruning is a one-direction reachability closure: mark a node, then walk
//! either all ancestors or all descendants, skipping anything already
//! marked. The skip is what keeps repeated pruning decisions from re-walking
//! shared ancestry.

use fnv::FnvHashMap;

/// Direction of a pruning walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Walk parent edges toward the full set
    Ancestors,
    /// Walk child edges toward the singletons
    Descendants,
}

/// Arena index of a lattice node
pub type NodeId = usize;

/// One dimension subset in the lattice
#[derive(Debug)]
pub struct LatticeNode {
    subset: Vec<usize>,
    parents: Vec<NodeId>,
    children: Vec<NodeId>,
    pruned: bool,
    /// Lower bound on superset occurrence counts, propagated top-down by
    /// bounded pruning; 0 until the first propagation reaches the node
    bound_hint: usize,
}

impl LatticeNode {
    fn new(subset: Vec<usize>) -> Self {
        Self {
            subset,
            parents: Vec::new(),
            children: Vec::new(),
            pruned: false,
            bound_hint: 0,
        }
    }

    /// Canonical (ascending) dimension subset
    pub fn subset(&self) -> &[usize] {
        &self.subset
    }

    pub fn parents(&self) -> &[NodeId] {
        &self.parents
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Monotone pruned flag: once set it is never reversed
    pub fn is_pruned(&self) -> bool {
        self.pruned
    }

    pub fn bound_hint(&self) -> usize {
        self.bound_hint
    }
}

/// Subset lattice for a fixed dimensionality
///
/// Built fresh per candidate interval and discarded afterward; prune marks
/// never need resetting.
pub struct Lattice {
    nodes: Vec<LatticeNode>,
    /// Node ids per level, in creation order
    levels: Vec<Vec<NodeId>>,
    num_dimensions: usize,
}

impl Lattice {
    /// Build the full lattice for `num_dimensions` sensor dimensions
    ///
    /// Creates exactly 2^D − 1 nodes in O(2^D · D): one pass per level to
    /// create children and wire both edge directions.
    pub fn build(num_dimensions: usize) -> Self {
        assert!(num_dimensions > 0, "lattice needs at least one dimension");

        let mut nodes = Vec::new();
        let mut levels: Vec<Vec<NodeId>> = Vec::with_capacity(num_dimensions);
        let mut ids_by_subset: FnvHashMap<Vec<usize>, NodeId> = FnvHashMap::default();

        let full: Vec<usize> = (0..num_dimensions).collect();
        nodes.push(LatticeNode::new(full));
        ids_by_subset.insert(nodes[0].subset.clone(), 0);
        levels.push(vec![0]);

        for level in 1..num_dimensions {
            let mut level_ids = Vec::new();

            for parent_pos in 0..levels[level - 1].len() {
                let parent_id = levels[level - 1][parent_pos];
                let parent_subset = nodes[parent_id].subset.clone();

                // Deleting the last element first keeps one parent's
                // children in ascending order; levels list nodes in
                // first-reached order
                for removed in (0..parent_subset.len()).rev() {
                    let mut child_subset = parent_subset.clone();
                    child_subset.remove(removed);

                    let child_id = match ids_by_subset.get(&child_subset) {
                        Some(&id) => id,
                        None => {
                            let id = nodes.len();
                            nodes.push(LatticeNode::new(child_subset.clone()));
                            ids_by_subset.insert(child_subset, id);
                            level_ids.push(id);
                            id
                        }
                    };

                    nodes[parent_id].children.push(child_id);
                    nodes[child_id].parents.push(parent_id);
                }
            }

            levels.push(level_ids);
        }

        Self {
            nodes,
            levels,
            num_dimensions,
        }
    }

    /// Total node count, pruned or not: 2^D − 1
    pub fn num_nodes(&self) -> usize {
        (1 << self.num_dimensions) - 1
    }

    pub fn num_dimensions(&self) -> usize {
        self.num_dimensions
    }

    /// Node ids at a level; level 0 is the full set, level D-1 the singletons
    pub fn level_nodes(&self, level: usize) -> &[NodeId] {
        &self.levels[level]
    }

    pub fn node(&self, id: NodeId) -> &LatticeNode {
        &self.nodes[id]
    }

    /// Find a node by its canonical subset (test and diagnostic helper)
    pub fn find(&self, subset: &[usize]) -> Option<NodeId> {
        self.nodes.iter().position(|node| node.subset == subset)
    }

    /// Raise a node's bound hint; hints only ever tighten upward
    pub fn raise_bound_hint(&mut self, id: NodeId, hint: usize) {
        let node = &mut self.nodes[id];
        if node.bound_hint < hint {
            node.bound_hint = hint;
        }
    }

    /// Prune a node and the reachability closure in one direction
    ///
    /// Returns the number of newly pruned nodes; an already-pruned starting
    /// node short-circuits to 0 without walking anything. The walk uses an
    /// explicit stack so closure depth never depends on dimensionality.
    pub fn prune(&mut self, id: NodeId, direction: Direction) -> usize {
        if self.nodes[id].pruned {
            return 0;
        }

        let mut newly_pruned = 0;
        let mut stack = vec![id];

        while let Some(current) = stack.pop() {
            if self.nodes[current].pruned {
                continue;
            }
            self.nodes[current].pruned = true;
            newly_pruned += 1;

            let next = match direction {
                Direction::Ancestors => &self.nodes[current].parents,
                Direction::Descendants => &self.nodes[current].children,
            };
            for &neighbor in next {
                if !self.nodes[neighbor].pruned {
                    stack.push(neighbor);
                }
            }
        }

        newly_pruned
    }
}
