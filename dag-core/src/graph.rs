//! The canonical, cluster-wide block graph.
//!
//! Each node's report is treated as an untrusted partial observation. Views
//! are unioned keyed by block hash: a hash seen twice must carry identical
//! parents, otherwise the merge fails with
//! [`DagError::ConsistencyViolation`]. There is no "last write wins".
//!
//! Once all views are in, [`DagGraph::validate`] rejects dangling parent
//! references and cycles, and recomputes every height from the roots.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::error::{CorruptReason, DagError};
use crate::hash::BlockHash;
use crate::node::DagNode;

/// Deduplicated, consistency-checked DAG keyed by block hash.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DagGraph {
    nodes: BTreeMap<BlockHash, DagNode>,
    roots: BTreeSet<BlockHash>,
}

impl DagGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge any number of per-node views and validate the result.
    ///
    /// # Errors
    ///
    /// [`DagError::ConsistencyViolation`] if two views disagree on a block,
    /// [`DagError::CorruptDag`] if the union is not a well-formed DAG.
    pub fn merge<I, V>(views: I) -> Result<Self, DagError>
    where
        I: IntoIterator<Item = V>,
        V: IntoIterator<Item = DagNode>,
    {
        let mut graph = Self::new();
        for view in views {
            graph.merge_view(view)?;
        }
        graph.validate()?;
        Ok(graph)
    }

    /// Union one view into the graph without validating.
    ///
    /// Returns how many previously unknown blocks the view contributed.
    pub fn merge_view<V>(&mut self, view: V) -> Result<usize, DagError>
    where
        V: IntoIterator<Item = DagNode>,
    {
        let mut added = 0;
        for node in view {
            if self.insert(node)? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Insert a single block.
    ///
    /// Returns `true` if the block was new, `false` if an identical report
    /// was already present.
    pub fn insert(&mut self, node: DagNode) -> Result<bool, DagError> {
        let node = node.normalized();
        if let Some(existing) = self.nodes.get(&node.hash) {
            if existing.same_structure(&node) {
                return Ok(false);
            }
            return Err(DagError::ConsistencyViolation {
                hash: node.hash,
                existing: existing.parents.clone(),
                reported: node.parents,
            });
        }

        if node.is_root() {
            self.roots.insert(node.hash);
        }
        self.nodes.insert(node.hash, node);
        Ok(true)
    }

    /// Check structural invariants and recompute heights.
    ///
    /// Heights are derived: roots sit at 0, every other block one above its
    /// highest parent.
    pub fn validate(&mut self) -> Result<(), DagError> {
        for node in self.nodes.values() {
            for parent in &node.parents {
                if !self.nodes.contains_key(parent) {
                    return Err(DagError::CorruptDag(CorruptReason::DanglingParent {
                        child: node.hash,
                        parent: *parent,
                    }));
                }
            }
        }

        // Kahn's algorithm over parent -> child edges.
        let mut pending: BTreeMap<BlockHash, usize> = BTreeMap::new();
        let mut children: BTreeMap<BlockHash, Vec<BlockHash>> = BTreeMap::new();
        for node in self.nodes.values() {
            pending.insert(node.hash, node.parents.len());
            for parent in &node.parents {
                children.entry(*parent).or_default().push(node.hash);
            }
        }

        let mut heights: BTreeMap<BlockHash, u64> = BTreeMap::new();
        let mut queue: VecDeque<BlockHash> = self.roots.iter().copied().collect();
        while let Some(hash) = queue.pop_front() {
            let height = self.nodes[&hash]
                .parents
                .iter()
                .map(|p| heights[p] + 1)
                .max()
                .unwrap_or(0);
            heights.insert(hash, height);

            for child in children.get(&hash).into_iter().flatten() {
                if let Some(count) = pending.get_mut(child) {
                    *count -= 1;
                    if *count == 0 {
                        queue.push_back(*child);
                    }
                }
            }
        }

        if let Some(start) = self.nodes.keys().find(|h| !heights.contains_key(h)) {
            return Err(DagError::CorruptDag(CorruptReason::Cycle(
                self.find_cycle_member(*start, &heights),
            )));
        }

        for (hash, height) in heights {
            if let Some(node) = self.nodes.get_mut(&hash) {
                node.height = height;
            }
        }
        Ok(())
    }

    /// Walk unresolved parents until a block repeats.
    ///
    /// Every block left unordered by Kahn's algorithm has at least one
    /// unordered parent, so the walk always closes a loop.
    fn find_cycle_member(&self, start: BlockHash, ordered: &BTreeMap<BlockHash, u64>) -> BlockHash {
        let mut seen = BTreeSet::new();
        let mut current = start;
        while seen.insert(current) {
            let next = self.nodes.get(&current).and_then(|node| {
                node.parents
                    .iter()
                    .find(|p| !ordered.contains_key(p))
                    .copied()
            });
            match next {
                Some(parent) => current = parent,
                None => break,
            }
        }
        current
    }

    /// Number of distinct blocks.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if no block has been merged.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a block by hash.
    pub fn get(&self, hash: &BlockHash) -> Option<&DagNode> {
        self.nodes.get(hash)
    }

    /// True if the block is part of the graph.
    pub fn contains(&self, hash: &BlockHash) -> bool {
        self.nodes.contains_key(hash)
    }

    /// Blocks without parents.
    pub fn roots(&self) -> &BTreeSet<BlockHash> {
        &self.roots
    }

    /// Blocks that no other block references as a parent.
    pub fn tips(&self) -> BTreeSet<BlockHash> {
        let referenced: BTreeSet<&BlockHash> =
            self.nodes.values().flat_map(|n| n.parents.iter()).collect();
        self.nodes
            .keys()
            .filter(|h| !referenced.contains(h))
            .copied()
            .collect()
    }

    /// Highest block height, if the graph is not empty.
    pub fn max_height(&self) -> Option<u64> {
        self.nodes.values().map(|n| n.height).max()
    }

    /// Blocks in ascending (height, hash) order.
    pub fn nodes_by_height(&self) -> Vec<&DagNode> {
        let mut nodes: Vec<&DagNode> = self.nodes.values().collect();
        nodes.sort_by_key(|n| (n.height, n.hash));
        nodes
    }

    /// Every parent link as `(child, parent)`, ordered by child then parent.
    pub fn edges(&self) -> impl Iterator<Item = (BlockHash, BlockHash)> + '_ {
        self.nodes
            .values()
            .flat_map(|n| n.parents.iter().map(move |p| (n.hash, *p)))
    }
}
