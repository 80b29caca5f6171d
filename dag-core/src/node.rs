//! A single block as reported by one node.

use std::collections::BTreeSet;

use crate::hash::BlockHash;

/// A block in the DAG.
///
/// `parents` is an ordered set: it is kept sorted and free of duplicates so
/// two reports of the same block can be compared structurally.
/// `height` is whatever the reporting node believed; the merged graph
/// recomputes it and never trusts the reported value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DagNode {
    /// Block identity.
    pub hash: BlockHash,
    /// Parent block identities (sorted, deduplicated).
    pub parents: Vec<BlockHash>,
    /// Distance from the furthest root.
    pub height: u64,
}

impl DagNode {
    /// Create a block with the given parents.
    pub fn new(hash: BlockHash, parents: impl IntoIterator<Item = BlockHash>, height: u64) -> Self {
        Self {
            hash,
            parents: parents.into_iter().collect(),
            height,
        }
        .normalized()
    }

    /// Sort and deduplicate `parents`, for blocks built field by field.
    pub fn normalized(mut self) -> Self {
        self.parents.sort();
        self.parents.dedup();
        self
    }

    /// Create a parentless block at height 0.
    pub fn genesis(hash: BlockHash) -> Self {
        Self {
            hash,
            parents: Vec::new(),
            height: 0,
        }
    }

    /// True if this block has no parents.
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// True if both reports describe the same block structure.
    ///
    /// Parents are compared as sets. Heights are derived data and are not
    /// compared.
    pub fn same_structure(&self, other: &DagNode) -> bool {
        let ours: BTreeSet<&BlockHash> = self.parents.iter().collect();
        let theirs: BTreeSet<&BlockHash> = other.parents.iter().collect();
        self.hash == other.hash && ours == theirs
    }
}
