//! Error types for DAG merging and validation.

use crate::hash::BlockHash;
use thiserror::Error;

/// Errors raised while building the canonical graph.
#[derive(Debug, Error)]
pub enum DagError {
    /// Two nodes reported different parent sets for the same block.
    #[error("consistency violation: nodes disagree on the parents of block {hash}")]
    ConsistencyViolation {
        /// The block both views contain.
        hash: BlockHash,
        /// Parents already recorded in the merged graph.
        existing: Vec<BlockHash>,
        /// Parents reported by the conflicting view.
        reported: Vec<BlockHash>,
    },

    /// The merged graph breaks a structural invariant.
    #[error("corrupt dag: {0}")]
    CorruptDag(CorruptReason),
}

/// Why a merged graph was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorruptReason {
    /// A block references a parent that no view reported.
    #[error("block {child} references unknown parent {parent}")]
    DanglingParent {
        /// Block holding the reference.
        child: BlockHash,
        /// Missing parent.
        parent: BlockHash,
    },

    /// The parent links form a cycle through this block.
    #[error("cycle through block {0}")]
    Cycle(BlockHash),
}
