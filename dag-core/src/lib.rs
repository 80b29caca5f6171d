//! # dag-core
//!
//! Pure block-DAG logic for dagviz (no I/O, instant tests).
//!
//! Every node of a test cluster only knows the blocks it has seen. This
//! crate turns those partial observations into one canonical graph:
//!
//! - [`BlockHash`] / [`DagNode`] describe a single block as reported by a node
//! - [`DagGraph::merge`] unions per-node views keyed by hash, rejecting
//!   structural disagreement between nodes
//! - [`DagGraph::validate`] checks the merged graph is acyclic and has no
//!   dangling parent references, then derives heights
//!
//! Merging is a commutative, associative reduction: the order in which
//! views are fed in never changes the result.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod graph;
pub mod hash;
pub mod node;

pub use error::{CorruptReason, DagError};
pub use graph::DagGraph;
pub use hash::BlockHash;
pub use node::DagNode;
