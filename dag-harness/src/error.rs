//! Error types for cluster orchestration.

use dag_core::DagError;
use dag_render::RenderError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors reported by a [`NodeBackend`](crate::NodeBackend).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The node has been torn down.
    #[error("node {0} is stopped")]
    Stopped(usize),

    /// A node cannot be connected to itself.
    #[error("node {0} cannot connect to itself")]
    SelfConnection(usize),

    /// A fault injected for testing.
    #[error("injected fault: {0}")]
    Injected(String),

    /// The generation task panicked or was aborted.
    #[error("generation task failed: {0}")]
    Task(String),

    /// Any other backend failure.
    #[error("{0}")]
    Other(String),
}

/// Errors that end an orchestration run.
///
/// Every variant is surfaced only after all provisioned nodes have been
/// torn down.
#[derive(Debug, Error)]
pub enum RunError {
    /// The run configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Creating a node failed. Nodes before `index` were torn down.
    #[error("unable to create node {index}: {source}")]
    Provision {
        /// Index of the node that failed to start.
        index: usize,
        /// Backend failure.
        source: BackendError,
    },

    /// Connecting two nodes failed.
    #[error("unable to connect node {a} to node {b}: {source}")]
    Mesh {
        /// First node of the pair.
        a: usize,
        /// Second node of the pair.
        b: usize,
        /// Backend failure.
        source: BackendError,
    },

    /// Block generation failed on at least one node.
    ///
    /// `index` is the lowest failing node; `failed` counts all failures.
    #[error("failed to wait for blocks to generate on node {index} ({failed} of {total} nodes failed): {source}")]
    Generation {
        /// Lowest-indexed failing node.
        index: usize,
        /// Number of nodes that failed.
        failed: usize,
        /// Number of nodes that generated.
        total: usize,
        /// Failure of node `index`.
        source: BackendError,
    },

    /// Reading a node's view of the DAG failed.
    #[error("failed to read dag view from node {index}: {source}")]
    Extraction {
        /// Node whose view could not be read.
        index: usize,
        /// Backend failure.
        source: BackendError,
    },

    /// The merged DAG is inconsistent or corrupt.
    #[error("failed to build canonical dag: {0}")]
    Dag(#[from] DagError),

    /// Rendering or saving the document failed.
    #[error("failed to render dag: {0}")]
    Render(#[from] RenderError),
}

impl RunError {
    /// Node index the error refers to, where there is one.
    pub fn node_index(&self) -> Option<usize> {
        match self {
            RunError::Provision { index, .. }
            | RunError::Generation { index, .. }
            | RunError::Extraction { index, .. } => Some(*index),
            _ => None,
        }
    }
}
