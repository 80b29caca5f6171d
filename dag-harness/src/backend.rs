//! Node backend abstraction.
//!
//! The orchestrator never talks to a node directly. A backend owns node
//! creation, peer connections, block generation, DAG queries and teardown,
//! so the same pipeline can drive in-process simulated nodes or real
//! daemons.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use dag_core::{BlockHash, DagNode};

use crate::error::BackendError;

/// An in-flight block generation request.
///
/// Resolves to the hashes of the generated blocks.
pub type GenerateFuture =
    Pin<Box<dyn Future<Output = Result<Vec<BlockHash>, BackendError>> + Send + 'static>>;

/// Lifecycle and RPC surface of a family of test nodes.
#[async_trait]
pub trait NodeBackend: Send + Sync + 'static {
    /// Handle to one running node. Cloning must be cheap.
    type Node: Clone + Send + Sync + 'static;

    /// Start node number `index`.
    async fn create(&self, index: usize) -> Result<Self::Node, BackendError>;

    /// Connect two nodes so blocks propagate between them in both directions.
    async fn connect_pair(&self, a: &Self::Node, b: &Self::Node) -> Result<(), BackendError>;

    /// Ask a node to generate `count` blocks.
    ///
    /// Must return without waiting for any block to be produced; the work
    /// happens when the returned future is polled.
    fn generate(&self, node: &Self::Node, count: u32) -> GenerateFuture;

    /// Every block the node currently knows about.
    async fn dag_view(&self, node: &Self::Node) -> Result<Vec<DagNode>, BackendError>;

    /// Stop the node and release its resources.
    async fn teardown(&self, node: &Self::Node) -> Result<(), BackendError>;
}
