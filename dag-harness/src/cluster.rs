//! Node handles and their lifecycle.
//!
//! A [`Cluster`] owns every handle the [`Provisioner`] created. Teardown is
//! attempted exactly once per handle, independently: a failure on one node
//! never stops the others from being released.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;

use crate::backend::NodeBackend;
use crate::error::{BackendError, RunError};
use crate::mesh::Mesh;

/// Lifecycle state of a [`NodeHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    /// Node is running but not yet meshed.
    Created,
    /// Node is part of the mesh.
    Connected,
    /// Teardown has been attempted. Terminal.
    TornDown,
}

/// One provisioned node.
#[derive(Debug)]
pub struct NodeHandle<N> {
    index: usize,
    state: HandleState,
    node: N,
}

impl<N> NodeHandle<N> {
    /// Position of the node in the cluster (0..N-1).
    pub fn index(&self) -> usize {
        self.index
    }

    /// Current lifecycle state.
    pub fn state(&self) -> HandleState {
        self.state
    }

    /// Backend handle to the node.
    pub fn node(&self) -> &N {
        &self.node
    }
}

/// Every node of one run, plus the backend that drives them.
pub struct Cluster<B: NodeBackend> {
    backend: Arc<B>,
    handles: Vec<NodeHandle<B::Node>>,
    mesh: Option<Mesh>,
}

impl<B: NodeBackend> Cluster<B> {
    /// An empty cluster on `backend`.
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            handles: Vec::new(),
            mesh: None,
        }
    }

    /// The backend driving this cluster.
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Handles in index order.
    pub fn handles(&self) -> &[NodeHandle<B::Node>] {
        &self.handles
    }

    /// Number of provisioned nodes.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// True if no node was provisioned.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// The mesh, once [`MeshConnector`](crate::MeshConnector) has run.
    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    /// Handles that have not been torn down.
    pub fn live_count(&self) -> usize {
        self.handles
            .iter()
            .filter(|h| h.state != HandleState::TornDown)
            .count()
    }

    pub(crate) fn push(&mut self, node: B::Node) {
        let index = self.handles.len();
        self.handles.push(NodeHandle {
            index,
            state: HandleState::Created,
            node,
        });
    }

    pub(crate) fn set_mesh(&mut self, mesh: Mesh) {
        for handle in &mut self.handles {
            if handle.state == HandleState::Created {
                handle.state = HandleState::Connected;
            }
        }
        self.mesh = Some(mesh);
    }

    /// Tear down every live handle.
    ///
    /// Each handle is attempted once even if earlier ones fail or panic;
    /// failures are logged and returned, never short-circuited. A panicking
    /// teardown is reported as [`BackendError::Task`].
    pub async fn teardown_all(&mut self) -> Vec<(usize, BackendError)> {
        let mut failures = Vec::new();
        for handle in &mut self.handles {
            if handle.state == HandleState::TornDown {
                continue;
            }
            handle.state = HandleState::TornDown;

            let outcome = AssertUnwindSafe(self.backend.teardown(&handle.node))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    Err(BackendError::Task(format!(
                        "teardown of node {} panicked",
                        handle.index
                    )))
                });

            match outcome {
                Ok(()) => tracing::debug!("Tore down node {}", handle.index),
                Err(e) => {
                    tracing::warn!("Teardown of node {} failed: {}", handle.index, e);
                    failures.push((handle.index, e));
                }
            }
        }
        failures
    }
}

impl<B: NodeBackend> Drop for Cluster<B> {
    fn drop(&mut self) {
        let live = self.live_count();
        if live > 0 {
            tracing::error!("{} node(s) dropped without teardown", live);
        }
    }
}

/// Creates the nodes of a cluster, one after another.
pub struct Provisioner<B> {
    backend: Arc<B>,
}

impl<B: NodeBackend> Provisioner<B> {
    /// Provision on `backend`.
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Create `count` nodes in index order.
    ///
    /// If node `i` fails, nodes `0..i` are torn down before the error is
    /// returned and no node after `i` is attempted. A panic in `create` is
    /// re-raised once those nodes have been torn down.
    pub async fn provision(&self, count: usize) -> Result<Cluster<B>, RunError> {
        let mut cluster = Cluster::new(Arc::clone(&self.backend));

        for index in 0..count {
            let created = match AssertUnwindSafe(self.backend.create(index))
                .catch_unwind()
                .await
            {
                Ok(created) => created,
                Err(panic) => {
                    tracing::error!(
                        "Creating node {} panicked; tearing down {} provisioned node(s)",
                        index,
                        cluster.len()
                    );
                    cluster.teardown_all().await;
                    std::panic::resume_unwind(panic);
                }
            };

            match created {
                Ok(node) => {
                    tracing::info!("Provisioned node {}", index);
                    cluster.push(node);
                }
                Err(source) => {
                    tracing::warn!(
                        "Unable to create node {}: {}; tearing down {} provisioned node(s)",
                        index,
                        source,
                        cluster.len()
                    );
                    cluster.teardown_all().await;
                    return Err(RunError::Provision { index, source });
                }
            }
        }

        Ok(cluster)
    }
}
