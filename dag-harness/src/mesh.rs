//! Peer connections between provisioned nodes.

use std::collections::BTreeSet;

use crate::backend::NodeBackend;
use crate::cluster::Cluster;
use crate::error::RunError;

/// Symmetric connection pairs over node indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mesh {
    size: usize,
    pairs: BTreeSet<(usize, usize)>,
}

impl Mesh {
    /// A mesh over `size` nodes with no connections.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            pairs: BTreeSet::new(),
        }
    }

    /// Record a connection. Order of `a` and `b` does not matter.
    pub fn add(&mut self, a: usize, b: usize) {
        self.pairs.insert((a.min(b), a.max(b)));
    }

    /// True if `a` and `b` are directly connected.
    pub fn contains(&self, a: usize, b: usize) -> bool {
        self.pairs.contains(&(a.min(b), a.max(b)))
    }

    /// Number of nodes the mesh spans.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Connection pairs as `(lower, higher)`.
    pub fn pairs(&self) -> &BTreeSet<(usize, usize)> {
        &self.pairs
    }

    /// Number of connected components.
    pub fn component_count(&self) -> usize {
        let mut parent: Vec<usize> = (0..self.size).collect();

        fn find(parent: &mut [usize], mut x: usize) -> usize {
            while parent[x] != x {
                parent[x] = parent[parent[x]];
                x = parent[x];
            }
            x
        }

        let mut components = self.size;
        for &(a, b) in &self.pairs {
            if a >= self.size || b >= self.size {
                continue;
            }
            let (ra, rb) = (find(&mut parent, a), find(&mut parent, b));
            if ra != rb {
                parent[ra] = rb;
                components -= 1;
            }
        }
        components
    }

    /// True if every node can reach every other node.
    pub fn is_connected(&self) -> bool {
        self.component_count() <= 1
    }
}

/// Connects every provisioned node to every other one.
pub struct MeshConnector;

impl MeshConnector {
    /// Connection order for `size` nodes: a star from node 0 first, then the
    /// remaining pairs. The star alone already spans the cluster.
    pub fn plan(size: usize) -> Vec<(usize, usize)> {
        let mut pairs: Vec<(usize, usize)> = (1..size).map(|i| (0, i)).collect();
        for a in 1..size {
            for b in (a + 1)..size {
                pairs.push((a, b));
            }
        }
        pairs
    }

    /// Connect the cluster.
    ///
    /// Calling this again on a meshed cluster returns the existing mesh.
    /// The first failing pair aborts the run.
    pub async fn connect<B: NodeBackend>(cluster: &mut Cluster<B>) -> Result<Mesh, RunError> {
        if let Some(mesh) = cluster.mesh() {
            return Ok(mesh.clone());
        }

        let mut mesh = Mesh::new(cluster.len());
        for (a, b) in Self::plan(cluster.len()) {
            let (left, right) = (&cluster.handles()[a], &cluster.handles()[b]);
            cluster
                .backend()
                .connect_pair(left.node(), right.node())
                .await
                .map_err(|source| RunError::Mesh { a, b, source })?;
            mesh.add(a, b);
        }

        debug_assert!(mesh.is_connected());
        tracing::info!(
            "Connected {} nodes over {} links",
            mesh.size(),
            mesh.pairs().len()
        );
        cluster.set_mesh(mesh.clone());
        Ok(mesh)
    }
}
