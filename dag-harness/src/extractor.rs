//! Collects every node's view of the DAG into one canonical graph.

use dag_core::DagGraph;

use crate::backend::NodeBackend;
use crate::cluster::Cluster;
use crate::error::RunError;

/// Reads and merges per-node DAG views.
pub struct DagExtractor;

impl DagExtractor {
    /// Query every node in index order and merge the views.
    ///
    /// The merged graph is validated before it is returned.
    pub async fn extract<B: NodeBackend>(cluster: &Cluster<B>) -> Result<DagGraph, RunError> {
        let mut graph = DagGraph::new();

        for handle in cluster.handles() {
            let view = cluster
                .backend()
                .dag_view(handle.node())
                .await
                .map_err(|source| RunError::Extraction {
                    index: handle.index(),
                    source,
                })?;

            let reported = view.len();
            let added = graph.merge_view(view)?;
            tracing::debug!(
                "Node {} reported {} blocks ({} new)",
                handle.index(),
                reported,
                added
            );
        }

        graph.validate()?;
        tracing::info!(
            "Merged dag: {} blocks, {} root(s), {} tip(s), height {}",
            graph.len(),
            graph.roots().len(),
            graph.tips().len(),
            graph.max_height().unwrap_or(0)
        );
        Ok(graph)
    }
}
