//! End-to-end run: provision, mesh, generate, extract, render, save.
//!
//! Every node that was provisioned is torn down before `run_net` returns,
//! whether the pipeline succeeded, failed at any stage, or panicked. A
//! panic is re-raised after teardown.

use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dag_render::{GraphRenderer, ImageConverter, OutputResolver};
use futures_util::FutureExt;
use tracing::Instrument;

use crate::backend::NodeBackend;
use crate::cluster::{Cluster, Provisioner};
use crate::config::RunConfig;
use crate::error::RunError;
use crate::extractor::DagExtractor;
use crate::mesh::MeshConnector;
use crate::producer::{BlockProducer, FutureCollector};

/// Summary of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Where the document was saved.
    pub output: PathBuf,
    /// Nodes in the cluster.
    pub nodes: usize,
    /// Blocks the nodes reported generating.
    pub generated: usize,
    /// Distinct blocks in the merged DAG, genesis included.
    pub blocks: usize,
    /// Height of the merged DAG.
    pub height: u64,
}

/// Run a cluster on `backend`, render its DAG and save it.
///
/// `output` follows [`OutputResolver`] rules: `None` or an empty path
/// writes a fresh `dag_*.html` to the temp dir, a directory gets a fresh
/// file inside it, anything else is written exactly.
pub async fn run_net<B, C>(
    backend: Arc<B>,
    config: &RunConfig,
    output: Option<&Path>,
    converter: C,
) -> Result<RunReport, RunError>
where
    B: NodeBackend,
    C: ImageConverter,
{
    config.validate()?;

    let run_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("run_net", run_id = %run_id, nodes = config.cluster.nodes);

    async move {
        let renderer = GraphRenderer::new(converter, config.render.title.clone());
        let mut cluster = Provisioner::new(backend)
            .provision(config.cluster.nodes)
            .await?;

        let outcome = AssertUnwindSafe(pipeline(&mut cluster, config, output, &renderer))
            .catch_unwind()
            .await;

        let failures = cluster.teardown_all().await;
        if !failures.is_empty() {
            tracing::warn!("{} node(s) failed to tear down cleanly", failures.len());
        }

        match outcome {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
    .instrument(span)
    .await
}

async fn pipeline<B, C>(
    cluster: &mut Cluster<B>,
    config: &RunConfig,
    output: Option<&Path>,
    renderer: &GraphRenderer<C>,
) -> Result<RunReport, RunError>
where
    B: NodeBackend,
    C: ImageConverter,
{
    MeshConnector::connect(cluster).await?;

    let futures = BlockProducer::generate(cluster, config.cluster.blocks_per_node);
    let report = FutureCollector::await_all(futures).await;
    let generated = report.block_count();
    report.into_result()?;

    let graph = DagExtractor::extract(cluster).await?;
    let document = renderer.render(&graph).await?;
    let path = OutputResolver::default().persist(&document, output)?;

    Ok(RunReport {
        output: path,
        nodes: cluster.len(),
        generated,
        blocks: graph.len(),
        height: graph.max_height().unwrap_or(0),
    })
}
