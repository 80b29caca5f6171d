//! Concurrent block generation: fan-out and fan-in.
//!
//! [`BlockProducer`] spawns one task per node and returns immediately, so
//! the slowest node bounds the total wait instead of the sum of all nodes.
//! [`FutureCollector`] then waits for every task to finish. It never stops
//! at the first failure: the caller needs every outcome, and teardown must
//! happen regardless.
//!
//! Dispatched tasks are never cancelled. Dropping a [`GenerationFuture`]
//! detaches its task, which keeps running to completion.

use dag_core::BlockHash;
use futures_util::future::join_all;
use tokio::task::JoinHandle;

use crate::backend::{GenerateFuture, NodeBackend};
use crate::cluster::Cluster;
use crate::error::{BackendError, RunError};

/// Handle to one node's in-flight generation request.
#[derive(Debug)]
pub struct GenerationFuture {
    index: usize,
    task: JoinHandle<Result<Vec<BlockHash>, BackendError>>,
}

impl GenerationFuture {
    /// Node the request was sent to.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Wait for the request to finish.
    ///
    /// A panicking task is reported as [`BackendError::Task`].
    pub async fn receive(self) -> Result<Vec<BlockHash>, BackendError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(BackendError::Task(format!(
                "generation on node {} panicked",
                self.index
            ))),
            Err(e) => Err(BackendError::Task(e.to_string())),
        }
    }
}

/// Issues generation requests without waiting for them.
pub struct BlockProducer;

impl BlockProducer {
    /// Ask every node in the cluster for `count` blocks.
    ///
    /// Returns one future per handle, index-aligned with
    /// [`Cluster::handles`].
    pub fn generate<B: NodeBackend>(cluster: &Cluster<B>, count: u32) -> Vec<GenerationFuture> {
        let backend = cluster.backend();
        let futures = Self::dispatch(
            cluster
                .handles()
                .iter()
                .map(|handle| backend.generate(handle.node(), count)),
        );
        tracing::info!(
            "Dispatched generation of {} blocks to {} nodes",
            count,
            futures.len()
        );
        futures
    }

    /// Spawn each request as its own task; the i-th request gets index i.
    pub fn dispatch(requests: impl IntoIterator<Item = GenerateFuture>) -> Vec<GenerationFuture> {
        requests
            .into_iter()
            .enumerate()
            .map(|(index, request)| GenerationFuture {
                index,
                task: tokio::spawn(request),
            })
            .collect()
    }
}

/// Every node's generation outcome, indexed by node.
#[derive(Debug)]
pub struct GenerationReport {
    outcomes: Vec<Result<Vec<BlockHash>, BackendError>>,
}

impl GenerationReport {
    /// Outcomes in node order.
    pub fn outcomes(&self) -> &[Result<Vec<BlockHash>, BackendError>] {
        &self.outcomes
    }

    /// Number of outcomes (equals the number of dispatched futures).
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// True if nothing was dispatched.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Every failure with its node index, in node order.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &BackendError)> {
        self.outcomes
            .iter()
            .enumerate()
            .filter_map(|(i, outcome)| outcome.as_ref().err().map(|e| (i, e)))
    }

    /// The lowest-indexed failure, if any node failed.
    pub fn first_error(&self) -> Option<(usize, &BackendError)> {
        self.failures().next()
    }

    /// Total blocks reported by successful nodes.
    pub fn block_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.as_ref().ok())
            .map(Vec::len)
            .sum()
    }

    /// Per-node block hashes, or the lowest-indexed failure.
    pub fn into_result(self) -> Result<Vec<Vec<BlockHash>>, RunError> {
        let total = self.outcomes.len();
        let failed = self.failures().count();

        let mut blocks = Vec::with_capacity(total);
        for (index, outcome) in self.outcomes.into_iter().enumerate() {
            match outcome {
                Ok(hashes) => blocks.push(hashes),
                Err(source) => {
                    return Err(RunError::Generation {
                        index,
                        failed,
                        total,
                        source,
                    })
                }
            }
        }
        Ok(blocks)
    }
}

/// Waits for all dispatched generation requests.
pub struct FutureCollector;

impl FutureCollector {
    /// Wait until every future has reached a terminal state.
    pub async fn await_all(futures: Vec<GenerationFuture>) -> GenerationReport {
        let indices: Vec<usize> = futures.iter().map(GenerationFuture::index).collect();
        let outcomes = join_all(futures.into_iter().map(GenerationFuture::receive)).await;

        for (index, outcome) in indices.into_iter().zip(&outcomes) {
            match outcome {
                Ok(hashes) => tracing::debug!("Node {} generated {} blocks", index, hashes.len()),
                Err(e) => tracing::warn!("Generation on node {} failed: {}", index, e),
            }
        }

        GenerationReport { outcomes }
    }
}
