//! In-process simulated node network.
//!
//! Each [`SimNode`] keeps its own view of the DAG and an inbox task that
//! receives blocks from connected peers. New blocks are flooded to every
//! peer; a block whose parents are not known yet is parked as an orphan
//! until they arrive, so a node's view is always parent-closed.
//!
//! All nodes start from the same genesis block. Faults can be injected per
//! node index through [`SimFaults`], and the network keeps a ledger of
//! created nodes, connections and teardown calls for assertions.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use dag_core::{BlockHash, DagNode};
use rand::seq::SliceRandom;
use rand::Rng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::backend::{GenerateFuture, NodeBackend};
use crate::config::SimConfig;
use crate::error::BackendError;

const GENESIS_SEED: &[u8] = b"dagviz-genesis";
const BLOCK_DOMAIN: &[u8] = b"dagviz-block";
const DIVERGENT_PARENT_SEED: &[u8] = b"dagviz-divergent-parent";

/// The genesis block every simulated node starts from.
pub fn genesis() -> DagNode {
    DagNode::genesis(BlockHash::digest(GENESIS_SEED))
}

/// Faults to inject, each keyed by node index.
#[derive(Debug, Clone, Default)]
pub struct SimFaults {
    /// Creating this node fails.
    pub fail_create_at: Option<usize>,
    /// Creating this node panics.
    pub panic_create_at: Option<usize>,
    /// Any connection involving this node fails.
    pub fail_connect_at: Option<usize>,
    /// Generation on this node fails halfway through.
    pub fail_generate_at: Option<usize>,
    /// Generation on this node panics.
    pub panic_generate_at: Option<usize>,
    /// Reading this node's view fails.
    pub fail_view_at: Option<usize>,
    /// This node reports genesis with a parent nobody else knows.
    pub diverge_view_at: Option<usize>,
    /// Tearing down this node reports an error (the node still stops).
    pub fail_teardown_at: Option<usize>,
    /// Tearing down this node panics after the node has stopped.
    pub panic_teardown_at: Option<usize>,
}

#[derive(Debug, Default)]
struct Ledger {
    created: Vec<usize>,
    connections: Vec<(usize, usize)>,
    teardowns: BTreeMap<usize, usize>,
}

/// A [`NodeBackend`] running every node inside the current tokio runtime.
#[derive(Debug, Default)]
pub struct SimNetwork {
    config: SimConfig,
    faults: SimFaults,
    ledger: Mutex<Ledger>,
}

impl SimNetwork {
    /// Create a network with the given node behaviour and no faults.
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            faults: SimFaults::default(),
            ledger: Mutex::new(Ledger::default()),
        }
    }

    /// Inject faults.
    pub fn with_faults(mut self, faults: SimFaults) -> Self {
        self.faults = faults;
        self
    }

    /// Indices of every node created so far, in creation order.
    pub fn created(&self) -> Vec<usize> {
        self.ledger().created.clone()
    }

    /// Every successful connection, as `(lower, higher)` index pairs.
    pub fn connections(&self) -> Vec<(usize, usize)> {
        self.ledger().connections.clone()
    }

    /// How many times each node index was torn down.
    pub fn teardowns(&self) -> BTreeMap<usize, usize> {
        self.ledger().teardowns.clone()
    }

    /// How many times node `index` was torn down.
    pub fn teardown_count(&self, index: usize) -> usize {
        self.ledger().teardowns.get(&index).copied().unwrap_or(0)
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl NodeBackend for SimNetwork {
    type Node = SimNode;

    async fn create(&self, index: usize) -> Result<SimNode, BackendError> {
        if self.faults.fail_create_at == Some(index) {
            return Err(BackendError::Injected(format!("create node {}", index)));
        }
        if self.faults.panic_create_at == Some(index) {
            panic!("injected panic while creating node {}", index);
        }

        let node = SimNode::spawn(index);
        self.ledger().created.push(index);
        tracing::debug!("Simulated node {} started", index);
        Ok(node)
    }

    async fn connect_pair(&self, a: &SimNode, b: &SimNode) -> Result<(), BackendError> {
        if a.index() == b.index() {
            return Err(BackendError::SelfConnection(a.index()));
        }
        if let Some(faulty) = self.faults.fail_connect_at {
            if faulty == a.index() || faulty == b.index() {
                return Err(BackendError::Injected(format!(
                    "connect node {} to node {}",
                    a.index(),
                    b.index()
                )));
            }
        }
        for node in [a, b] {
            if node.is_stopped() {
                return Err(BackendError::Stopped(node.index()));
            }
        }

        a.add_peer(b);
        b.add_peer(a);

        let pair = (a.index().min(b.index()), a.index().max(b.index()));
        self.ledger().connections.push(pair);
        Ok(())
    }

    fn generate(&self, node: &SimNode, count: u32) -> GenerateFuture {
        let node = node.clone();
        let index = node.index();
        let fail = self.faults.fail_generate_at == Some(index);
        let panic = self.faults.panic_generate_at == Some(index);
        let interval_ms = self.config.block_interval_ms;
        let max_parents = self.config.max_parents;

        Box::pin(async move {
            if panic {
                panic!("injected panic while generating on node {}", index);
            }
            if fail {
                node.mine(count / 2, interval_ms, max_parents).await?;
                return Err(BackendError::Injected(format!("generate on node {}", index)));
            }
            node.mine(count, interval_ms, max_parents).await
        })
    }

    async fn dag_view(&self, node: &SimNode) -> Result<Vec<DagNode>, BackendError> {
        if node.is_stopped() {
            return Err(BackendError::Stopped(node.index()));
        }
        if self.faults.fail_view_at == Some(node.index()) {
            return Err(BackendError::Injected(format!("read view of node {}", node.index())));
        }

        let mut view = node.blocks();
        if self.faults.diverge_view_at == Some(node.index()) {
            if let Some(root) = view.iter_mut().find(|b| b.is_root()) {
                root.parents.push(BlockHash::digest(DIVERGENT_PARENT_SEED));
            }
        }
        Ok(view)
    }

    async fn teardown(&self, node: &SimNode) -> Result<(), BackendError> {
        *self.ledger().teardowns.entry(node.index()).or_default() += 1;
        node.stop();
        tracing::debug!("Simulated node {} stopped", node.index());

        if self.faults.panic_teardown_at == Some(node.index()) {
            panic!("injected panic while tearing down node {}", node.index());
        }
        if self.faults.fail_teardown_at == Some(node.index()) {
            return Err(BackendError::Injected(format!("teardown node {}", node.index())));
        }
        Ok(())
    }
}

/// Handle to one simulated node.
#[derive(Clone)]
pub struct SimNode {
    inner: Arc<NodeInner>,
}

struct NodeInner {
    index: usize,
    state: Mutex<NodeState>,
    inbox: mpsc::UnboundedSender<DagNode>,
    task: Mutex<Option<JoinHandle<()>>>,
    stopped: AtomicBool,
}

#[derive(Default)]
struct NodeState {
    blocks: HashMap<BlockHash, DagNode>,
    tips: BTreeSet<BlockHash>,
    orphans: HashMap<BlockHash, DagNode>,
    peers: Vec<(usize, mpsc::UnboundedSender<DagNode>)>,
    nonce: u64,
}

impl fmt::Debug for SimNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimNode")
            .field("index", &self.inner.index)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

impl SimNode {
    /// Start a node holding only the genesis block.
    fn spawn(index: usize) -> Self {
        let (inbox, mut rx) = mpsc::unbounded_channel::<DagNode>();
        let mut state = NodeState::default();
        state.accept(genesis());

        let inner = Arc::new(NodeInner {
            index,
            state: Mutex::new(state),
            inbox,
            task: Mutex::new(None),
            stopped: AtomicBool::new(false),
        });

        let weak = Arc::downgrade(&inner);
        let task = tokio::spawn(async move {
            while let Some(block) = rx.recv().await {
                match weak.upgrade() {
                    Some(inner) => inner.receive(block),
                    None => break,
                }
            }
        });
        *inner.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);

        Self { inner }
    }

    /// Node index within its cluster.
    pub fn index(&self) -> usize {
        self.inner.index
    }

    /// True once the node has been torn down.
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    /// Known blocks in ascending (height, hash) order.
    pub fn blocks(&self) -> Vec<DagNode> {
        let state = self.inner.state();
        let mut blocks: Vec<DagNode> = state.blocks.values().cloned().collect();
        blocks.sort_by_key(|b| (b.height, b.hash));
        blocks
    }

    /// Current tips of the local view.
    pub fn tips(&self) -> BTreeSet<BlockHash> {
        self.inner.state().tips.clone()
    }

    /// Blocks received whose parents have not arrived yet.
    pub fn orphan_count(&self) -> usize {
        self.inner.state().orphans.len()
    }

    /// Register `peer` as a gossip target and replay local history to it.
    fn add_peer(&self, peer: &SimNode) {
        let mut state = self.inner.state();
        if state.peers.iter().any(|(index, _)| *index == peer.index()) {
            return;
        }

        let tx = peer.inner.inbox.clone();
        let mut history: Vec<&DagNode> = state.blocks.values().collect();
        history.sort_by_key(|b| (b.height, b.hash));
        for block in history {
            let _ = tx.send(block.clone());
        }
        state.peers.push((peer.index(), tx));
    }

    async fn mine(
        &self,
        count: u32,
        interval_ms: u64,
        max_parents: usize,
    ) -> Result<Vec<BlockHash>, BackendError> {
        let mut mined = Vec::with_capacity(count as usize);
        for _ in 0..count {
            if self.is_stopped() {
                return Err(BackendError::Stopped(self.index()));
            }
            mined.push(self.inner.mine_one(max_parents));

            if interval_ms > 0 {
                let pause = rand::thread_rng().gen_range(0..=interval_ms);
                tokio::time::sleep(Duration::from_millis(pause)).await;
            } else {
                tokio::task::yield_now().await;
            }
        }
        Ok(mined)
    }

    fn stop(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
        if let Some(task) = self
            .inner
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
        self.inner.state().peers.clear();
    }
}

impl NodeInner {
    fn state(&self) -> MutexGuard<'_, NodeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Build a block on top of the current tips and gossip it.
    fn mine_one(&self, max_parents: usize) -> BlockHash {
        let mut guard = self.state();
        let state = &mut *guard;

        let mut parents: Vec<BlockHash> = state.tips.iter().copied().collect();
        if parents.len() > max_parents {
            parents.shuffle(&mut rand::thread_rng());
            parents.truncate(max_parents);
        }
        parents.sort();

        let height = parents
            .iter()
            .filter_map(|p| state.blocks.get(p))
            .map(|b| b.height + 1)
            .max()
            .unwrap_or(0);

        state.nonce += 1;
        let mut preimage = Vec::with_capacity(BLOCK_DOMAIN.len() + 16 + parents.len() * 32);
        preimage.extend_from_slice(BLOCK_DOMAIN);
        preimage.extend_from_slice(&(self.index as u64).to_le_bytes());
        preimage.extend_from_slice(&state.nonce.to_le_bytes());
        for parent in &parents {
            preimage.extend_from_slice(parent.as_bytes());
        }

        let block = DagNode::new(BlockHash::digest(&preimage), parents, height);
        let hash = block.hash;
        state.relay(&block);
        state.accept(block);
        hash
    }

    /// Handle a block gossiped by a peer.
    fn receive(&self, block: DagNode) {
        let mut guard = self.state();
        let state = &mut *guard;

        if state.blocks.contains_key(&block.hash) || state.orphans.contains_key(&block.hash) {
            return;
        }
        if !state.has_parents(&block) {
            state.orphans.insert(block.hash, block);
            return;
        }

        let mut ready = vec![block];
        while let Some(block) = ready.pop() {
            state.relay(&block);
            state.accept(block);

            let unblocked: Vec<BlockHash> = state
                .orphans
                .values()
                .filter(|orphan| state.has_parents(orphan))
                .map(|orphan| orphan.hash)
                .collect();
            for hash in unblocked {
                if let Some(orphan) = state.orphans.remove(&hash) {
                    ready.push(orphan);
                }
            }
        }
    }
}

impl NodeState {
    fn has_parents(&self, block: &DagNode) -> bool {
        block.parents.iter().all(|p| self.blocks.contains_key(p))
    }

    fn accept(&mut self, block: DagNode) {
        for parent in &block.parents {
            self.tips.remove(parent);
        }
        self.tips.insert(block.hash);
        self.blocks.insert(block.hash, block);
    }

    /// Forward a block to every live peer, forgetting peers that hung up.
    fn relay(&mut self, block: &DagNode) {
        self.peers.retain(|(_, tx)| tx.send(block.clone()).is_ok());
    }
}
