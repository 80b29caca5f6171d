//! # dag-harness
//!
//! Orchestrates an ephemeral cluster of block-producing test nodes and turns
//! the DAG they build into a rendered document.
//!
//! ## Pipeline
//!
//! ```text
//! Provisioner ─► MeshConnector ─► BlockProducer ─► FutureCollector
//!                                   (fan-out)        (fan-in)
//!                                                        │
//!       OutputResolver ◄─ GraphRenderer ◄─ DagExtractor ◄┘
//!
//!                 teardown of every node on every exit path
//! ```
//!
//! Nodes are reached through the [`NodeBackend`] trait. [`SimNetwork`] is an
//! in-process implementation with gossip between connected nodes and
//! injectable faults.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod cluster;
pub mod config;
pub mod error;
pub mod extractor;
pub mod mesh;
pub mod orchestrator;
pub mod producer;
pub mod sim;

pub use backend::{GenerateFuture, NodeBackend};
pub use cluster::{Cluster, HandleState, NodeHandle, Provisioner};
pub use config::{ClusterConfig, ConfigError, RenderConfig, RunConfig, SimConfig};
pub use error::{BackendError, RunError};
pub use extractor::DagExtractor;
pub use mesh::{Mesh, MeshConnector};
pub use orchestrator::{run_net, RunReport};
pub use producer::{BlockProducer, FutureCollector, GenerationFuture, GenerationReport};
pub use sim::{SimFaults, SimNetwork, SimNode};
