//! Run configuration.
//!
//! Every field has a default, so an empty (or absent) TOML file reproduces
//! the standard run: 4 nodes generating 50 blocks each.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration for an orchestration run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunConfig {
    /// Cluster shape.
    #[serde(default)]
    pub cluster: ClusterConfig,
    /// Simulated node behaviour.
    #[serde(default)]
    pub sim: SimConfig,
    /// Rendering settings.
    #[serde(default)]
    pub render: RenderConfig,
}

/// Cluster shape.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    /// Number of nodes to provision (default: 4).
    #[serde(default = "default_nodes")]
    pub nodes: usize,
    /// Blocks each node generates (default: 50).
    #[serde(default = "default_blocks_per_node")]
    pub blocks_per_node: u32,
}

/// Simulated node behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct SimConfig {
    /// Upper bound on the random pause between two blocks, in milliseconds
    /// (default: 0, yield only).
    #[serde(default)]
    pub block_interval_ms: u64,
    /// Maximum parents per block (default: 8).
    #[serde(default = "default_max_parents")]
    pub max_parents: usize,
}

/// Rendering settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// Graphviz binary used for DOT to SVG conversion (default: `dot`).
    #[serde(default = "default_dot_binary")]
    pub dot_binary: String,
    /// HTML document title (default: `dag`).
    #[serde(default = "default_title")]
    pub title: String,
}

// Default value functions
fn default_nodes() -> usize {
    4
}

fn default_blocks_per_node() -> u32 {
    50
}

fn default_max_parents() -> usize {
    8
}

fn default_dot_binary() -> String {
    "dot".to_string()
}

fn default_title() -> String {
    "dag".to_string()
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            nodes: default_nodes(),
            blocks_per_node: default_blocks_per_node(),
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            block_interval_ms: 0,
            max_parents: default_max_parents(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dot_binary: default_dot_binary(),
            title: default_title(),
        }
    }
}

impl RunConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails
    /// [`validate`](Self::validate).
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no run can satisfy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cluster.nodes == 0 {
            return Err(ConfigError::Invalid("cluster.nodes must be at least 1".into()));
        }
        if self.cluster.blocks_per_node == 0 {
            return Err(ConfigError::Invalid(
                "cluster.blocks_per_node must be at least 1".into(),
            ));
        }
        if self.sim.max_parents == 0 {
            return Err(ConfigError::Invalid("sim.max_parents must be at least 1".into()));
        }
        if self.render.dot_binary.is_empty() {
            return Err(ConfigError::Invalid("render.dot_binary must not be empty".into()));
        }
        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// A setting is out of range.
    #[error("{0}")]
    Invalid(String),
}
