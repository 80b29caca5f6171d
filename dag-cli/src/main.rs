//! # dagdemo
//!
//! Spins up a cluster of simulated block-producing nodes, meshes them, lets
//! each generate blocks concurrently, merges what they built into one DAG
//! and saves it as an HTML page with an embedded SVG.
//!
//! ## Example
//!
//! ```bash
//! # Save to a fresh dag_*.html in the temp dir
//! dagdemo
//!
//! # Save into a directory, or to an exact file
//! dagdemo -o /tmp/dags
//! dagdemo -o dag.html
//!
//! # Larger cluster, verbose logs
//! DAGDEMO_CONFIG=big.toml RUST_LOG=info dagdemo
//! ```
//!
//! Rendering needs Graphviz `dot` on the `PATH` (or `render.dot_binary`).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dag_harness::{run_net, RunConfig, SimNetwork};
use dag_render::GraphvizConverter;
use tracing_subscriber::EnvFilter;

/// Environment variable naming an optional TOML config file.
const CONFIG_ENV: &str = "DAGDEMO_CONFIG";

/// Render the block DAG of a simulated test cluster to HTML.
#[derive(Parser, Debug)]
#[command(name = "dagdemo")]
#[command(about, long_about = None)]
struct Cli {
    /// Output file or directory (default: a new dag_*.html in the temp dir)
    #[arg(short = 'o', value_name = "PATH")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config()?;
    let backend = Arc::new(SimNetwork::new(config.sim.clone()));
    let converter = GraphvizConverter::new(config.render.dot_binary.clone());

    println!("Generating dag");
    let report = run_net(backend, &config, cli.output.as_deref(), converter)
        .await
        .context("dag generation failed")?;

    tracing::info!(
        "{} nodes generated {} blocks, dag has {} blocks at height {}",
        report.nodes,
        report.generated,
        report.blocks,
        report.height
    );
    println!("Saved dag to {}", report.output.display());

    Ok(())
}

/// Load the config named by `DAGDEMO_CONFIG`, or the defaults.
fn load_config() -> Result<RunConfig> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => {
            let path = PathBuf::from(path);
            RunConfig::from_file(&path)
                .with_context(|| format!("Failed to load {}", path.display()))
        }
        None => Ok(RunConfig::default()),
    }
}
