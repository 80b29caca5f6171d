//! Cluster scenarios.
//!
//! - `pipeline` - successful runs: output placement, merged DAG shape, mesh coverage
//! - `failures` - a fault at every stage, each checked for complete teardown

#[cfg(test)]
mod failures;
