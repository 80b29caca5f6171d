//! # cluster-tests
//!
//! End-to-end scenarios for the dagviz pipeline, run against the simulated
//! network with a stand-in image converter so they need no Graphviz.
//!
//! - `assertions` - pure pass/fail checks over run artifacts
//! - `fixtures` - converters and configs shared by the scenarios
//! - `scenarios` - the scenarios themselves

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assertions;
pub mod fixtures;

pub mod scenarios;
