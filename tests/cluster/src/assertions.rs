//! Assertion helpers for cluster scenarios.
//!
//! These are pure functions over what a run leaves behind: the teardown
//! ledger, the connection list, the merged DAG and the saved document.

use std::collections::BTreeMap;

use dag_core::DagGraph;

/// Result of an assertion check.
#[derive(Debug, Clone)]
pub struct AssertionResult {
    /// Whether the assertion passed
    pub passed: bool,
    /// Description of what was checked
    pub description: String,
    /// Details on failure
    pub failure_details: Option<String>,
}

impl AssertionResult {
    /// Create a passing result.
    pub fn pass(description: &str) -> Self {
        Self {
            passed: true,
            description: description.into(),
            failure_details: None,
        }
    }

    /// Create a failing result.
    pub fn fail(description: &str, details: &str) -> Self {
        Self {
            passed: false,
            description: description.into(),
            failure_details: Some(details.into()),
        }
    }

    /// Panic with the failure details unless the check passed.
    pub fn expect_pass(&self) {
        assert!(
            self.passed,
            "{}: {}",
            self.description,
            self.failure_details.as_deref().unwrap_or("failed")
        );
    }
}

/// Assert that exactly the nodes in `expected` were torn down, once each.
pub fn assert_torn_down_once(
    teardowns: &BTreeMap<usize, usize>,
    expected: &[usize],
) -> AssertionResult {
    for index in expected {
        match teardowns.get(index) {
            Some(1) => {}
            Some(n) => {
                return AssertionResult::fail(
                    "Teardown exactly once",
                    &format!("Node {} was torn down {} times", index, n),
                )
            }
            None => {
                return AssertionResult::fail(
                    "Teardown exactly once",
                    &format!("Node {} was never torn down", index),
                )
            }
        }
    }

    if let Some(extra) = teardowns.keys().find(|i| !expected.contains(i)) {
        return AssertionResult::fail(
            "Teardown exactly once",
            &format!("Node {} was torn down but never expected", extra),
        );
    }

    AssertionResult::pass(&format!("All {} nodes torn down once", expected.len()))
}

/// Assert that `pairs` connect every one of `size` nodes.
pub fn assert_connected(size: usize, pairs: &[(usize, usize)]) -> AssertionResult {
    let mut parent: Vec<usize> = (0..size).collect();

    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    for &(a, b) in pairs {
        if a >= size || b >= size {
            return AssertionResult::fail(
                "Cluster connectivity",
                &format!("Pair ({}, {}) is outside a cluster of {}", a, b, size),
            );
        }
        let (ra, rb) = (find(&mut parent, a), find(&mut parent, b));
        parent[ra] = rb;
    }

    let components = (0..size).filter(|&i| find(&mut parent, i) == i).count();
    if components <= 1 {
        AssertionResult::pass(&format!("{} nodes form one component", size))
    } else {
        AssertionResult::fail(
            "Cluster connectivity",
            &format!("{} nodes form {} components", size, components),
        )
    }
}

/// Assert that a merged DAG has one root and every block reachable above it.
pub fn assert_single_rooted(graph: &DagGraph, expected_blocks: usize) -> AssertionResult {
    if graph.roots().len() != 1 {
        return AssertionResult::fail(
            "Single-rooted dag",
            &format!("Expected one root, found {}", graph.roots().len()),
        );
    }
    if graph.len() != expected_blocks {
        return AssertionResult::fail(
            "Single-rooted dag",
            &format!("Expected {} blocks, found {}", expected_blocks, graph.len()),
        );
    }
    let misplaced = graph
        .nodes_by_height()
        .into_iter()
        .find(|node| !node.is_root() && node.height == 0);
    if let Some(node) = misplaced {
        return AssertionResult::fail(
            "Single-rooted dag",
            &format!("Block {} has parents but height 0", node.hash),
        );
    }

    AssertionResult::pass(&format!("{} blocks above one root", graph.len()))
}

/// Assert that a saved document is HTML with an embedded, preamble-free SVG.
pub fn assert_document_embeds_svg(html: &str) -> AssertionResult {
    if !html.contains("<html") {
        return AssertionResult::fail("Document embeds svg", "No <html> element");
    }
    if !html.contains("<svg") {
        return AssertionResult::fail("Document embeds svg", "No <svg> element");
    }
    for forbidden in ["<?xml", "<!DOCTYPE svg"] {
        if html.contains(forbidden) {
            return AssertionResult::fail(
                "Document embeds svg",
                &format!("Found image preamble '{}' in document", forbidden),
            );
        }
    }
    AssertionResult::pass("Document embeds svg without preamble")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn torn_down_once_pass() {
        let ledger = BTreeMap::from([(0, 1), (1, 1)]);
        assert!(assert_torn_down_once(&ledger, &[0, 1]).passed);
    }

    #[test]
    fn torn_down_twice_fails() {
        let ledger = BTreeMap::from([(0, 1), (1, 2)]);
        let result = assert_torn_down_once(&ledger, &[0, 1]);
        assert!(!result.passed);
        assert!(result.failure_details.unwrap().contains("2 times"));
    }

    #[test]
    fn torn_down_missing_or_extra_fails() {
        let ledger = BTreeMap::from([(0, 1)]);
        assert!(!assert_torn_down_once(&ledger, &[0, 1]).passed);
        assert!(!assert_torn_down_once(&ledger, &[]).passed);
    }

    #[test]
    fn connected_pass_and_fail() {
        assert!(assert_connected(3, &[(0, 1), (0, 2)]).passed);
        assert!(assert_connected(1, &[]).passed);
        assert!(!assert_connected(3, &[(0, 1)]).passed);
        assert!(!assert_connected(2, &[(0, 5)]).passed);
    }

    #[test]
    fn document_checks() {
        assert!(assert_document_embeds_svg("<html><body><svg></svg></body></html>").passed);
        assert!(!assert_document_embeds_svg("<svg></svg>").passed);
        assert!(!assert_document_embeds_svg("<html><?xml version=\"1.0\"?><svg/></html>").passed);
    }
}
