//! Graphviz DOT description of a block graph.
//!
//! Edges run from child to parent, matching how blocks reference their
//! parents. `rankdir=BT` puts the roots at the bottom so the drawing still
//! grows upwards, and blocks of equal height share a rank.

use std::collections::BTreeMap;
use std::fmt::Write;

use dag_core::{BlockHash, DagGraph};

/// Describe the graph in DOT.
///
/// Output is deterministic: blocks appear in ascending (height, hash)
/// order and edges in (child, parent) order.
pub fn describe(graph: &DagGraph) -> String {
    let mut out = String::new();
    out.push_str("digraph dag {\n");
    out.push_str("  rankdir=BT;\n");
    out.push_str("  node [shape=box, fontname=\"Helvetica\", fontsize=10];\n");
    out.push_str("  edge [arrowsize=0.6];\n");
    out.push('\n');

    let mut ranks: BTreeMap<u64, Vec<BlockHash>> = BTreeMap::new();
    for node in graph.nodes_by_height() {
        let shape = if node.is_root() {
            " shape=doublecircle"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "  \"{}\" [label=\"{}\\nh={}\"{}];",
            node.hash,
            node.hash.short(),
            node.height,
            shape
        );
        ranks.entry(node.height).or_default().push(node.hash);
    }

    out.push('\n');
    for hashes in ranks.values().filter(|h| h.len() > 1) {
        out.push_str("  { rank=same;");
        for hash in hashes {
            let _ = write!(out, " \"{}\";", hash);
        }
        out.push_str(" }\n");
    }

    out.push('\n');
    for (child, parent) in graph.edges() {
        let _ = writeln!(out, "  \"{}\" -> \"{}\";", child, parent);
    }

    out.push_str("}\n");
    out
}
