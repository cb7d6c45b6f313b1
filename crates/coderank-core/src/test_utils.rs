//! Test utilities for coderank-core

use crate::graph::{CodeGraph, GraphNode};
use crate::model::{EntityKind, Language};

/// A local file node for graph fixtures.
pub fn file_node(id: &str) -> GraphNode {
    GraphNode {
        id: id.to_string(),
        kind: EntityKind::File,
        is_local: true,
        is_source: Language::from_path(id).is_source(),
    }
}

/// Build a file graph from `(source, target, weight)` triples. Nodes are added
/// in order of first appearance.
pub fn graph_from_edges(edges: &[(&str, &str, f64)]) -> CodeGraph {
    let mut graph = CodeGraph::new();
    for (s, t, _) in edges {
        graph.add_node(file_node(s));
        graph.add_node(file_node(t));
    }
    for (s, t, w) in edges {
        graph.add_weight(s, t, *w);
    }
    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_from_edges() {
        let graph = graph_from_edges(&[("a.py", "b.py", 1.0), ("b.py", "c.md", 0.5)]);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert!(!graph.node("c.md").unwrap().is_source);
    }
}
