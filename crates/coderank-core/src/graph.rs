//! Weighted directed graph keyed by stable string identifiers

use crate::model::EntityKind;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A node in one of the three code graphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Stable identifier: file path, qualified id or module name.
    pub id: String,
    pub kind: EntityKind,
    pub is_local: bool,
    /// True when the node stands for code: a source file, a function, a
    /// package holding source files, or an external library. Strict ranking
    /// views only show these.
    pub is_source: bool,
}

/// A weighted edge as seen from outside the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedEdge {
    pub source: String,
    pub target: String,
    pub weight: f64,
}

/// Directed graph with summed edge weights. Node order is insertion order,
/// which every algorithm iterating the graph relies on for determinism.
#[derive(Clone, Default)]
pub struct CodeGraph {
    inner: DiGraph<GraphNode, f64>,
    index: HashMap<String, NodeIndex>,
}

impl std::fmt::Debug for CodeGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeGraph")
            .field("node_count", &self.inner.node_count())
            .field("edge_count", &self.inner.edge_count())
            .finish()
    }
}

impl CodeGraph {
    pub fn new() -> Self {
        CodeGraph::default()
    }

    /// Add a node, or return the existing index if the id is already present.
    pub fn add_node(&mut self, node: GraphNode) -> NodeIndex {
        if let Some(&idx) = self.index.get(&node.id) {
            return idx;
        }
        let id = node.id.clone();
        let idx = self.inner.add_node(node);
        self.index.insert(id, idx);
        idx
    }

    /// Add `weight` to the edge `source -> target`, creating it if needed.
    /// Returns false when either endpoint is unknown.
    pub fn add_weight(&mut self, source: &str, target: &str, weight: f64) -> bool {
        let (Some(&s), Some(&t)) = (self.index.get(source), self.index.get(target)) else {
            return false;
        };
        match self.inner.find_edge(s, t) {
            Some(edge) => {
                if let Some(w) = self.inner.edge_weight_mut(edge) {
                    *w += weight;
                }
            }
            None => {
                self.inner.add_edge(s, t, weight);
            }
        }
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index_of(id).and_then(|idx| self.inner.node_weight(idx))
    }

    pub fn node_at(&self, idx: NodeIndex) -> Option<&GraphNode> {
        self.inner.node_weight(idx)
    }

    /// Weight of the edge `source -> target`, if it exists.
    pub fn weight(&self, source: &str, target: &str) -> Option<f64> {
        let s = self.index_of(source)?;
        let t = self.index_of(target)?;
        let edge: EdgeIndex = self.inner.find_edge(s, t)?;
        self.inner.edge_weight(edge).copied()
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Nodes in insertion order.
    pub fn all_nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.inner.node_indices().map(move |idx| &self.inner[idx])
    }

    pub fn all_edges(&self) -> impl Iterator<Item = WeightedEdge> + '_ {
        self.inner.edge_references().map(move |e| WeightedEdge {
            source: self.inner[e.source()].id.clone(),
            target: self.inner[e.target()].id.clone(),
            weight: *e.weight(),
        })
    }

    /// Outgoing edges of `id` as (target, weight).
    pub fn edges_from(&self, id: &str) -> Vec<(&GraphNode, f64)> {
        self.directed(id, Direction::Outgoing)
    }

    /// Incoming edges of `id` as (source, weight).
    pub fn edges_to(&self, id: &str) -> Vec<(&GraphNode, f64)> {
        self.directed(id, Direction::Incoming)
    }

    fn directed(&self, id: &str, dir: Direction) -> Vec<(&GraphNode, f64)> {
        let Some(idx) = self.index_of(id) else {
            return Vec::new();
        };
        let mut out: Vec<(&GraphNode, f64)> = self
            .inner
            .edges_directed(idx, dir)
            .map(|e| {
                let other = match dir {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                (&self.inner[other], *e.weight())
            })
            .collect();
        out.sort_by(|a, b| a.0.id.cmp(&b.0.id));
        out
    }

    /// Dense adjacency view for the numeric algorithms: node ids in insertion
    /// order plus, for every node, its outgoing (position, weight) pairs.
    pub fn adjacency(&self) -> Adjacency {
        let ids: Vec<String> = self.all_nodes().map(|n| n.id.clone()).collect();
        let mut out: Vec<Vec<(usize, f64)>> = vec![Vec::new(); ids.len()];
        for e in self.inner.edge_references() {
            out[e.source().index()].push((e.target().index(), *e.weight()));
        }
        for list in &mut out {
            list.sort_by_key(|(t, _)| *t);
        }
        Adjacency { ids, out }
    }
}

/// Index-based adjacency list extracted from a [`CodeGraph`].
#[derive(Debug, Clone)]
pub struct Adjacency {
    pub ids: Vec<String>,
    pub out: Vec<Vec<(usize, f64)>>,
}

impl Adjacency {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.out.iter().map(Vec::len).sum()
    }

    /// Incoming (source, weight) lists, derived from `out`.
    pub fn incoming(&self) -> Vec<Vec<(usize, f64)>> {
        let mut inc: Vec<Vec<(usize, f64)>> = vec![Vec::new(); self.ids.len()];
        for (s, list) in self.out.iter().enumerate() {
            for &(t, w) in list {
                inc[t].push((s, w));
            }
        }
        inc
    }
}
