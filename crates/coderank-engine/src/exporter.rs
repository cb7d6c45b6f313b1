//! Read-only queries over a finished [`GraphBundle`]
//!
//! Nothing here recomputes scores. Every identifier returned is the same
//! string the graphs use, so rankings and subgraphs join without lookups.

use crate::bundle::{FileMetrics, GraphBundle, RepoStats};
use crate::pagerank::Ranking;
use coderank_core::model::QUALIFIER;
use coderank_core::{CodeGraph, CodeRankError, EntityKind, ParseWarning, Result, WeightedEdge};
use serde::Serialize;
use std::collections::HashSet;
use tracing::warn;

/// One row of a ranked view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredEntity {
    pub id: String,
    pub score: f64,
    pub is_local: bool,
}

/// A ranked view, best first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopN {
    pub kind: EntityKind,
    pub entries: Vec<ScoredEntity>,
    /// True when no node passed the strict filter and the entries are the
    /// best local nodes instead.
    pub degraded: bool,
}

/// What a subgraph query is centred on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Focus {
    /// One node and its direct neighbours.
    Entity(String),
    /// The whole graph, capped at the highest-ranked nodes.
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubgraphNode {
    pub id: String,
    pub score: f64,
    pub is_local: bool,
    pub is_focus: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subgraph {
    pub kind: EntityKind,
    pub generation: u64,
    pub focus: Option<String>,
    pub nodes: Vec<SubgraphNode>,
    pub edges: Vec<WeightedEdge>,
    /// True when the node cap dropped part of the graph.
    pub truncated: bool,
}

/// `base * (1 + score * factor)`: lifts a similarity score by importance.
pub fn boost(base_similarity: f64, score: f64, factor: f64) -> f64 {
    base_similarity * (1.0 + score * factor)
}

pub struct Exporter<'a> {
    bundle: &'a GraphBundle,
}

impl<'a> Exporter<'a> {
    pub fn new(bundle: &'a GraphBundle) -> Self {
        Exporter { bundle }
    }

    pub fn generation(&self) -> u64 {
        self.bundle.generation
    }

    /// Top `n` entities of a kind by PageRank.
    pub fn top_n(&self, kind: EntityKind, n: usize) -> TopN {
        let graph = self.bundle.graph(kind);
        let (entries, degraded) = select(graph, self.bundle.ranking(kind), n, false);
        if degraded {
            warn!(%kind, "no node passed the strict filter; showing best local nodes");
        }
        TopN {
            kind,
            entries,
            degraded,
        }
    }

    /// Files that import many important files.
    pub fn hubs(&self, n: usize) -> TopN {
        self.file_view(&self.bundle.hits.hubs, n, "hub")
    }

    /// Files that many important files import.
    pub fn authorities(&self, n: usize) -> TopN {
        self.file_view(&self.bundle.hits.authorities, n, "authority")
    }

    fn file_view(&self, ranking: &Ranking, n: usize, view: &str) -> TopN {
        let (entries, degraded) = select(&self.bundle.graphs.import_graph, ranking, n, true);
        if degraded {
            warn!(view, "no source file passed the strict filter; showing best local files");
        }
        TopN {
            kind: EntityKind::File,
            entries,
            degraded,
        }
    }

    /// Functions lying on the most shortest call paths. Functions on none
    /// are left out.
    pub fn central_functions(&self, n: usize) -> TopN {
        let (entries, degraded) =
            select(&self.bundle.graphs.call_graph, &self.bundle.centrality, n, true);
        TopN {
            kind: EntityKind::Function,
            entries,
            degraded,
        }
    }

    /// PageRank score of one entity.
    pub fn score_of(&self, kind: EntityKind, id: &str) -> Option<f64> {
        self.bundle.ranking(kind).score(id)
    }

    pub fn subgraph(&self, kind: EntityKind, focus: &Focus) -> Result<Subgraph> {
        match focus {
            Focus::Entity(id) => self.neighbourhood(kind, id),
            Focus::All => Ok(self.whole_graph(kind)),
        }
    }

    fn neighbourhood(&self, kind: EntityKind, id: &str) -> Result<Subgraph> {
        let graph = self.bundle.graph(kind);
        let ranking = self.bundle.ranking(kind);
        let focus = graph
            .node(id)
            .ok_or_else(|| CodeRankError::UnknownEntity(id.to_string()))?;

        let mut nodes = vec![SubgraphNode {
            id: focus.id.clone(),
            score: ranking.score(id).unwrap_or(0.0),
            is_local: focus.is_local,
            is_focus: true,
        }];
        let mut seen: HashSet<&str> = HashSet::from([id]);
        let mut edges = Vec::new();

        for (source, weight) in graph.edges_to(id) {
            if source.id == id {
                continue;
            }
            edges.push(WeightedEdge {
                source: source.id.clone(),
                target: id.to_string(),
                weight,
            });
            if seen.insert(&source.id) {
                nodes.push(node_of(ranking, &source.id, source.is_local));
            }
        }
        for (target, weight) in graph.edges_from(id) {
            edges.push(WeightedEdge {
                source: id.to_string(),
                target: target.id.clone(),
                weight,
            });
            if seen.insert(&target.id) {
                nodes.push(node_of(ranking, &target.id, target.is_local));
            }
        }

        Ok(Subgraph {
            kind,
            generation: self.bundle.generation,
            focus: Some(id.to_string()),
            nodes,
            edges,
            truncated: false,
        })
    }

    fn whole_graph(&self, kind: EntityKind) -> Subgraph {
        let graph = self.bundle.graph(kind);
        let ranking = self.bundle.ranking(kind);
        let cap = self.bundle.config.export.max_subgraph_nodes;

        let nodes: Vec<SubgraphNode> = ranking
            .iter()
            .filter_map(|(id, _)| graph.node(id))
            .take(cap)
            .map(|n| node_of(ranking, &n.id, n.is_local))
            .collect();
        let kept: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let mut edges: Vec<WeightedEdge> = graph
            .all_edges()
            .filter(|e| kept.contains(e.source.as_str()) && kept.contains(e.target.as_str()))
            .collect();
        edges.sort_by(|a, b| (&a.source, &a.target).cmp(&(&b.source, &b.target)));

        Subgraph {
            kind,
            generation: self.bundle.generation,
            focus: None,
            truncated: graph.node_count() > nodes.len(),
            nodes,
            edges,
        }
    }

    /// Symbols, scores and import degree of one file.
    pub fn file_metrics(&self, path: &str) -> Result<FileMetrics> {
        let file = self
            .bundle
            .file(path)
            .ok_or_else(|| CodeRankError::UnknownEntity(path.to_string()))?;
        let symbols = self.bundle.symbols.get(path);
        let local_name = |qid: &str| match qid.find(QUALIFIER) {
            Some(idx) => qid[idx + QUALIFIER.len()..].to_string(),
            None => qid.to_string(),
        };
        let graph = &self.bundle.graphs.import_graph;

        Ok(FileMetrics {
            path: file.path.clone(),
            language: file.language,
            size: file.size,
            lines: file.lines,
            functions: symbols
                .map(|s| s.functions.iter().map(|f| local_name(&f.qualified_id)).collect())
                .unwrap_or_default(),
            classes: symbols
                .map(|s| s.classes.iter().map(|c| local_name(&c.qualified_id)).collect())
                .unwrap_or_default(),
            imports: symbols
                .map(|s| s.imports.iter().map(|i| i.target.clone()).collect())
                .unwrap_or_default(),
            pagerank: self.bundle.file_rank.score(path).unwrap_or(0.0),
            hub: self.bundle.hits.hubs.score(path).unwrap_or(0.0),
            authority: self.bundle.hits.authorities.score(path).unwrap_or(0.0),
            imports_count: graph.edges_from(path).len(),
            imported_by_count: graph.edges_to(path).len(),
        })
    }

    pub fn summary(&self) -> &RepoStats {
        &self.bundle.stats
    }

    pub fn warnings(&self) -> &[ParseWarning] {
        &self.bundle.warnings
    }
}

fn node_of(ranking: &Ranking, id: &str, is_local: bool) -> SubgraphNode {
    SubgraphNode {
        id: id.to_string(),
        score: ranking.score(id).unwrap_or(0.0),
        is_local,
        is_focus: false,
    }
}

/// Strict selection: nodes standing for code. When that leaves nothing,
/// fall back to the best local nodes and report it.
fn select(
    graph: &CodeGraph,
    ranking: &Ranking,
    n: usize,
    positive_only: bool,
) -> (Vec<ScoredEntity>, bool) {
    let pick = |strict: bool| -> Vec<ScoredEntity> {
        ranking
            .iter()
            .filter(|(_, score)| !positive_only || *score > 0.0)
            .filter_map(|(id, score)| {
                let node = graph.node(id)?;
                let eligible = if strict { node.is_source } else { node.is_local };
                eligible.then(|| ScoredEntity {
                    id: id.to_string(),
                    score,
                    is_local: node.is_local,
                })
            })
            .take(n)
            .collect()
    };

    let strict = pick(true);
    if !strict.is_empty() || n == 0 {
        return (strict, false);
    }
    let fallback = pick(false);
    let degraded = !fallback.is_empty();
    (fallback, degraded)
}
