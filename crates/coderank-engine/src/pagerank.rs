//! Weighted PageRank by power iteration
//!
//! Rank flows along out-edges in proportion to edge weight. Dangling nodes
//! either spread their rank over every node or keep it, depending on
//! [`DanglingPolicy`]; both conserve total mass, so scores always sum to one.

use coderank_core::{Adjacency, CodeGraph, DanglingPolicy, PageRankConfig};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Scores for every node of one graph, best first.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Ranking {
    /// `(id, score)` sorted by score descending, then id ascending.
    entries: Vec<(String, f64)>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
    pub iterations: usize,
    pub converged: bool,
}

impl Ranking {
    /// Build a ranking from unordered scores.
    pub fn from_scores(scores: Vec<(String, f64)>, iterations: usize, converged: bool) -> Self {
        let mut entries = scores;
        entries.sort_by(by_score_then_id);
        let positions = entries
            .iter()
            .enumerate()
            .map(|(i, (id, _))| (id.clone(), i))
            .collect();
        Ranking {
            entries,
            positions,
            iterations,
            converged,
        }
    }

    pub fn score(&self, id: &str) -> Option<f64> {
        self.positions.get(id).map(|&i| self.entries[i].1)
    }

    /// Zero-based position in the ordering.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(id, s)| (id.as_str(), *s))
    }

    pub fn top(&self, n: usize) -> &[(String, f64)] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, s)| s).sum()
    }
}

/// Descending score, ascending id on ties.
pub fn by_score_then_id(a: &(String, f64), b: &(String, f64)) -> Ordering {
    b.1.partial_cmp(&a.1)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.0.cmp(&b.0))
}

pub struct ImportanceEngine {
    config: PageRankConfig,
}

impl ImportanceEngine {
    pub fn new(config: PageRankConfig) -> Self {
        ImportanceEngine { config }
    }

    pub fn rank(&self, graph: &CodeGraph) -> Ranking {
        let adj = graph.adjacency();
        let n = adj.len();
        if n == 0 {
            return Ranking::from_scores(Vec::new(), 0, true);
        }
        if adj.edge_count() == 0 {
            let uniform = 1.0 / n as f64;
            let scores = adj.ids.into_iter().map(|id| (id, uniform)).collect();
            return Ranking::from_scores(scores, 0, true);
        }

        let out_weight = out_weights(&adj);
        let mut scores = vec![1.0 / n as f64; n];
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.config.max_iterations {
            let next = self.iterate_once(&adj, &out_weight, &scores);
            iterations += 1;
            let delta: f64 = scores.iter().zip(&next).map(|(a, b)| (a - b).abs()).sum();
            scores = next;
            if delta < self.config.tolerance {
                converged = true;
                break;
            }
        }

        if converged {
            debug!(nodes = n, iterations, "pagerank converged");
        } else {
            warn!(
                nodes = n,
                iterations, "pagerank hit the iteration cap before converging"
            );
        }

        let scores = adj.ids.into_iter().zip(scores).collect();
        Ranking::from_scores(scores, iterations, converged)
    }

    /// One power-iteration step. `out_weight[i]` is the summed weight of
    /// node `i`'s out-edges; zero marks a dangling node.
    pub fn iterate_once(&self, adj: &Adjacency, out_weight: &[f64], scores: &[f64]) -> Vec<f64> {
        let n = adj.len();
        let d = self.config.damping;
        let mut next = vec![(1.0 - d) / n as f64; n];
        let mut dangling = 0.0;

        for (i, edges) in adj.out.iter().enumerate() {
            if out_weight[i] <= 0.0 {
                match self.config.dangling {
                    DanglingPolicy::Uniform => dangling += scores[i],
                    DanglingPolicy::SelfLoop => next[i] += d * scores[i],
                }
                continue;
            }
            let share = d * scores[i] / out_weight[i];
            for &(t, w) in edges {
                next[t] += share * w;
            }
        }

        if dangling > 0.0 {
            let spread = d * dangling / n as f64;
            for s in &mut next {
                *s += spread;
            }
        }
        next
    }
}

/// Summed out-edge weight per node.
pub fn out_weights(adj: &Adjacency) -> Vec<f64> {
    adj.out
        .iter()
        .map(|edges| edges.iter().map(|(_, w)| w).sum())
        .collect()
}
