//! Betweenness centrality over the function call graph (Brandes)

use crate::pagerank::Ranking;
use coderank_core::CodeGraph;
use std::collections::VecDeque;
use tracing::debug;

/// Above this many nodes, only an evenly spaced sample of sqrt(n) sources
/// is expanded and the result is scaled up.
pub const EXACT_LIMIT: usize = 1000;

/// Unweighted, directed betweenness, normalised by (n-1)(n-2). Graphs with
/// fewer than three nodes score zero everywhere.
pub fn betweenness(graph: &CodeGraph) -> Ranking {
    let adj = graph.adjacency();
    let n = adj.len();
    if n <= 2 {
        let zeros = adj.ids.into_iter().map(|id| (id, 0.0)).collect();
        return Ranking::from_scores(zeros, 0, true);
    }

    let sources: Vec<usize> = if n > EXACT_LIMIT {
        let sample = (n as f64).sqrt() as usize;
        let step = n / sample;
        (0..sample).map(|i| i * step).collect()
    } else {
        (0..n).collect()
    };
    let scale = n as f64 / sources.len() as f64;
    debug!(nodes = n, sources = sources.len(), "betweenness");

    let mut centrality = vec![0.0f64; n];
    let mut stack: Vec<usize> = Vec::with_capacity(n);
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut sigma = vec![0.0f64; n];
    let mut dist: Vec<i64> = vec![-1; n];
    let mut delta = vec![0.0f64; n];
    let mut queue: VecDeque<usize> = VecDeque::new();

    for &s in &sources {
        stack.clear();
        for p in &mut predecessors {
            p.clear();
        }
        sigma.fill(0.0);
        dist.fill(-1);
        delta.fill(0.0);

        sigma[s] = 1.0;
        dist[s] = 0;
        queue.push_back(s);

        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for &(w, _) in &adj.out[v] {
                if w == v {
                    continue;
                }
                if dist[w] < 0 {
                    dist[w] = dist[v] + 1;
                    queue.push_back(w);
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    predecessors[w].push(v);
                }
            }
        }

        while let Some(w) = stack.pop() {
            for &v in &predecessors[w] {
                delta[v] += (sigma[v] / sigma[w]) * (1.0 + delta[w]);
            }
            if w != s {
                centrality[w] += delta[w];
            }
        }
    }

    let norm = ((n - 1) * (n - 2)) as f64;
    let scores = adj
        .ids
        .into_iter()
        .zip(centrality)
        .map(|(id, c)| (id, c * scale / norm))
        .collect();
    Ranking::from_scores(scores, sources.len(), true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use coderank_core::{EntityKind, GraphNode};

    fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> CodeGraph {
        let mut g = CodeGraph::new();
        for id in nodes {
            g.add_node(GraphNode {
                id: id.to_string(),
                kind: EntityKind::Function,
                is_local: true,
                is_source: true,
            });
        }
        for (s, t) in edges {
            g.add_weight(s, t, 1.0);
        }
        g
    }

    #[test]
    fn test_chain_middle_is_central() {
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
        let ranking = betweenness(&g);
        // Only a -> c passes through b: 1 / ((3-1)(3-2)).
        assert_eq!(ranking.score("b"), Some(0.5));
        assert_eq!(ranking.score("a"), Some(0.0));
        assert_eq!(ranking.score("c"), Some(0.0));
    }

    #[test]
    fn test_parallel_paths_share_credit() {
        let g = graph(
            &["s", "x", "y", "t"],
            &[("s", "x"), ("s", "y"), ("x", "t"), ("y", "t")],
        );
        let ranking = betweenness(&g);
        assert_eq!(ranking.score("x"), ranking.score("y"));
        assert!(ranking.score("x").unwrap() > 0.0);
    }

    #[test]
    fn test_self_loops_and_tiny_graphs() {
        let g = graph(&["f", "g"], &[("f", "f"), ("f", "g")]);
        let ranking = betweenness(&g);
        assert!(ranking.iter().all(|(_, s)| s == 0.0));

        let g = graph(&["f", "g", "h"], &[("f", "f"), ("f", "g"), ("g", "h")]);
        assert_eq!(betweenness(&g).score("g"), Some(0.5));
    }
}
