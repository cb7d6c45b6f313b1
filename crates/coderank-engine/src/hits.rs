//! Hub and authority scores over the import graph (weighted HITS)

use crate::pagerank::Ranking;
use coderank_core::{CodeGraph, HitsConfig};
use tracing::{debug, warn};

/// Hub and authority rankings for one graph. Each set of scores sums to one,
/// or is all zero when the graph has no edges.
#[derive(Debug, Clone, Default)]
pub struct HubAuthority {
    pub hubs: Ranking,
    pub authorities: Ranking,
}

pub struct HubAuthorityClassifier {
    config: HitsConfig,
}

impl HubAuthorityClassifier {
    pub fn new(config: HitsConfig) -> Self {
        HubAuthorityClassifier { config }
    }

    pub fn classify(&self, graph: &CodeGraph) -> HubAuthority {
        let adj = graph.adjacency();
        let n = adj.len();
        if adj.edge_count() == 0 {
            let zeros: Vec<(String, f64)> = adj.ids.iter().map(|id| (id.clone(), 0.0)).collect();
            return HubAuthority {
                hubs: Ranking::from_scores(zeros.clone(), 0, true),
                authorities: Ranking::from_scores(zeros, 0, true),
            };
        }

        let incoming = adj.incoming();
        let mut hub = vec![1.0 / n as f64; n];
        let mut auth = vec![1.0 / n as f64; n];
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.config.max_iterations {
            iterations += 1;

            let mut next_auth: Vec<f64> = incoming
                .iter()
                .map(|sources| sources.iter().map(|&(s, w)| w * hub[s]).sum())
                .collect();
            normalize(&mut next_auth);

            let mut next_hub: Vec<f64> = adj
                .out
                .iter()
                .map(|targets| targets.iter().map(|&(t, w)| w * next_auth[t]).sum())
                .collect();
            normalize(&mut next_hub);

            let delta = l1_distance(&hub, &next_hub) + l1_distance(&auth, &next_auth);
            hub = next_hub;
            auth = next_auth;
            if delta < self.config.tolerance {
                converged = true;
                break;
            }
        }

        if converged {
            debug!(nodes = n, iterations, "hits converged");
        } else {
            warn!(nodes = n, iterations, "hits hit the iteration cap before converging");
        }

        let pair = |scores: Vec<f64>| adj.ids.iter().cloned().zip(scores).collect::<Vec<_>>();
        HubAuthority {
            hubs: Ranking::from_scores(pair(hub), iterations, converged),
            authorities: Ranking::from_scores(pair(auth), iterations, converged),
        }
    }
}

fn normalize(scores: &mut [f64]) {
    let total: f64 = scores.iter().sum();
    if total > 0.0 {
        for s in scores {
            *s /= total;
        }
    }
}

fn l1_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use coderank_core::{EntityKind, GraphNode};

    fn graph(edges: &[(&str, &str)]) -> CodeGraph {
        let mut g = CodeGraph::new();
        for (s, t) in edges {
            for id in [s, t] {
                g.add_node(GraphNode {
                    id: id.to_string(),
                    kind: EntityKind::File,
                    is_local: true,
                    is_source: true,
                });
            }
        }
        for (s, t) in edges {
            g.add_weight(s, t, 1.0);
        }
        g
    }

    #[test]
    fn test_star_importer_is_hub_and_shared_target_is_authority() {
        // main imports everything; every module imports util.
        let g = graph(&[
            ("main.py", "a.py"),
            ("main.py", "b.py"),
            ("main.py", "util.py"),
            ("a.py", "util.py"),
            ("b.py", "util.py"),
        ]);
        let result = HubAuthorityClassifier::new(HitsConfig::default()).classify(&g);

        assert_eq!(result.hubs.iter().next().map(|(id, _)| id), Some("main.py"));
        assert_eq!(result.authorities.iter().next().map(|(id, _)| id), Some("util.py"));
        assert_eq!(result.authorities.score("main.py"), Some(0.0));
        assert_eq!(result.hubs.score("util.py"), Some(0.0));
        assert!((result.hubs.total() - 1.0).abs() < 1e-9);
        assert!((result.authorities.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_edges_gives_zero_scores() {
        let mut g = CodeGraph::new();
        g.add_node(GraphNode {
            id: "lonely.py".into(),
            kind: EntityKind::File,
            is_local: true,
            is_source: true,
        });
        let result = HubAuthorityClassifier::new(HitsConfig::default()).classify(&g);
        assert_eq!(result.hubs.score("lonely.py"), Some(0.0));
        assert_eq!(result.authorities.total(), 0.0);
    }
}
