//! Call-site resolution against the repository-wide symbol table
//!
//! Runs after the symbol table is complete. Bare callee names are matched
//! against every definition in the repository; name collisions are narrowed
//! by proximity (same file, then same directory) and otherwise spread over
//! the remaining candidates at a reduced weight.

use coderank_core::{
    CallEdge, CallSite, CodeRankError, ResolverConfig, Result, SymbolTable, file_of, parent_dir,
};
use serde::Serialize;
use tracing::debug;

/// How one call site was resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum CallResolution {
    /// No definition with that name: a builtin or third-party call.
    External,
    /// Exactly one definition in the repository.
    Unique(String),
    /// Several definitions, one of them in the caller's file or directory.
    Proximity(String),
    /// Several definitions with no proximity winner.
    Ambiguous(Vec<String>),
}

/// Counters over all resolved call sites.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionStats {
    pub call_sites: usize,
    pub unique: usize,
    pub proximity: usize,
    pub ambiguous: usize,
    pub external: usize,
}

pub struct CallResolver<'a> {
    table: &'a SymbolTable,
    config: &'a ResolverConfig,
}

impl<'a> CallResolver<'a> {
    pub fn new(table: &'a SymbolTable, config: &'a ResolverConfig) -> Self {
        CallResolver { table, config }
    }

    pub fn resolve(&self, site: &CallSite) -> CallResolution {
        let candidates = self.table.candidates(&site.callee);
        match candidates {
            [] => CallResolution::External,
            [only] => CallResolution::Unique(only.clone()),
            _ => self.disambiguate(&site.caller, candidates),
        }
    }

    fn disambiguate(&self, caller: &str, candidates: &[String]) -> CallResolution {
        let caller_file = file_of(caller);

        if self.config.prefer_same_file {
            let mut same_file = candidates.iter().filter(|c| file_of(c) == caller_file);
            if let (Some(winner), None) = (same_file.next(), same_file.next()) {
                return CallResolution::Proximity(winner.clone());
            }
        }

        let caller_dir = parent_dir(caller_file);
        let same_dir: Vec<&String> = candidates
            .iter()
            .filter(|c| parent_dir(file_of(c)) == caller_dir)
            .collect();

        let tied: Vec<String> = match same_dir.as_slice() {
            [winner] => return CallResolution::Proximity((*winner).clone()),
            [] => candidates.to_vec(),
            several => several.iter().map(|c| (*c).clone()).collect(),
        };
        let cap = self.config.max_ambiguous_fanout.unwrap_or(usize::MAX);
        CallResolution::Ambiguous(tied.into_iter().take(cap).collect())
    }

    /// Resolve every call site into weighted edges. Repeated sites produce
    /// repeated edges; the graph sums them.
    pub fn edges<'s>(
        &self,
        sites: impl IntoIterator<Item = &'s CallSite>,
    ) -> (Vec<CallEdge>, ResolutionStats) {
        let mut edges = Vec::new();
        let mut stats = ResolutionStats::default();

        for site in sites {
            stats.call_sites += 1;
            let edge = |callee: String, weight: f64| CallEdge {
                caller: site.caller.clone(),
                callee,
                weight,
            };
            match self.resolve(site) {
                CallResolution::External => stats.external += 1,
                CallResolution::Unique(callee) => {
                    stats.unique += 1;
                    edges.push(edge(callee, 1.0));
                }
                CallResolution::Proximity(callee) => {
                    stats.proximity += 1;
                    edges.push(edge(callee, 1.0));
                }
                CallResolution::Ambiguous(tied) => {
                    stats.ambiguous += 1;
                    debug!(
                        caller = %site.caller,
                        callee = %site.callee,
                        candidates = tied.len(),
                        "ambiguous call"
                    );
                    let weight = self.config.ambiguous_weight;
                    edges.extend(tied.into_iter().map(|c| edge(c, weight)));
                }
            }
        }
        (edges, stats)
    }
}

/// Every edge endpoint must be a known definition. A miss is a bug in graph
/// construction and aborts the run.
pub fn verify_edges(table: &SymbolTable, edges: &[CallEdge]) -> Result<()> {
    for edge in edges {
        if !table.contains(&edge.caller) || !table.contains(&edge.callee) {
            return Err(CodeRankError::InconsistentGraph {
                caller: edge.caller.clone(),
                callee: edge.callee.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use coderank_core::Symbol;

    fn table(defs: &[(&str, Option<&str>, &str)]) -> SymbolTable {
        let mut table = SymbolTable::new();
        for (file, scope, name) in defs {
            table.insert(Symbol::function(file, *scope, name, 1, 2));
        }
        table
    }

    fn site(caller: &str, callee: &str) -> CallSite {
        CallSite {
            caller: caller.to_string(),
            callee: callee.to_string(),
            line: 1,
        }
    }

    #[test]
    fn test_unknown_name_is_external() {
        let table = table(&[("a.py", None, "main")]);
        let config = ResolverConfig::default();
        let resolver = CallResolver::new(&table, &config);
        assert_eq!(resolver.resolve(&site("a.py::main", "print")), CallResolution::External);
    }

    #[test]
    fn test_same_directory_wins() {
        let table = table(&[
            ("dir1/a.py", None, "helper"),
            ("dir2/b.py", None, "helper"),
            ("dir1/c.py", None, "main"),
        ]);
        let config = ResolverConfig::default();
        let resolver = CallResolver::new(&table, &config);
        assert_eq!(
            resolver.resolve(&site("dir1/c.py::main", "helper")),
            CallResolution::Proximity("dir1/a.py::helper".into())
        );
    }

    #[test]
    fn test_same_file_wins_over_directory() {
        let table = table(&[
            ("dir1/a.py", None, "helper"),
            ("dir1/c.py", Some("K"), "helper"),
            ("dir1/c.py", None, "main"),
        ]);
        let mut config = ResolverConfig::default();
        let resolver = CallResolver::new(&table, &config);
        assert_eq!(
            resolver.resolve(&site("dir1/c.py::main", "helper")),
            CallResolution::Proximity("dir1/c.py::K.helper".into())
        );

        config.prefer_same_file = false;
        let resolver = CallResolver::new(&table, &config);
        assert_eq!(
            resolver.resolve(&site("dir1/c.py::main", "helper")),
            CallResolution::Ambiguous(vec!["dir1/a.py::helper".into(), "dir1/c.py::K.helper".into()])
        );
    }

    #[test]
    fn test_no_proximity_match_spreads_over_all() {
        let table = table(&[
            ("x/a.py", None, "helper"),
            ("y/b.py", None, "helper"),
            ("z/c.py", None, "helper"),
            ("w/d.py", None, "main"),
        ]);
        let mut config = ResolverConfig::default();
        let resolver = CallResolver::new(&table, &config);
        let CallResolution::Ambiguous(tied) = resolver.resolve(&site("w/d.py::main", "helper")) else {
            panic!("expected an ambiguous resolution");
        };
        assert_eq!(tied.len(), 3);

        config.max_ambiguous_fanout = Some(2);
        let resolver = CallResolver::new(&table, &config);
        let (edges, stats) = resolver.edges(&[site("w/d.py::main", "helper")]);
        assert_eq!(edges.len(), 2);
        assert!(edges.iter().all(|e| e.weight == 0.3));
        assert_eq!(stats.ambiguous, 1);
    }

    #[test]
    fn test_edges_counts_every_outcome() {
        let table = table(&[("a.py", None, "f"), ("a.py", None, "g")]);
        let config = ResolverConfig::default();
        let resolver = CallResolver::new(&table, &config);
        let sites = [site("a.py::f", "g"), site("a.py::f", "f"), site("a.py::g", "len")];
        let (edges, stats) = resolver.edges(&sites);

        assert_eq!(edges.len(), 2);
        assert_eq!(edges[1].caller, edges[1].callee);
        assert_eq!(
            stats,
            ResolutionStats {
                call_sites: 3,
                unique: 2,
                proximity: 0,
                ambiguous: 0,
                external: 1,
            }
        );
    }

    #[test]
    fn test_verify_rejects_unknown_endpoint() {
        let table = table(&[("a.py", None, "f")]);
        let edges = vec![CallEdge {
            caller: "a.py::f".into(),
            callee: "a.py::ghost".into(),
            weight: 1.0,
        }];
        let err = verify_edges(&table, &edges).unwrap_err();
        assert!(matches!(err, CodeRankError::InconsistentGraph { ref callee, .. } if callee == "a.py::ghost"));
    }
}
