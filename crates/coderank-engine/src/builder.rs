//! Builds the import, module and call graphs from extracted files
//!
//! Call resolution is a strict two-pass protocol: the symbol table covers
//! every file before a single call site is looked up.

use crate::imports::{FileIndex, ImportResolution, ImportResolver};
use crate::resolver::{CallResolver, ResolutionStats, verify_edges};
use coderank_core::{
    CodeGraph, EntityKind, GraphNode, ImportEdge, ImportTarget, ModuleNode, ResolverConfig,
    Result, SymbolTable, aggregate_edges, module_of_path,
};
use coderank_indexer::ExtractedFile;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

/// Counters over import resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub statements: usize,
    pub local: usize,
    pub external: usize,
    pub dangling: usize,
}

/// The three graphs plus everything derived while building them.
#[derive(Debug, Clone, Default)]
pub struct CodeGraphs {
    /// file -> file, local imports only
    pub import_graph: CodeGraph,
    /// package -> package, local and external
    pub module_graph: CodeGraph,
    /// function -> function
    pub call_graph: CodeGraph,
    pub import_edges: Vec<ImportEdge>,
    pub modules: Vec<ModuleNode>,
    pub symbol_table: SymbolTable,
    pub import_stats: ImportStats,
    pub call_stats: ResolutionStats,
}

pub struct GraphBuilder<'a> {
    config: &'a ResolverConfig,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(config: &'a ResolverConfig) -> Self {
        GraphBuilder { config }
    }

    pub fn build(&self, files: &[ExtractedFile]) -> Result<CodeGraphs> {
        let mut graphs = CodeGraphs::default();
        self.build_import_graph(files, &mut graphs);
        self.build_module_graph(files, &mut graphs);
        self.build_call_graph(files, &mut graphs)?;

        info!(
            files = graphs.import_graph.node_count(),
            import_edges = graphs.import_graph.edge_count(),
            modules = graphs.module_graph.node_count(),
            functions = graphs.call_graph.node_count(),
            call_edges = graphs.call_graph.edge_count(),
            "graphs built"
        );
        Ok(graphs)
    }

    fn build_import_graph(&self, files: &[ExtractedFile], graphs: &mut CodeGraphs) {
        for f in files {
            graphs.import_graph.add_node(GraphNode {
                id: f.file.path.clone(),
                kind: EntityKind::File,
                is_local: true,
                is_source: f.file.language.is_source(),
            });
        }

        let index = FileIndex::new(files.iter().map(|f| f.file.path.as_str()));
        let resolver = ImportResolver::new(&index);
        let stats = &mut graphs.import_stats;

        for f in files {
            let from = f.file.path.as_str();
            for import in &f.symbols.imports {
                stats.statements += 1;
                match resolver.resolve(from, f.file.language, import) {
                    ImportResolution::Local { files: targets, package } => {
                        stats.local += 1;
                        let weight = if package { 1.0 / targets.len() as f64 } else { 1.0 };
                        for target in targets {
                            graphs.import_graph.add_weight(from, &target, weight);
                            graphs.import_edges.push(ImportEdge {
                                source: from.to_string(),
                                target: ImportTarget::File(target),
                                is_local: true,
                            });
                        }
                    }
                    ImportResolution::External(name) => {
                        stats.external += 1;
                        graphs.import_edges.push(ImportEdge {
                            source: from.to_string(),
                            target: ImportTarget::Module(name),
                            is_local: false,
                        });
                    }
                    ImportResolution::Dangling => {
                        stats.dangling += 1;
                        debug!(path = from, target = %import.target, "import points at no repository file");
                    }
                }
            }
        }
    }

    /// Local packages come first, in file order, then external libraries in
    /// order of first import.
    fn build_module_graph(&self, files: &[ExtractedFile], graphs: &mut CodeGraphs) {
        let mut local: BTreeMap<String, bool> = BTreeMap::new();
        let mut order: Vec<String> = Vec::new();
        for f in files {
            let name = module_of_path(&f.file.path);
            let has_source = f.file.language.is_source();
            match local.get_mut(&name) {
                Some(seen) => *seen |= has_source,
                None => {
                    local.insert(name.clone(), has_source);
                    order.push(name);
                }
            }
        }

        for name in &order {
            graphs.module_graph.add_node(GraphNode {
                id: name.clone(),
                kind: EntityKind::Module,
                is_local: true,
                is_source: local.get(name).copied().unwrap_or(false),
            });
            graphs.modules.push(ModuleNode {
                name: name.clone(),
                is_local: true,
            });
        }

        let mut external: HashSet<&str> = HashSet::new();
        let mut shadowed: HashSet<&str> = HashSet::new();
        for edge in &graphs.import_edges {
            let ImportTarget::Module(name) = &edge.target else {
                continue;
            };
            if local.contains_key(name) {
                if shadowed.insert(name.as_str()) {
                    debug!(
                        module = %name,
                        importer = %edge.source,
                        "external import shares its name with a local package; merged into the local node"
                    );
                }
                continue;
            }
            if external.insert(name.as_str()) {
                graphs.module_graph.add_node(GraphNode {
                    id: name.clone(),
                    kind: EntityKind::Module,
                    is_local: false,
                    is_source: true,
                });
                graphs.modules.push(ModuleNode {
                    name: name.clone(),
                    is_local: false,
                });
            }
        }

        for edge in aggregate_edges(&graphs.import_edges) {
            graphs
                .module_graph
                .add_weight(&edge.source, &edge.target, edge.count as f64);
        }
    }

    fn build_call_graph(&self, files: &[ExtractedFile], graphs: &mut CodeGraphs) -> Result<()> {
        // Pass 1: every definition in the repository.
        for f in files {
            for symbol in &f.symbols.functions {
                let id = symbol.qualified_id.clone();
                if !graphs.symbol_table.insert(symbol.clone()) {
                    debug!(id = %id, "duplicate qualified id ignored");
                    continue;
                }
                graphs.call_graph.add_node(GraphNode {
                    id,
                    kind: EntityKind::Function,
                    is_local: true,
                    is_source: true,
                });
            }
        }
        debug!(
            functions = graphs.symbol_table.len(),
            names = graphs.symbol_table.name_count(),
            "symbol table complete"
        );

        // Pass 2: resolve call sites against the finished table.
        let resolver = CallResolver::new(&graphs.symbol_table, self.config);
        let sites = files.iter().flat_map(|f| f.symbols.calls.iter());
        let (edges, stats) = resolver.edges(sites);
        verify_edges(&graphs.symbol_table, &edges)?;

        for edge in &edges {
            graphs
                .call_graph
                .add_weight(&edge.caller, &edge.callee, edge.weight);
        }
        debug!(
            sites = stats.call_sites,
            unique = stats.unique,
            proximity = stats.proximity,
            ambiguous = stats.ambiguous,
            external = stats.external,
            "call sites resolved"
        );
        graphs.call_stats = stats;
        Ok(())
    }
}
