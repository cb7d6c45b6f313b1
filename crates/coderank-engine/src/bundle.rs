//! The immutable result of one analysis run

use crate::builder::{CodeGraphs, ImportStats};
use crate::hits::HubAuthority;
use crate::pagerank::Ranking;
use crate::resolver::ResolutionStats;
use coderank_core::{
    CodeGraph, EngineConfig, EntityKind, FileNode, Language, ParseWarning, SymbolSet,
};
use coderank_indexer::ExtractedFile;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Everything one repository load produced. Never mutated after
/// construction; a new load builds a new bundle with a new generation.
#[derive(Debug, Clone)]
pub struct GraphBundle {
    pub generation: u64,
    pub config: EngineConfig,
    /// Files in loader order.
    pub files: Vec<FileNode>,
    /// Extracted symbols keyed by file path.
    pub symbols: HashMap<String, SymbolSet>,
    pub graphs: CodeGraphs,
    pub file_rank: Ranking,
    pub function_rank: Ranking,
    pub module_rank: Ranking,
    pub hits: HubAuthority,
    pub centrality: Ranking,
    pub warnings: Vec<ParseWarning>,
    pub stats: RepoStats,
}

impl GraphBundle {
    pub fn graph(&self, kind: EntityKind) -> &CodeGraph {
        match kind {
            EntityKind::File => &self.graphs.import_graph,
            EntityKind::Function => &self.graphs.call_graph,
            EntityKind::Module => &self.graphs.module_graph,
        }
    }

    pub fn ranking(&self, kind: EntityKind) -> &Ranking {
        match kind {
            EntityKind::File => &self.file_rank,
            EntityKind::Function => &self.function_rank,
            EntityKind::Module => &self.module_rank,
        }
    }

    pub fn file(&self, path: &str) -> Option<&FileNode> {
        self.files.iter().find(|f| f.path == path)
    }
}

/// Repository-wide counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RepoStats {
    pub total_files: usize,
    /// Files in a language with an extractor.
    pub source_files: usize,
    pub languages: BTreeMap<Language, usize>,
    pub functions: usize,
    pub classes: usize,
    /// Raw import statements across all files.
    pub imports: usize,
    /// Distinct top-level packages, local and external.
    pub packages: usize,
    pub local_packages: usize,
    pub import_edges: usize,
    pub call_edges: usize,
    /// Mean total degree in the import graph.
    pub avg_file_connections: f64,
    /// Mean total degree in the call graph.
    pub avg_function_calls: f64,
    pub warnings: usize,
    pub import_resolution: ImportStats,
    pub call_resolution: ResolutionStats,
}

impl RepoStats {
    pub fn collect(files: &[ExtractedFile], graphs: &CodeGraphs, warnings: usize) -> Self {
        let mut languages: BTreeMap<Language, usize> = BTreeMap::new();
        for f in files {
            *languages.entry(f.file.language).or_default() += 1;
        }

        RepoStats {
            total_files: files.len(),
            source_files: files.iter().filter(|f| f.file.language.is_source()).count(),
            languages,
            functions: files.iter().map(|f| f.symbols.functions.len()).sum(),
            classes: files.iter().map(|f| f.symbols.classes.len()).sum(),
            imports: files.iter().map(|f| f.symbols.imports.len()).sum(),
            packages: graphs.modules.len(),
            local_packages: graphs.modules.iter().filter(|m| m.is_local).count(),
            import_edges: graphs.import_graph.edge_count(),
            call_edges: graphs.call_graph.edge_count(),
            avg_file_connections: mean_degree(&graphs.import_graph),
            avg_function_calls: mean_degree(&graphs.call_graph),
            warnings,
            import_resolution: graphs.import_stats.clone(),
            call_resolution: graphs.call_stats.clone(),
        }
    }
}

fn mean_degree(graph: &CodeGraph) -> f64 {
    let nodes = graph.node_count().max(1) as f64;
    2.0 * graph.edge_count() as f64 / nodes
}

/// Per-file view combining raw symbols with graph scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileMetrics {
    pub path: String,
    pub language: Language,
    pub size: u64,
    pub lines: u32,
    pub functions: Vec<String>,
    pub classes: Vec<String>,
    pub imports: Vec<String>,
    pub pagerank: f64,
    pub hub: f64,
    pub authority: f64,
    /// Out-degree in the import graph.
    pub imports_count: usize,
    /// In-degree in the import graph.
    pub imported_by_count: usize,
}
