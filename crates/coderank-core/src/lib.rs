//! Core data model: weighted code graph, symbol table and configuration

pub mod aggregation;
pub mod config;
pub mod error;
pub mod graph;
pub mod model;
pub mod symbols;


#[cfg(test)]
pub mod test_utils;

pub use aggregation::{AggregatedEdge, aggregate_edges, module_of_path};
pub use config::{DanglingPolicy, EngineConfig, ExportConfig, HitsConfig, PageRankConfig, ResolverConfig};
pub use error::{CodeRankError, Result};
pub use graph::{Adjacency, CodeGraph, GraphNode, WeightedEdge};
pub use model::{
    CallEdge, CallSite, ClassSymbol, EntityKind, FileNode, FunctionSymbol, ImportEdge, ImportKind,
    ImportRef, ImportTarget, Language, ModuleNode, ParseWarning, SourceFile, Symbol, SymbolRole,
    SymbolSet, file_of, normalize_path, parent_dir, qualified_id,
};
pub use symbols::SymbolTable;
