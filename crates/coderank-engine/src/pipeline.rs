//! The batch pipeline: extract, build, rank, classify

use crate::builder::GraphBuilder;
use crate::bundle::{GraphBundle, RepoStats};
use crate::centrality::betweenness;
use crate::hits::HubAuthorityClassifier;
use crate::pagerank::ImportanceEngine;
use coderank_core::{CodeRankError, EngineConfig, Result, SourceFile};
use coderank_indexer::Coordinator;
use std::time::Instant;
use tracing::info;

pub struct Analyzer {
    config: EngineConfig,
    coordinator: Coordinator,
}

impl Analyzer {
    pub fn new(config: EngineConfig) -> Self {
        Analyzer {
            config,
            coordinator: Coordinator::new(),
        }
    }

    pub fn with_coordinator(mut self, coordinator: Coordinator) -> Self {
        self.coordinator = coordinator;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run every stage to completion. Per-file problems end up in
    /// `GraphBundle::warnings`; only an empty input or an inconsistent call
    /// graph is an error.
    pub fn analyze(&self, files: &[SourceFile], generation: u64) -> Result<GraphBundle> {
        if files.is_empty() {
            return Err(CodeRankError::NoFiles);
        }
        let start = Instant::now();

        let extracted = self.coordinator.run(files);
        let graphs = GraphBuilder::new(&self.config.resolver).build(&extracted)?;

        let engine = ImportanceEngine::new(self.config.pagerank.clone());
        let file_rank = engine.rank(&graphs.import_graph);
        let function_rank = engine.rank(&graphs.call_graph);
        let module_rank = engine.rank(&graphs.module_graph);
        let hits = HubAuthorityClassifier::new(self.config.hits.clone()).classify(&graphs.import_graph);
        let centrality = betweenness(&graphs.call_graph);

        let warnings: Vec<_> = extracted
            .iter()
            .flat_map(|f| f.warnings.iter().cloned())
            .collect();
        let stats = RepoStats::collect(&extracted, &graphs, warnings.len());

        let mut symbols = std::collections::HashMap::with_capacity(extracted.len());
        let mut nodes = Vec::with_capacity(extracted.len());
        for f in extracted {
            symbols.insert(f.file.path.clone(), f.symbols);
            nodes.push(f.file);
        }

        info!(
            generation,
            files = stats.total_files,
            functions = stats.functions,
            warnings = stats.warnings,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "analysis complete"
        );

        Ok(GraphBundle {
            generation,
            config: self.config.clone(),
            files: nodes,
            symbols,
            graphs,
            file_rank,
            function_rank,
            module_rank,
            hits,
            centrality,
            warnings,
            stats,
        })
    }
}
