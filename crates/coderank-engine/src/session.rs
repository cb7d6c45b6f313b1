//! Generation-tagged holder of the current analysis
//!
//! A load builds a complete bundle off to the side and then swaps the
//! pointer. Readers hold an `Arc` to the bundle they started with, so a
//! query never sees two generations at once.

use crate::bundle::GraphBundle;
use crate::pipeline::Analyzer;
use coderank_core::{CodeRankError, Result, SourceFile};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

#[derive(Debug, Default)]
pub struct Session {
    current: RwLock<Option<Arc<GraphBundle>>>,
    next_generation: AtomicU64,
}

impl Session {
    pub fn new() -> Self {
        Session::default()
    }

    /// Reserve the id for the next bundle. Ids start at 1.
    pub fn next_generation(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Analyze `files` and make the result current.
    pub fn load(&self, analyzer: &Analyzer, files: &[SourceFile]) -> Result<Arc<GraphBundle>> {
        let generation = self.next_generation();
        let bundle = analyzer.analyze(files, generation)?;
        Ok(self.install(bundle))
    }

    /// Make `bundle` current unless a newer generation is already installed.
    pub fn install(&self, bundle: GraphBundle) -> Arc<GraphBundle> {
        let bundle = Arc::new(bundle);
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let newer_installed = current
            .as_ref()
            .is_some_and(|c| c.generation > bundle.generation);
        if !newer_installed {
            info!(generation = bundle.generation, "analysis installed");
            *current = Some(Arc::clone(&bundle));
        }
        bundle
    }

    /// The current bundle.
    pub fn current(&self) -> Result<Arc<GraphBundle>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(CodeRankError::NotLoaded)
    }

    pub fn generation(&self) -> Option<u64> {
        self.current().ok().map(|b| b.generation)
    }

    /// The current bundle, provided it is still `generation`.
    pub fn snapshot(&self, generation: u64) -> Result<Arc<GraphBundle>> {
        let bundle = self.current()?;
        if bundle.generation != generation {
            return Err(CodeRankError::StaleGeneration {
                requested: generation,
                current: bundle.generation,
            });
        }
        Ok(bundle)
    }
}
