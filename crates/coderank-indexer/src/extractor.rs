//! Language extractor trait definition

use coderank_core::{Symbol, SymbolSet};
use std::collections::HashSet;

/// Output of one extractor run over one file.
#[derive(Debug, Clone, Default)]
pub struct ExtractionResult {
    pub symbols: SymbolSet,
    /// Constructs that could not be extracted. The rest of the file still counts.
    pub skipped: Vec<String>,
}

/// Extracts definitions, raw imports and call sites from the text of one file.
pub trait LanguageExtractor: Send + Sync {
    fn extract(&self, path: &str, text: &str) -> anyhow::Result<ExtractionResult>;
}

/// Keeps qualified ids unique within a file. A repeated id (a conditional
/// re-definition, an overload) gets an `@line` suffix.
#[derive(Debug, Default)]
pub(crate) struct QualifiedIds {
    seen: HashSet<String>,
}

impl QualifiedIds {
    pub(crate) fn claim(&mut self, symbol: &mut Symbol) {
        if !self.seen.insert(symbol.qualified_id.clone()) {
            symbol.qualified_id = format!("{}@{}", symbol.qualified_id, symbol.start_line);
            self.seen.insert(symbol.qualified_id.clone());
        }
    }
}
