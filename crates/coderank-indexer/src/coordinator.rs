//! Orchestrates extraction across a repository
//!
//! Files have no cross-file dependency at this stage, so they are handed to
//! rayon's pool. Everything after extraction is whole-repository work and runs
//! on the caller's thread.

use crate::languages::extractor_for;
use coderank_core::{FileNode, ParseWarning, SourceFile, SymbolSet};
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Extraction output for one file.
#[derive(Debug, Clone)]
pub struct ExtractedFile {
    pub file: FileNode,
    pub symbols: SymbolSet,
    pub warnings: Vec<ParseWarning>,
}

pub struct Coordinator {
    parallel: bool,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl Coordinator {
    pub fn new() -> Self {
        Coordinator { parallel: true }
    }

    /// Extract on the calling thread only.
    pub fn sequential() -> Self {
        Coordinator { parallel: false }
    }

    /// Extract every file. Output order matches input order.
    pub fn run(&self, files: &[SourceFile]) -> Vec<ExtractedFile> {
        let extracted: Vec<ExtractedFile> = if self.parallel {
            files.par_iter().map(extract_file).collect()
        } else {
            files.iter().map(extract_file).collect()
        };

        let warnings: usize = extracted.iter().map(|f| f.warnings.len()).sum();
        let functions: usize = extracted.iter().map(|f| f.symbols.functions.len()).sum();
        info!(
            files = extracted.len(),
            functions,
            warnings,
            "symbol extraction finished"
        );
        extracted
    }
}

/// Extract one file. Failures become warnings; the file itself is always kept.
pub fn extract_file(file: &SourceFile) -> ExtractedFile {
    let node = FileNode::from_source(file);
    let Some(extractor) = extractor_for(file.language) else {
        return ExtractedFile {
            file: node,
            symbols: SymbolSet::default(),
            warnings: Vec::new(),
        };
    };

    match extractor.extract(&file.path, &file.text) {
        Ok(result) => {
            debug!(
                path = %file.path,
                functions = result.symbols.functions.len(),
                imports = result.symbols.imports.len(),
                calls = result.symbols.calls.len(),
                "extracted"
            );
            let warnings = result
                .skipped
                .into_iter()
                .map(|message| {
                    warn!(path = %file.path, "{message}");
                    ParseWarning {
                        path: file.path.clone(),
                        message,
                    }
                })
                .collect();
            ExtractedFile {
                file: node,
                symbols: result.symbols,
                warnings,
            }
        }
        Err(e) => {
            warn!(path = %file.path, error = %e, "extraction failed");
            ExtractedFile {
                file: node,
                symbols: SymbolSet::default(),
                warnings: vec![ParseWarning {
                    path: file.path.clone(),
                    message: e.to_string(),
                }],
            }
        }
    }
}
