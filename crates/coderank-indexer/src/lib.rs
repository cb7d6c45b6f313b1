//! Per-file symbol extraction: definitions, imports and call sites

pub mod coordinator;
pub mod extractor;
pub mod languages;
pub mod parser_pool;


pub use coordinator::{Coordinator, ExtractedFile, extract_file};
pub use extractor::{ExtractionResult, LanguageExtractor};
pub use languages::extractor_for;
