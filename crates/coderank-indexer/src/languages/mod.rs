//! Language extractors and the per-language dispatch table

pub mod c;
pub mod go;
pub mod java;
pub mod javascript;
pub mod patterns;
pub mod python;
pub mod rust;
pub mod swift;

use crate::extractor::LanguageExtractor;
use coderank_core::Language;

/// The extractor for a language, or `None` for non-source files.
pub fn extractor_for(language: Language) -> Option<&'static dyn LanguageExtractor> {
    match language {
        Language::Python => Some(&python::PythonExtractor),
        Language::JavaScript => Some(&javascript::JavaScriptExtractor),
        Language::TypeScript => Some(&javascript::TypeScriptExtractor),
        Language::Java => Some(&java::JavaExtractor),
        Language::Swift => Some(&swift::SwiftExtractor),
        Language::C | Language::Cpp => Some(&c::CExtractor),
        Language::Go => Some(&go::GoExtractor),
        Language::Rust => Some(&rust::RustExtractor),
        Language::Markdown
        | Language::Json
        | Language::Yaml
        | Language::Toml
        | Language::Other => None,
    }
}
