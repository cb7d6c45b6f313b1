//! Core data structures for the code graph

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Separator between a file path and the symbol path inside it.
pub const QUALIFIER: &str = "::";

/// Supported languages, keyed by a static extension table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Java,
    Swift,
    C,
    Cpp,
    Go,
    Rust,

    // ── Recognised, but not source code ─────────────────────
    Markdown,
    Json,
    Yaml,
    Toml,

    // ── Fallback ────────────────────────────────────────────
    Other,
}

impl Language {
    /// Detect language from file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("py") | Some("pyi") => Language::Python,
            Some("js") | Some("jsx") | Some("mjs") | Some("cjs") => Language::JavaScript,
            Some("ts") | Some("tsx") | Some("mts") | Some("cts") => Language::TypeScript,
            Some("java") => Language::Java,
            Some("swift") => Language::Swift,
            Some("c") | Some("h") => Language::C,
            Some("cpp") | Some("cc") | Some("cxx") | Some("hpp") | Some("hh") | Some("hxx") => {
                Language::Cpp
            }
            Some("go") => Language::Go,
            Some("rs") => Language::Rust,
            Some("md") | Some("mdx") => Language::Markdown,
            Some("json") | Some("jsonc") => Language::Json,
            Some("yml") | Some("yaml") => Language::Yaml,
            Some("toml") => Language::Toml,
            _ => Language::Other,
        }
    }

    /// True for languages whose files count as parseable code.
    pub fn is_source(self) -> bool {
        !matches!(
            self,
            Language::Markdown | Language::Json | Language::Yaml | Language::Toml | Language::Other
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Java => "java",
            Language::Swift => "swift",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Markdown => "markdown",
            Language::Json => "json",
            Language::Yaml => "yaml",
            Language::Toml => "toml",
            Language::Other => "other",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = std::convert::Infallible;

    /// Parse a loader-supplied language tag. Unknown tags map to `Other`.
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Ok(match tag.to_ascii_lowercase().as_str() {
            "python" | "py" => Language::Python,
            "javascript" | "js" | "jsx" => Language::JavaScript,
            "typescript" | "ts" | "tsx" => Language::TypeScript,
            "java" => Language::Java,
            "swift" => Language::Swift,
            "c" => Language::C,
            "cpp" | "c++" | "cxx" => Language::Cpp,
            "go" | "golang" => Language::Go,
            "rust" | "rs" => Language::Rust,
            "markdown" | "md" => Language::Markdown,
            "json" => Language::Json,
            "yaml" | "yml" => Language::Yaml,
            "toml" => Language::Toml,
            _ => Language::Other,
        })
    }
}

/// A file handed over by the repository loader.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Repository-relative path with `/` separators.
    pub path: String,
    pub text: String,
    pub language: Language,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, text: impl Into<String>, language: Language) -> Self {
        SourceFile {
            path: normalize_path(&path.into()),
            text: text.into(),
            language,
        }
    }

    /// Build a source file, detecting the language from the path.
    pub fn detect(path: impl Into<String>, text: impl Into<String>) -> Self {
        let path = path.into();
        let language = Language::from_path(&path);
        Self::new(path, text, language)
    }
}

/// Convert a loader path into the canonical `a/b/c.ext` form.
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    unified
        .split('/')
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Directory part of a canonical path (`""` for files at the root).
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// A file in the analyzed repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    pub path: String,
    pub language: Language,
    /// Size in bytes.
    pub size: u64,
    pub lines: u32,
}

impl FileNode {
    pub fn from_source(file: &SourceFile) -> Self {
        FileNode {
            path: file.path.clone(),
            language: file.language,
            size: file.text.len() as u64,
            lines: file.text.lines().count() as u32,
        }
    }
}

/// Whether a symbol is callable or a type/container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolRole {
    Callable,
    Container,
}

/// A function or class definition with its line span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// `file::name`, or `file::Scope.name` for methods and nested definitions.
    pub qualified_id: String,
    /// Bare name, not unique across the repository.
    pub name: String,
    /// Dotted path of enclosing classes/functions, if any.
    pub scope: Option<String>,
    pub file: String,
    pub start_line: u32,
    pub end_line: u32,
    pub role: SymbolRole,
}

pub type FunctionSymbol = Symbol;
pub type ClassSymbol = Symbol;

impl Symbol {
    pub fn new(
        file: &str,
        scope: Option<&str>,
        name: &str,
        start_line: u32,
        end_line: u32,
        role: SymbolRole,
    ) -> Self {
        Symbol {
            qualified_id: qualified_id(file, scope, name),
            name: name.to_string(),
            scope: scope.map(str::to_string),
            file: file.to_string(),
            start_line,
            end_line: end_line.max(start_line),
            role,
        }
    }

    pub fn function(file: &str, scope: Option<&str>, name: &str, start: u32, end: u32) -> Self {
        Self::new(file, scope, name, start, end, SymbolRole::Callable)
    }

    pub fn class(file: &str, scope: Option<&str>, name: &str, start: u32, end: u32) -> Self {
        Self::new(file, scope, name, start, end, SymbolRole::Container)
    }

    /// Span length in lines.
    pub fn loc(&self) -> u32 {
        self.end_line - self.start_line + 1
    }

    pub fn contains_line(&self, line: u32) -> bool {
        self.start_line <= line && line <= self.end_line
    }
}

pub fn qualified_id(file: &str, scope: Option<&str>, name: &str) -> String {
    match scope {
        Some(scope) if !scope.is_empty() => format!("{file}{QUALIFIER}{scope}.{name}"),
        _ => format!("{file}{QUALIFIER}{name}"),
    }
}

/// Split a qualified id back into its file part.
pub fn file_of(qualified_id: &str) -> &str {
    match qualified_id.find(QUALIFIER) {
        Some(idx) => &qualified_id[..idx],
        None => qualified_id,
    }
}

/// How an import statement was spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    /// `import x`, `from x import y`, `use x::y`, `import 'x'`, ...
    Statement,
    /// C/C++ `#include`; `angled` for `<...>`.
    Include { angled: bool },
    /// Rust `mod name;`
    ModDeclaration,
}

/// A raw import statement. Local vs external is decided by the graph builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRef {
    /// Module reference as written (`os.path`, `..pkg`, `./util`, `stdio.h`, `crate::a`).
    pub target: String,
    /// Names imported from the target (`from x import a, b`, `use x::{a, b}`).
    pub names: Vec<String>,
    pub kind: ImportKind,
    pub line: u32,
}

impl ImportRef {
    pub fn statement(target: impl Into<String>, line: u32) -> Self {
        ImportRef {
            target: target.into(),
            names: Vec::new(),
            kind: ImportKind::Statement,
            line,
        }
    }

    pub fn with_names(mut self, names: Vec<String>) -> Self {
        self.names = names;
        self
    }

    pub fn with_kind(mut self, kind: ImportKind) -> Self {
        self.kind = kind;
        self
    }
}

/// A detected call expression inside a function body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    /// Qualified id of the innermost enclosing function.
    pub caller: String,
    /// Bare callee name.
    pub callee: String,
    pub line: u32,
}

/// Everything extracted from one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolSet {
    pub functions: Vec<FunctionSymbol>,
    pub classes: Vec<ClassSymbol>,
    pub imports: Vec<ImportRef>,
    pub calls: Vec<CallSite>,
}

impl SymbolSet {
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
            && self.classes.is_empty()
            && self.imports.is_empty()
            && self.calls.is_empty()
    }
}

/// Target of an import edge: a repository file, or a module known only by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "lowercase")]
pub enum ImportTarget {
    File(String),
    Module(String),
}

/// A resolved import relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportEdge {
    pub source: String,
    pub target: ImportTarget,
    pub is_local: bool,
}

/// A resolved call relationship between two qualified ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallEdge {
    pub caller: String,
    pub callee: String,
    pub weight: f64,
}

/// Top-level package or library.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleNode {
    pub name: String,
    pub is_local: bool,
}

/// Which kind of entity a ranking or graph node refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    File,
    Function,
    Module,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::File => "file",
            EntityKind::Function => "function",
            EntityKind::Module => "module",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" | "files" => Ok(EntityKind::File),
            "function" | "functions" | "fn" => Ok(EntityKind::Function),
            "module" | "modules" => Ok(EntityKind::Module),
            other => Err(format!("unknown entity kind: {other}")),
        }
    }
}

/// A non-fatal per-file extraction problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWarning {
    pub path: String,
    pub message: String,
}
