//! Rust extractor

use super::patterns::{self, Body, CallRules, DefKind, DefPattern, PatternSpec, Source, Syntax};
use crate::extractor::{ExtractionResult, LanguageExtractor};
use anyhow::Result;
use coderank_core::{ImportKind, ImportRef};
use once_cell::sync::Lazy;
use regex::Regex;

static FN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bfn\s+(?P<name>[A-Za-z_]\w*)").expect("Invalid Rust fn regex")
});

static TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:struct|enum|trait|union)\s+(?P<name>[A-Za-z_]\w*)")
        .expect("Invalid Rust type regex")
});

/// `impl Type`, `impl<T> Trait for path::Type<T>`; the implementing type is the scope.
static IMPL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:unsafe\s+)?impl\b(?:\s*<[^{]*?>)?\s+(?:[\w:<>, &'+]+?\s+for\s+)?&?(?:[A-Za-z_]\w*::)*(?P<name>[A-Za-z_]\w*)",
    )
    .expect("Invalid Rust impl regex")
});

static INLINE_MOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bmod\s+(?P<name>[A-Za-z_]\w*)\s*\{").expect("Invalid Rust mod regex")
});

static USE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:pub(?:\([^)]*\))?\s+)?use\s+(?P<target>[^;]+);")
        .expect("Invalid Rust use regex")
});

static MOD_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:pub(?:\([^)]*\))?\s+)?mod\s+(?P<name>[A-Za-z_]\w*)\s*;")
        .expect("Invalid Rust mod declaration regex")
});

static EXTERN_CRATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*extern\s+crate\s+(?P<name>[A-Za-z_]\w*)")
        .expect("Invalid Rust extern crate regex")
});

static DEFINITIONS: [DefPattern; 4] = [
    DefPattern { regex: &INLINE_MOD, kind: DefKind::Scope, body: Body::Braced },
    DefPattern { regex: &IMPL, kind: DefKind::Scope, body: Body::Braced },
    DefPattern { regex: &TYPE, kind: DefKind::Container, body: Body::Braced },
    DefPattern { regex: &FN, kind: DefKind::Callable, body: Body::Braced },
];

static RUST: PatternSpec = PatternSpec {
    syntax: Syntax {
        single_quote_strings: false,
        backtick_strings: false,
        triple_quote_strings: false,
        raw_strings: true,
        multiline_strings: true,
        brace_on_same_line: false,
    },
    definitions: &DEFINITIONS,
    keywords: &[
        "if", "while", "for", "match", "return", "loop", "fn", "move", "unsafe", "as", "in",
        "let", "where", "impl", "else", "mut", "ref", "dyn", "struct", "enum", "type", "use",
        "mod", "pub", "crate", "super", "self", "Self", "async", "await",
    ],
    calls: CallRules {
        self_receivers: &["self"],
        path_receivers: &["self", "Self", "crate", "super"],
        exported_members: false,
    },
    imports,
};

/// Split `a::b::{c, d as e}` into the path and the imported names.
fn split_use(tree: &str) -> (String, Vec<String>) {
    let compact = |s: &str| s.split_whitespace().collect::<String>();
    match tree.find("::{") {
        Some(idx) => {
            let names = tree[idx + 3..]
                .split(',')
                .filter_map(|n| n.split_whitespace().next())
                .map(|n| n.trim_matches(|c| c == '{' || c == '}').to_string())
                .filter(|n| !n.is_empty())
                .collect();
            (compact(&tree[..idx]), names)
        }
        None => {
            let path = tree.split(" as ").next().unwrap_or(tree);
            (compact(path), Vec::new())
        }
    }
}

fn imports(source: &Source<'_>) -> Vec<ImportRef> {
    let mut found = source.scan_imports(&USE, |caps, line| {
        let (path, names) = split_use(caps.name("target")?.as_str());
        Some(ImportRef::statement(path, line).with_names(names))
    });
    found.extend(source.scan_imports(&MOD_DECL, |caps, line| {
        let name = caps.name("name")?.as_str();
        Some(ImportRef::statement(name, line).with_kind(ImportKind::ModDeclaration))
    }));
    found.extend(source.scan_imports(&EXTERN_CRATE, |caps, line| {
        caps.name("name")
            .map(|n| ImportRef::statement(n.as_str(), line))
    }));
    found.sort_by_key(|i| i.line);
    found
}

pub struct RustExtractor;

impl LanguageExtractor for RustExtractor {
    fn extract(&self, path: &str, text: &str) -> Result<ExtractionResult> {
        patterns::extract(&RUST, path, text)
    }
}
