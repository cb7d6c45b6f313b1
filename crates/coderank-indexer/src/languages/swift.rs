//! Swift extractor

use super::patterns::{self, Body, CallRules, DefKind, DefPattern, PatternSpec, Source, Syntax};
use crate::extractor::{ExtractionResult, LanguageExtractor};
use anyhow::Result;
use coderank_core::ImportRef;
use once_cell::sync::Lazy;
use regex::Regex;

static FUNC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bfunc\s+(?P<name>[A-Za-z_]\w*)").expect("Invalid Swift func regex")
});

static TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:class|struct|enum|protocol|actor)\s+(?P<name>[A-Za-z_]\w*)")
        .expect("Invalid Swift type regex")
});

static EXTENSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bextension\s+(?P<name>[A-Za-z_]\w*)").expect("Invalid Swift extension regex")
});

static IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:@testable\s+)?import\s+(?:(?:class|struct|func|enum|protocol|typealias|var|let)\s+)?(?P<target>[A-Za-z_][\w.]*)",
    )
    .expect("Invalid Swift import regex")
});

static DEFINITIONS: [DefPattern; 3] = [
    DefPattern { regex: &EXTENSION, kind: DefKind::Scope, body: Body::Braced },
    DefPattern { regex: &TYPE, kind: DefKind::Container, body: Body::Braced },
    DefPattern { regex: &FUNC, kind: DefKind::Callable, body: Body::Braced },
];

static SWIFT: PatternSpec = PatternSpec {
    syntax: Syntax {
        single_quote_strings: false,
        backtick_strings: false,
        triple_quote_strings: true,
        raw_strings: false,
        multiline_strings: false,
        brace_on_same_line: true,
    },
    definitions: &DEFINITIONS,
    keywords: &[
        "if", "guard", "while", "for", "switch", "return", "func", "var", "let", "case", "catch",
        "repeat", "in", "where", "as", "is", "try", "throw", "throws", "rethrows", "await",
        "super", "self", "init", "deinit", "subscript", "defer", "do", "else",
    ],
    calls: CallRules {
        self_receivers: &["self"],
        path_receivers: &[],
        exported_members: false,
    },
    imports,
};

fn imports(source: &Source<'_>) -> Vec<ImportRef> {
    source.scan_imports(&IMPORT, |caps, line| {
        caps.name("target")
            .map(|t| ImportRef::statement(t.as_str(), line))
    })
}

pub struct SwiftExtractor;

impl LanguageExtractor for SwiftExtractor {
    fn extract(&self, path: &str, text: &str) -> Result<ExtractionResult> {
        patterns::extract(&SWIFT, path, text)
    }
}
