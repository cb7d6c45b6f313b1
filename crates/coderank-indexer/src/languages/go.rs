//! Go extractor

use super::patterns::{self, Body, CallRules, DefKind, DefPattern, PatternSpec, Source, Syntax};
use crate::extractor::{ExtractionResult, LanguageExtractor};
use anyhow::Result;
use coderank_core::ImportRef;
use once_cell::sync::Lazy;
use regex::Regex;

/// `func name(` and `func (r *T) name(`; the receiver type becomes the scope.
static FUNC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^func\s*(?:\((?P<recv>[^)]*)\)\s*)?(?P<name>[A-Za-z_]\w*)\s*(?:\[[^\]]*\])?\s*\(")
        .expect("Invalid Go func regex")
});

static TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^type\s+(?P<name>[A-Za-z_]\w*)(?:\[[^\]]*\])?\s+(?:struct|interface)\b")
        .expect("Invalid Go type regex")
});

static IMPORT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^[ \t]*import\s+(?:[\w.]+\s+)?"(?P<target>[^"\n]+)""#)
        .expect("Invalid Go import regex")
});

static IMPORT_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*import\s*\((?P<block>[^)]*)\)").expect("Invalid Go import block regex")
});

static BLOCK_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^[ \t]*(?:[\w.]+[ \t]+)?"(?P<target>[^"\n]+)""#)
        .expect("Invalid Go import entry regex")
});

static DEFINITIONS: [DefPattern; 2] = [
    DefPattern { regex: &TYPE, kind: DefKind::Container, body: Body::Braced },
    DefPattern { regex: &FUNC, kind: DefKind::Callable, body: Body::Braced },
];

static GO: PatternSpec = PatternSpec {
    syntax: Syntax {
        single_quote_strings: false,
        backtick_strings: true,
        triple_quote_strings: false,
        raw_strings: false,
        multiline_strings: false,
        brace_on_same_line: true,
    },
    definitions: &DEFINITIONS,
    keywords: &[
        "if", "for", "switch", "select", "return", "go", "defer", "func", "range", "map", "chan",
        "struct", "interface", "type", "var", "const", "package", "import", "else", "case",
        "default",
    ],
    calls: CallRules {
        self_receivers: &[],
        path_receivers: &[],
        exported_members: true,
    },
    imports,
};

fn imports(source: &Source<'_>) -> Vec<ImportRef> {
    let mut found = source.scan_imports(&IMPORT_LINE, |caps, line| {
        caps.name("target")
            .map(|t| ImportRef::statement(t.as_str(), line))
    });

    for caps in IMPORT_BLOCK.captures_iter(source.raw) {
        let (Some(whole), Some(block)) = (caps.get(0), caps.name("block")) else {
            continue;
        };
        let keyword = whole.start() + (whole.as_str().len() - whole.as_str().trim_start().len());
        if !source.is_code(keyword) {
            continue;
        }
        for entry in BLOCK_ENTRY.captures_iter(block.as_str()) {
            let (Some(m), Some(target)) = (entry.get(0), entry.name("target")) else {
                continue;
            };
            let lead = m.as_str().len() - m.as_str().trim_start().len();
            let start = block.start() + m.start() + lead;
            if source.is_code(start) {
                found.push(ImportRef::statement(target.as_str(), source.line_of(start)));
            }
        }
    }
    found.sort_by_key(|i| i.line);
    found
}

pub struct GoExtractor;

impl LanguageExtractor for GoExtractor {
    fn extract(&self, path: &str, text: &str) -> Result<ExtractionResult> {
        patterns::extract(&GO, path, text)
    }
}
