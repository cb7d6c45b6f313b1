//! Java extractor

use super::patterns::{self, Body, CallRules, DefKind, DefPattern, PatternSpec, Source, Syntax};
use crate::extractor::{ExtractionResult, LanguageExtractor};
use anyhow::Result;
use coderank_core::ImportRef;
use once_cell::sync::Lazy;
use regex::Regex;

static TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:class|interface|enum|record)\s+(?P<name>[A-Za-z_$][\w$]*)")
        .expect("Invalid Java type regex")
});

static METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:(?:public|private|protected|static|final|abstract|synchronized|native|default|strictfp)\s+)*(?:<[^>]+>\s+)?(?:[\w.$]+(?:<[^;{}()]*?>)?(?:\[\])*\s+)?(?P<name>[A-Za-z_$][\w$]*)\s*\([^)]*\)\s*(?:throws\s+[\w.$,\s]+)?\{",
    )
    .expect("Invalid Java method regex")
});

static IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*import\s+(?:static\s+)?(?P<target>[\w.$]+(?:\.\*)?)\s*;")
        .expect("Invalid Java import regex")
});

static DEFINITIONS: [DefPattern; 2] = [
    DefPattern { regex: &TYPE, kind: DefKind::Container, body: Body::Braced },
    DefPattern { regex: &METHOD, kind: DefKind::Callable, body: Body::Braced },
];

static JAVA: PatternSpec = PatternSpec {
    syntax: Syntax {
        single_quote_strings: false,
        backtick_strings: false,
        triple_quote_strings: true,
        raw_strings: false,
        multiline_strings: false,
        brace_on_same_line: false,
    },
    definitions: &DEFINITIONS,
    keywords: &[
        "if", "for", "while", "switch", "catch", "return", "new", "throw", "synchronized", "super",
        "this", "assert", "else", "try", "do", "case", "default",
    ],
    calls: CallRules {
        self_receivers: &["this"],
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

pub struct JavaExtractor;

impl LanguageExtractor for JavaExtractor {
    fn extract(&self, path: &str, text: &str) -> Result<ExtractionResult> {
        patterns::extract(&JAVA, path, text)
    }
}
