//! C and C++ extractor

use super::patterns::{self, Body, CallRules, DefKind, DefPattern, PatternSpec, Source, Syntax};
use crate::extractor::{ExtractionResult, LanguageExtractor};
use anyhow::Result;
use coderank_core::{ImportKind, ImportRef};
use once_cell::sync::Lazy;
use regex::Regex;

/// `ret name(params) {`, including `Class::method` and next-line braces.
static FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*[A-Za-z_][\w:<>,*&~ \t]*?[\s*&]+(?P<name>~?[A-Za-z_]\w*(?:::~?[A-Za-z_]\w*)*)\s*\([^;{}]*?\)\s*(?:const\s*)?(?:noexcept\s*)?(?:override\s*)?(?:final\s*)?\{",
    )
    .expect("Invalid C function regex")
});

static RECORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:struct|class|union)\s+(?:[A-Z_]+\s+)?(?P<name>[A-Za-z_]\w*)\s*(?:final\s*)?(?::[^{;]*)?\{",
    )
    .expect("Invalid C struct regex")
});

static NAMESPACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bnamespace\s+(?P<name>[A-Za-z_]\w*(?:::[A-Za-z_]\w*)*)\s*\{")
        .expect("Invalid C++ namespace regex")
});

static INCLUDE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^[ \t]*#[ \t]*include[ \t]*(?P<open>[<"])(?P<target>[^">\n]+)[">]"#)
        .expect("Invalid C include regex")
});

static DEFINITIONS: [DefPattern; 3] = [
    DefPattern { regex: &NAMESPACE, kind: DefKind::Scope, body: Body::Braced },
    DefPattern { regex: &RECORD, kind: DefKind::Container, body: Body::Braced },
    DefPattern { regex: &FUNCTION, kind: DefKind::Callable, body: Body::Braced },
];

static C_FAMILY: PatternSpec = PatternSpec {
    syntax: Syntax {
        single_quote_strings: false,
        backtick_strings: false,
        triple_quote_strings: false,
        raw_strings: false,
        multiline_strings: false,
        brace_on_same_line: false,
    },
    definitions: &DEFINITIONS,
    keywords: &[
        "if", "while", "for", "switch", "return", "sizeof", "catch", "else", "do", "case",
        "typeof", "alignof", "alignas", "decltype", "static_assert", "defined", "new", "delete",
        "throw", "noexcept",
    ],
    calls: CallRules {
        self_receivers: &["this"],
        path_receivers: &[],
        exported_members: false,
    },
    imports,
};

fn imports(source: &Source<'_>) -> Vec<ImportRef> {
    source.scan_imports(&INCLUDE, |caps, line| {
        let target = caps.name("target")?.as_str().trim();
        let angled = caps.name("open").is_some_and(|o| o.as_str() == "<");
        Some(ImportRef::statement(target, line).with_kind(ImportKind::Include { angled }))
    })
}

/// Shared by C and C++; the two are not told apart below the extension table.
pub struct CExtractor;

impl LanguageExtractor for CExtractor {
    fn extract(&self, path: &str, text: &str) -> Result<ExtractionResult> {
        patterns::extract(&C_FAMILY, path, text)
    }
}
