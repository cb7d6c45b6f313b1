//! JavaScript and TypeScript extractors

use super::patterns::{self, Body, CallRules, DefKind, DefPattern, PatternSpec, Source, Syntax};
use crate::extractor::{ExtractionResult, LanguageExtractor};
use anyhow::Result;
use coderank_core::ImportRef;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bfunction\b\s*\*?\s*(?P<name>[A-Za-z_$][\w$]*)")
        .expect("Invalid JavaScript function regex")
});

static FUNCTION_EXPR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:const|let|var)\s+(?P<name>[A-Za-z_$][\w$]*)\s*=\s*(?:async\s+)?function\b")
        .expect("Invalid JavaScript function expression regex")
});

static ARROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:const|let|var)\s+(?P<name>[A-Za-z_$][\w$]*)\s*(?::[^=\n]+)?=\s*(?:async\s+)?(?:\([^()]*\)|[A-Za-z_$][\w$]*)\s*(?::\s*[^=\n]+?)?\s*=>",
    )
    .expect("Invalid JavaScript arrow function regex")
});

static METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:(?:public|private|protected|static|async|readonly|override|abstract|get|set)[ \t]+)*(?P<name>[A-Za-z_$][\w$]*)[ \t]*(?:<[^>\n]*>)?[ \t]*\([^)]*\)[ \t]*(?::[^{;\n]+)?\{",
    )
    .expect("Invalid JavaScript method regex")
});

static CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bclass\s+(?P<name>[A-Za-z_$][\w$]*)").expect("Invalid JavaScript class regex")
});

static INTERFACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\binterface\s+(?P<name>[A-Za-z_$][\w$]*)")
        .expect("Invalid TypeScript interface regex")
});

static IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?m)^[ \t]*import\s+(?:type\s+)?(?:[\w$*{}\s,]+?\s+from\s+)?['"](?P<target>[^'"\n]+)['"]"#,
    )
    .expect("Invalid JavaScript import regex")
});

static EXPORT_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?m)^[ \t]*export\s+(?:type\s+)?(?:\*(?:\s+as\s+[\w$]+)?|\{[^}]*\})\s*from\s+['"](?P<target>[^'"\n]+)['"]"#,
    )
    .expect("Invalid JavaScript re-export regex")
});

static REQUIRE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\brequire\s*\(\s*['"](?P<target>[^'"\n]+)['"]\s*\)"#)
        .expect("Invalid JavaScript require regex")
});

const KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "function", "typeof", "instanceof", "new",
    "await", "yield", "super", "import", "export", "class", "do", "else", "try", "case", "throw",
    "delete", "void", "with", "in", "of",
];

const SYNTAX: Syntax = Syntax {
    single_quote_strings: true,
    backtick_strings: true,
    triple_quote_strings: false,
    raw_strings: false,
    multiline_strings: false,
    brace_on_same_line: false,
};

const CALLS: CallRules = CallRules {
    self_receivers: &["this"],
    path_receivers: &[],
    exported_members: false,
};

static JS_DEFINITIONS: [DefPattern; 5] = [
    DefPattern { regex: &FUNCTION, kind: DefKind::Callable, body: Body::Braced },
    DefPattern { regex: &FUNCTION_EXPR, kind: DefKind::Callable, body: Body::Braced },
    DefPattern { regex: &ARROW, kind: DefKind::Callable, body: Body::Arrow },
    DefPattern { regex: &CLASS, kind: DefKind::Container, body: Body::Braced },
    DefPattern { regex: &METHOD, kind: DefKind::Callable, body: Body::Braced },
];

static TS_DEFINITIONS: [DefPattern; 6] = [
    DefPattern { regex: &FUNCTION, kind: DefKind::Callable, body: Body::Braced },
    DefPattern { regex: &FUNCTION_EXPR, kind: DefKind::Callable, body: Body::Braced },
    DefPattern { regex: &ARROW, kind: DefKind::Callable, body: Body::Arrow },
    DefPattern { regex: &CLASS, kind: DefKind::Container, body: Body::Braced },
    DefPattern { regex: &INTERFACE, kind: DefKind::Container, body: Body::Braced },
    DefPattern { regex: &METHOD, kind: DefKind::Callable, body: Body::Braced },
];

static JAVASCRIPT: PatternSpec = PatternSpec {
    syntax: SYNTAX,
    definitions: &JS_DEFINITIONS,
    keywords: KEYWORDS,
    calls: CALLS,
    imports,
};

static TYPESCRIPT: PatternSpec = PatternSpec {
    syntax: SYNTAX,
    definitions: &TS_DEFINITIONS,
    keywords: KEYWORDS,
    calls: CALLS,
    imports,
};

fn target(caps: &Captures<'_>, line: u32) -> Option<ImportRef> {
    caps.name("target")
        .map(|t| ImportRef::statement(t.as_str().trim(), line))
}

fn imports(source: &Source<'_>) -> Vec<ImportRef> {
    let mut found = source.scan_imports(&IMPORT, target);
    found.extend(source.scan_imports(&EXPORT_FROM, target));
    found.extend(source.scan_imports(&REQUIRE, target));
    found.sort_by_key(|i| i.line);
    found
}

pub struct JavaScriptExtractor;

impl LanguageExtractor for JavaScriptExtractor {
    fn extract(&self, path: &str, text: &str) -> Result<ExtractionResult> {
        patterns::extract(&JAVASCRIPT, path, text)
    }
}

pub struct TypeScriptExtractor;

impl LanguageExtractor for TypeScriptExtractor {
    fn extract(&self, path: &str, text: &str) -> Result<ExtractionResult> {
        patterns::extract(&TYPESCRIPT, path, text)
    }
}
