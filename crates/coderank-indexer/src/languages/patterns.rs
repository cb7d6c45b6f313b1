//! Shared machinery for the pattern-based extractors
//!
//! Definitions and calls are matched against a masked copy of the file in which
//! comment and string contents are blanked byte for byte, so offsets in the
//! masked copy are offsets in the original. A definition's span comes from
//! matching its body braces; when the body cannot be delimited the definition
//! is skipped rather than reported with a guessed span.

use crate::extractor::{ExtractionResult, QualifiedIds};
use anyhow::Result;
use coderank_core::{CallSite, ImportRef, Symbol, SymbolRole};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashSet;

static CALL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?P<name>[A-Za-z_$][\w$]*)\s*\(").expect("valid regex"));

/// Words that precede a definition name, never a call.
const DEFINITION_WORDS: &[&str] = &["fn", "func", "function", "def", "new"];

/// Words that rule out a definition match (`new Foo() {`, `return x(y) {`).
const NOT_DEFINITION_PRECEDERS: &[&str] = &["new", "return", "throw", "else"];

/// Lexical features that matter for masking.
#[derive(Debug, Clone, Copy, Default)]
pub struct Syntax {
    /// `'...'` is a string. Otherwise only `'x'` and `'\n'` style character
    /// literals are masked, so Rust lifetimes and labels survive.
    pub single_quote_strings: bool,
    /// `` `...` `` is a (possibly multi-line) string.
    pub backtick_strings: bool,
    /// `"""..."""` blocks.
    pub triple_quote_strings: bool,
    /// Rust `r"..."` / `r#"..."#`.
    pub raw_strings: bool,
    /// `"..."` may span lines.
    pub multiline_strings: bool,
    /// A body's `{` must appear on the line the signature ends on.
    pub brace_on_same_line: bool,
}

/// What a definition pattern produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefKind {
    Callable,
    Container,
    /// Contributes to the scope of nested definitions but is not reported
    /// (Rust `impl` blocks, Swift `extension`s, inline `mod`s).
    Scope,
}

/// How the extent of a definition is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Body {
    /// First `{` after the name, up to its matching `}`.
    Braced,
    /// `=> expr` or `=> { ... }` after the match.
    Arrow,
}

/// A definition regex. It must have a `name` group and may have a `recv`
/// group whose last type name becomes the scope (Go methods).
pub struct DefPattern {
    pub regex: &'static Lazy<Regex>,
    pub kind: DefKind,
    pub body: Body,
}

/// Which member-style calls count as calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallRules {
    /// `recv.name(` is kept when `recv` is one of these.
    pub self_receivers: &'static [&'static str],
    /// `recv::name(` is kept when `recv` is one of these.
    pub path_receivers: &'static [&'static str],
    /// Keep `pkg.Name(` when `Name` is capitalised.
    pub exported_members: bool,
}

/// Everything a pattern-based language needs.
pub struct PatternSpec {
    pub syntax: Syntax,
    pub definitions: &'static [DefPattern],
    pub keywords: &'static [&'static str],
    pub calls: CallRules,
    pub imports: fn(&Source<'_>) -> Vec<ImportRef>,
}

/// Byte offset to 1-based line number.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        LineIndex { starts }
    }

    pub fn line_of(&self, offset: usize) -> u32 {
        self.starts.partition_point(|&s| s <= offset) as u32
    }
}

/// A file's raw text with its masked copy.
pub struct Source<'a> {
    pub raw: &'a str,
    pub masked: String,
    lines: LineIndex,
}

impl<'a> Source<'a> {
    pub fn new(raw: &'a str, syntax: Syntax) -> Self {
        Source {
            raw,
            masked: mask(raw, syntax),
            lines: LineIndex::new(raw),
        }
    }

    pub fn line_of(&self, offset: usize) -> u32 {
        self.lines.line_of(offset)
    }

    /// True when the byte at `offset` is code rather than comment or string.
    pub fn is_code(&self, offset: usize) -> bool {
        let raw = self.raw.as_bytes();
        offset < raw.len()
            && raw[offset] == self.masked.as_bytes()[offset]
            && !raw[offset].is_ascii_whitespace()
    }

    /// Run an import regex over the raw text, keeping matches that start in
    /// code. `build` gets the captures and the line of the statement.
    pub fn scan_imports(
        &self,
        re: &Regex,
        mut build: impl FnMut(&Captures<'_>, u32) -> Option<ImportRef>,
    ) -> Vec<ImportRef> {
        let mut imports = Vec::new();
        for caps in re.captures_iter(self.raw) {
            let Some(m) = caps.get(0) else { continue };
            let lead = m.as_str().len() - m.as_str().trim_start().len();
            let start = m.start() + lead;
            if !self.is_code(start) {
                continue;
            }
            if let Some(import) = build(&caps, self.line_of(start)) {
                imports.push(import);
            }
        }
        imports
    }
}

fn is_ident(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

fn blank(out: &mut [u8], from: usize, to: usize) {
    let to = to.min(out.len());
    for b in out.iter_mut().take(to).skip(from) {
        if *b != b'\n' {
            *b = b' ';
        }
    }
}

fn find(src: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= src.len() {
        return None;
    }
    src[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| from + p)
}

/// Index of the closing `quote` of a string starting at `from`, honouring
/// backslash escapes. Single-line strings stop at a newline.
fn string_close(src: &[u8], from: usize, quote: u8, multiline: bool) -> usize {
    let mut i = from;
    while i < src.len() {
        match src[i] {
            b'\\' => i += 2,
            b'\n' if !multiline => return i,
            c if c == quote => return i,
            _ => i += 1,
        }
    }
    src.len()
}

/// Length in bytes of the UTF-8 character starting with `lead`.
fn char_len(lead: u8) -> usize {
    match lead {
        0xF0..=0xFF => 4,
        0xE0..=0xEF => 3,
        0xC0..=0xDF => 2,
        _ => 1,
    }
}

/// Blank comments and string contents. Delimiters and newlines are kept.
pub fn mask(raw: &str, syntax: Syntax) -> String {
    let src = raw.as_bytes();
    let mut out = src.to_vec();
    let mut i = 0;
    while i < src.len() {
        let c = src[i];
        let next = src.get(i + 1).copied();
        match c {
            b'/' if next == Some(b'/') => {
                let end = find(src, i, b"\n").unwrap_or(src.len());
                blank(&mut out, i, end);
                i = end;
            }
            b'/' if next == Some(b'*') => {
                let end = find(src, i + 2, b"*/").map_or(src.len(), |e| e + 2);
                blank(&mut out, i, end);
                i = end;
            }
            b'"' if syntax.triple_quote_strings && src[i..].starts_with(b"\"\"\"") => {
                let close = find(src, i + 3, b"\"\"\"").unwrap_or(src.len());
                blank(&mut out, i + 3, close);
                i = close + 3;
            }
            b'"' => {
                let close = string_close(src, i + 1, b'"', syntax.multiline_strings);
                blank(&mut out, i + 1, close);
                i = close + 1;
            }
            b'`' if syntax.backtick_strings => {
                let close = string_close(src, i + 1, b'`', true);
                blank(&mut out, i + 1, close);
                i = close + 1;
            }
            b'\'' if syntax.single_quote_strings => {
                let close = string_close(src, i + 1, b'\'', false);
                blank(&mut out, i + 1, close);
                i = close + 1;
            }
            b'\'' => {
                // Character literal, or a lifetime / label that is left alone.
                let close = match next {
                    Some(b'\\') => find(src, i + 3, b"'").filter(|&e| e - i <= 12),
                    Some(lead) => {
                        let e = i + 1 + char_len(lead);
                        (src.get(e) == Some(&b'\'')).then_some(e)
                    }
                    None => None,
                };
                match close {
                    Some(close) => {
                        blank(&mut out, i + 1, close);
                        i = close + 1;
                    }
                    None => i += 1,
                }
            }
            b'r' if syntax.raw_strings
                && (i == 0 || !is_ident(src[i - 1]) || (src[i - 1] == b'b' && (i < 2 || !is_ident(src[i - 2])))) =>
            {
                let hashes = src[i + 1..].iter().take_while(|&&b| b == b'#').count();
                if src.get(i + 1 + hashes) == Some(&b'"') {
                    let mut terminator = vec![b'"'];
                    terminator.extend(std::iter::repeat_n(b'#', hashes));
                    let open = i + 2 + hashes;
                    let close = find(src, open, &terminator).unwrap_or(src.len());
                    blank(&mut out, open, close);
                    i = close + terminator.len();
                } else {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    match String::from_utf8(out) {
        Ok(masked) => masked,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

enum BodyScan {
    /// Offsets of the body start and its last byte.
    Body(usize, usize),
    /// No body follows: a prototype, an abstract method, a forward declaration.
    Declaration,
    /// A body opens but never closes.
    Unbalanced,
}

fn matching_brace(src: &[u8], open: usize) -> BodyScan {
    let mut depth = 0usize;
    for (i, &b) in src.iter().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return BodyScan::Body(open, i);
                }
            }
            _ => {}
        }
    }
    BodyScan::Unbalanced
}

fn braced_body(src: &[u8], from: usize, same_line: bool) -> BodyScan {
    let mut depth = 0i32;
    for (i, &b) in src.iter().enumerate().skip(from) {
        match b {
            b'(' | b'[' => depth += 1,
            b')' | b']' => depth -= 1,
            b'{' if depth <= 0 => return matching_brace(src, i),
            b';' | b'}' if depth <= 0 => return BodyScan::Declaration,
            b'\n' if same_line && depth <= 0 => return BodyScan::Declaration,
            _ => {}
        }
    }
    BodyScan::Declaration
}

fn arrow_body(src: &[u8], from: usize) -> BodyScan {
    let start = from
        + src[from.min(src.len())..]
            .iter()
            .take_while(|b| b.is_ascii_whitespace())
            .count();
    if src.get(start) == Some(&b'{') {
        return matching_brace(src, start);
    }
    let mut depth = 0i32;
    let mut last = start;
    for (i, &b) in src.iter().enumerate().skip(start) {
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => {
                depth -= 1;
                if depth < 0 {
                    break;
                }
            }
            b';' | b'\n' if depth == 0 => break,
            _ => {}
        }
        if !b.is_ascii_whitespace() {
            last = i;
        }
    }
    if start >= src.len() {
        return BodyScan::Declaration;
    }
    BodyScan::Body(start, last)
}

struct Definition {
    name: String,
    /// Scope segments carried by the name itself (`Foo::bar`) or a receiver.
    own_scope: Vec<String>,
    kind: DefKind,
    /// First non-blank byte of the match; a signature may begin lines
    /// above its name (`static int\nfoo(void)`).
    start: usize,
    name_start: usize,
    body_start: usize,
    end: usize,
}

fn receiver_type(recv: &str) -> Option<String> {
    let last = recv.split_whitespace().last()?;
    let ty = last.trim_start_matches(['*', '&']);
    let ty = ty.split('[').next().unwrap_or(ty);
    (!ty.is_empty()).then(|| ty.to_string())
}

fn collect_definitions(
    spec: &PatternSpec,
    source: &Source<'_>,
    skipped: &mut Vec<String>,
) -> Vec<Definition> {
    let src = source.masked.as_bytes();
    let mut seen = HashSet::new();
    let mut defs = Vec::new();

    for pattern in spec.definitions {
        for caps in pattern.regex.captures_iter(&source.masked) {
            let (Some(whole), Some(name_m)) = (caps.get(0), caps.name("name")) else {
                continue;
            };
            let mut segments: Vec<String> = name_m
                .as_str()
                .split("::")
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            let Some(name) = segments.pop() else { continue };
            if spec.keywords.contains(&name.as_str()) || !seen.insert(name_m.start()) {
                continue;
            }
            if word_before(&source.masked, name_m.start())
                .is_some_and(|w| NOT_DEFINITION_PRECEDERS.contains(&w))
            {
                continue;
            }
            if let Some(ty) = caps.name("recv").and_then(|r| receiver_type(r.as_str())) {
                segments.push(ty);
            }

            let scan = match pattern.body {
                Body::Braced => braced_body(src, name_m.end(), spec.syntax.brace_on_same_line),
                Body::Arrow => arrow_body(src, whole.end()),
            };
            match scan {
                BodyScan::Body(body_start, end) => defs.push(Definition {
                    name,
                    own_scope: segments,
                    kind: pattern.kind,
                    start: whole.start() + (whole.len() - whole.as_str().trim_start().len()),
                    name_start: name_m.start(),
                    body_start,
                    end,
                }),
                BodyScan::Declaration => {}
                BodyScan::Unbalanced => skipped.push(format!(
                    "unbalanced braces in `{name}` at line {}",
                    source.line_of(name_m.start())
                )),
            }
        }
    }

    defs.sort_by_key(|d| (d.name_start, std::cmp::Reverse(d.end)));
    defs
}

/// Where the identifier at `pos` is called from.
enum Receiver<'s> {
    Bare(Option<&'s str>),
    Member(&'s str),
    Path(&'s str),
}

fn word_before(src: &str, end: usize) -> Option<&str> {
    let bytes = src.as_bytes();
    let mut e = end;
    while e > 0 && bytes[e - 1].is_ascii_whitespace() {
        e -= 1;
    }
    let mut s = e;
    while s > 0 && is_ident(bytes[s - 1]) {
        s -= 1;
    }
    (s < e).then(|| &src[s..e])
}

fn receiver_of(src: &str, pos: usize) -> Receiver<'_> {
    let bytes = src.as_bytes();
    let mut i = pos;
    while i > 0 && bytes[i - 1].is_ascii_whitespace() {
        i -= 1;
    }
    let before = &bytes[..i];
    if before.ends_with(b"?.") {
        Receiver::Member(word_before(src, i - 2).unwrap_or(""))
    } else if before.ends_with(b".") {
        Receiver::Member(word_before(src, i - 1).unwrap_or(""))
    } else if before.ends_with(b"->") {
        Receiver::Member(word_before(src, i - 2).unwrap_or(""))
    } else if before.ends_with(b"::") {
        Receiver::Path(word_before(src, i - 2).unwrap_or(""))
    } else {
        Receiver::Bare(word_before(src, i))
    }
}

fn is_call(rules: &CallRules, src: &str, pos: usize, callee: &str) -> bool {
    match receiver_of(src, pos) {
        Receiver::Bare(prev) => !prev.is_some_and(|w| DEFINITION_WORDS.contains(&w)),
        Receiver::Member(recv) => {
            rules.self_receivers.contains(&recv)
                || (rules.exported_members && callee.starts_with(|c: char| c.is_ascii_uppercase()))
        }
        Receiver::Path(recv) => rules.path_receivers.contains(&recv),
    }
}

/// Extract a file with a pattern spec.
pub fn extract(spec: &PatternSpec, path: &str, text: &str) -> Result<ExtractionResult> {
    let source = Source::new(text, spec.syntax);
    let mut result = ExtractionResult::default();
    let defs = collect_definitions(spec, &source, &mut result.skipped);

    let mut ids = QualifiedIds::default();
    let mut def_ids: Vec<Option<String>> = Vec::with_capacity(defs.len());
    for (i, def) in defs.iter().enumerate() {
        let mut scope: Vec<&str> = Vec::new();
        for outer in &defs[..i] {
            if outer.name_start < def.name_start && def.end <= outer.end {
                scope.extend(outer.own_scope.iter().map(String::as_str));
                scope.push(&outer.name);
            }
        }
        scope.extend(def.own_scope.iter().map(String::as_str));
        let scope = (!scope.is_empty()).then(|| scope.join("."));

        let role = match def.kind {
            DefKind::Callable => SymbolRole::Callable,
            DefKind::Container => SymbolRole::Container,
            DefKind::Scope => {
                def_ids.push(None);
                continue;
            }
        };
        let mut symbol = Symbol::new(
            path,
            scope.as_deref(),
            &def.name,
            source.line_of(def.start),
            source.line_of(def.end),
            role,
        );
        ids.claim(&mut symbol);
        def_ids.push(Some(symbol.qualified_id.clone()));
        match role {
            SymbolRole::Callable => result.symbols.functions.push(symbol),
            SymbolRole::Container => result.symbols.classes.push(symbol),
        }
    }

    let name_starts: HashSet<usize> = defs.iter().map(|d| d.name_start).collect();
    let bodies: Vec<(usize, usize, &str)> = defs
        .iter()
        .zip(&def_ids)
        .filter(|(d, _)| d.kind == DefKind::Callable)
        .filter_map(|(d, id)| id.as_deref().map(|id| (d.body_start, d.end, id)))
        .collect();

    let bytes = source.masked.as_bytes();
    for caps in CALL_RE.captures_iter(&source.masked) {
        let Some(m) = caps.name("name") else { continue };
        let (pos, callee) = (m.start(), m.as_str());
        if pos > 0 && is_ident(bytes[pos - 1]) {
            continue;
        }
        if spec.keywords.contains(&callee) || name_starts.contains(&pos) {
            continue;
        }
        if !is_call(&spec.calls, &source.masked, pos, callee) {
            continue;
        }
        let caller = bodies
            .iter()
            .filter(|(start, end, _)| *start <= pos && pos <= *end)
            .max_by_key(|(start, _, _)| *start);
        if let Some((_, _, caller)) = caller {
            result.symbols.calls.push(CallSite {
                caller: caller.to_string(),
                callee: callee.to_string(),
                line: source.line_of(pos),
            });
        }
    }

    result.symbols.imports = (spec.imports)(&source);
    Ok(result)
}
