//! Import resolution: raw import strings to repository files or external modules
//!
//! Each language gets its own lookup convention. Anything that does not land
//! on a repository file degrades to an external module name; relative imports
//! that point nowhere are reported as dangling and dropped by the builder.

use coderank_core::aggregation::SOURCE_ROOTS;
use coderank_core::{ImportKind, ImportRef, Language, parent_dir};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

const SCRIPT_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];

/// Outcome of resolving one import statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportResolution {
    /// Repository files the import refers to. A `package` import (a Go
    /// package, a Java wildcard, a Swift module) spreads one unit of edge
    /// weight over its files; otherwise every file gets a full edge.
    Local { files: Vec<String>, package: bool },
    /// Not found in the repository: the top-level library name.
    External(String),
    /// A relative reference with no file behind it.
    Dangling,
}

impl ImportResolution {
    fn files(files: Vec<String>) -> Self {
        ImportResolution::Local {
            files,
            package: false,
        }
    }

    fn package(files: Vec<String>) -> Self {
        ImportResolution::Local {
            files,
            package: true,
        }
    }

    fn or_else(files: Vec<String>, fallback: impl FnOnce() -> Self) -> Self {
        if files.is_empty() {
            fallback()
        } else {
            Self::files(files)
        }
    }
}

/// Lookup structure over the repository's file paths.
#[derive(Debug, Default, Clone)]
pub struct FileIndex {
    paths: BTreeSet<String>,
    /// last path segment -> paths, sorted
    by_name: HashMap<String, Vec<String>>,
    /// parent directory -> paths, sorted
    by_dir: HashMap<String, Vec<String>>,
}

impl FileIndex {
    pub fn new<'a>(paths: impl IntoIterator<Item = &'a str>) -> Self {
        let mut index = FileIndex::default();
        for path in paths {
            index.paths.insert(path.to_string());
        }
        for path in &index.paths {
            let name = path.rsplit('/').next().unwrap_or(path);
            index
                .by_name
                .entry(name.to_string())
                .or_default()
                .push(path.clone());
            index
                .by_dir
                .entry(parent_dir(path).to_string())
                .or_default()
                .push(path.clone());
        }
        index
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Paths equal to `suffix` or ending in `/suffix`.
    pub fn ending_with(&self, suffix: &str) -> Vec<&str> {
        let name = suffix.rsplit('/').next().unwrap_or(suffix);
        self.by_name
            .get(name)
            .into_iter()
            .flatten()
            .filter(|p| ends_with_segments(p, suffix))
            .map(String::as_str)
            .collect()
    }

    /// Files directly inside `dir`.
    pub fn in_dir(&self, dir: &str) -> &[String] {
        self.by_dir.get(dir).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Files anywhere below `dir`.
    pub fn under_dir(&self, dir: &str) -> Vec<&str> {
        let prefix = format!("{dir}/");
        self.paths
            .range(prefix.clone()..)
            .take_while(|p| p.starts_with(&prefix))
            .map(String::as_str)
            .collect()
    }

    /// Non-root directories equal to `suffix` or ending in `/suffix`,
    /// longest first.
    pub fn dirs_ending_with(&self, suffix: &str) -> Vec<&str> {
        let mut dirs: Vec<&str> = self
            .by_dir
            .keys()
            .filter(|d| !d.is_empty() && ends_with_segments(d, suffix))
            .map(String::as_str)
            .collect();
        dirs.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        dirs
    }

    /// Find `candidate` next to `from`, then at the repository root, then as
    /// the shortest path ending in it.
    fn locate(&self, from: &str, candidate: &str) -> Option<String> {
        if let Some(local) = join(parent_dir(from), candidate)
            && self.contains(&local)
        {
            return Some(local);
        }
        self.locate_rooted(candidate)
    }

    /// Find a Python module next to `from`, at the repository root or under
    /// a source root. Never matches an arbitrary suffix.
    fn locate_python(&self, from: &str, candidate: &str) -> Option<String> {
        if let Some(local) = join(parent_dir(from), candidate)
            && self.contains(&local)
        {
            return Some(local);
        }
        if self.contains(candidate) {
            return Some(candidate.to_string());
        }
        SOURCE_ROOTS
            .iter()
            .map(|root| under(root, candidate))
            .find(|path| self.contains(path))
    }

    fn locate_rooted(&self, candidate: &str) -> Option<String> {
        if self.contains(candidate) {
            return Some(candidate.to_string());
        }
        self.ending_with(candidate)
            .into_iter()
            .min_by_key(|p| (p.matches('/').count(), *p))
            .map(str::to_string)
    }

    fn first_existing(&self, candidates: impl IntoIterator<Item = String>) -> Option<String> {
        candidates.into_iter().find(|c| self.contains(c))
    }
}

fn ends_with_segments(path: &str, suffix: &str) -> bool {
    path == suffix
        || (path.len() > suffix.len()
            && path.ends_with(suffix)
            && path.as_bytes()[path.len() - suffix.len() - 1] == b'/')
}

/// Join a relative reference onto a directory, folding `.` and `..`.
/// Returns `None` when the reference climbs above the repository root.
pub fn join(dir: &str, relative: &str) -> Option<String> {
    let mut parts: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();
    for seg in relative.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

fn under(dir: &str, rest: &str) -> String {
    match (dir.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (_, true) => dir.to_string(),
        _ => format!("{dir}/{rest}"),
    }
}

fn push_unique(found: &mut Vec<String>, path: Option<String>) {
    if let Some(path) = path
        && !found.contains(&path)
    {
        found.push(path);
    }
}

/// Resolves import statements against a [`FileIndex`].
pub struct ImportResolver<'a> {
    index: &'a FileIndex,
}

impl<'a> ImportResolver<'a> {
    pub fn new(index: &'a FileIndex) -> Self {
        ImportResolver { index }
    }

    pub fn resolve(&self, from: &str, language: Language, import: &ImportRef) -> ImportResolution {
        let target = import.target.trim();
        if target.is_empty() {
            return ImportResolution::Dangling;
        }
        match language {
            Language::Python => self.python(from, target, &import.names),
            Language::JavaScript | Language::TypeScript => self.script(from, target),
            Language::C | Language::Cpp => self.include(from, target),
            Language::Java => self.java(target),
            Language::Go => self.go(target),
            Language::Rust => match import.kind {
                ImportKind::ModDeclaration => self.rust_mod(from, target),
                _ => self.rust_use(from, target, &import.names),
            },
            Language::Swift => self.swift(target),
            _ => ImportResolution::External(first_segment(target, &['.', '/']).to_string()),
        }
    }

    /// `import a.b`, `from .a import b`, `from .. import c`
    fn python(&self, from: &str, target: &str, names: &[String]) -> ImportResolution {
        let dots = target.chars().take_while(|c| *c == '.').count();
        let module = target[dots..].replace('.', "/");
        let mut found = Vec::new();

        if dots > 0 {
            let mut dir = parent_dir(from);
            for _ in 1..dots {
                if dir.is_empty() {
                    debug!(path = from, target, "relative import climbs above the repository root");
                    return ImportResolution::Dangling;
                }
                dir = parent_dir(dir);
            }
            let stem = under(dir, &module);
            if !module.is_empty() {
                push_unique(
                    &mut found,
                    self.index
                        .first_existing([format!("{stem}.py"), format!("{stem}/__init__.py")]),
                );
            }
            for name in names {
                let sub = under(&stem, name);
                push_unique(
                    &mut found,
                    self.index
                        .first_existing([format!("{sub}.py"), format!("{sub}/__init__.py")]),
                );
            }
            return if found.is_empty() {
                ImportResolution::Dangling
            } else {
                ImportResolution::files(found)
            };
        }

        let lookup = |path: &str| {
            self.index
                .locate_python(from, &format!("{path}.py"))
                .or_else(|| self.index.locate_python(from, &format!("{path}/__init__.py")))
        };
        push_unique(&mut found, lookup(&module));
        for name in names {
            push_unique(&mut found, lookup(&under(&module, name)));
        }
        ImportResolution::or_else(found, || {
            ImportResolution::External(first_segment(target, &['.']).to_string())
        })
    }

    /// `import x from './a'`, `require('../b')`, `import 'react'`
    fn script(&self, from: &str, target: &str) -> ImportResolution {
        let relative = target.starts_with("./") || target.starts_with("../") || target == "." || target == "..";
        if !relative && !target.starts_with('/') {
            return ImportResolution::External(package_name(target));
        }
        let base = if relative { parent_dir(from) } else { "" };
        let Some(path) = join(base, target) else {
            return ImportResolution::Dangling;
        };
        let mut candidates = vec![path.clone()];
        candidates.extend(SCRIPT_EXTENSIONS.iter().map(|ext| format!("{path}.{ext}")));
        candidates.extend(
            SCRIPT_EXTENSIONS
                .iter()
                .map(|ext| under(&path, &format!("index.{ext}"))),
        );
        match self.index.first_existing(candidates) {
            Some(file) => ImportResolution::files(vec![file]),
            None => ImportResolution::Dangling,
        }
    }

    /// `#include "util.h"`, `#include <lib/x.h>`
    fn include(&self, from: &str, target: &str) -> ImportResolution {
        match self.index.locate(from, target) {
            Some(file) => ImportResolution::files(vec![file]),
            None => {
                let root = first_segment(target, &['/']);
                let name = root.split('.').next().unwrap_or(root);
                ImportResolution::External(name.to_string())
            }
        }
    }

    /// `import a.b.C`, `import a.b.*`, `import static a.b.C.m`
    fn java(&self, target: &str) -> ImportResolution {
        let (path, wildcard) = match target.strip_suffix(".*") {
            Some(stripped) => (stripped, true),
            None => (target, false),
        };
        let segments: Vec<&str> = path.split('.').collect();

        for len in (1..=segments.len()).rev() {
            if len < segments.len() && len < 2 {
                break;
            }
            let class = format!("{}.java", segments[..len].join("/"));
            if let Some(file) = self.index.locate_rooted(&class) {
                return ImportResolution::files(vec![file]);
            }
        }

        if wildcard {
            let dir = segments.join("/");
            if let Some(pkg) = self.index.dirs_ending_with(&dir).first() {
                let files: Vec<String> = self
                    .index
                    .in_dir(pkg)
                    .iter()
                    .filter(|p| p.ends_with(".java"))
                    .cloned()
                    .collect();
                if !files.is_empty() {
                    return ImportResolution::package(files);
                }
            }
        }

        let name = segments.iter().take(2).copied().collect::<Vec<_>>().join(".");
        ImportResolution::External(name)
    }

    /// `import "github.com/acme/proj/internal/db"`: the longest repository
    /// directory that the import path ends with.
    fn go(&self, target: &str) -> ImportResolution {
        let segments: Vec<&str> = target.split('/').collect();
        for start in 0..segments.len() {
            let dir = segments[start..].join("/");
            let files: Vec<String> = self
                .index
                .in_dir(&dir)
                .iter()
                .filter(|p| p.ends_with(".go"))
                .cloned()
                .collect();
            if !files.is_empty() {
                return ImportResolution::package(files);
            }
        }
        let name = if segments[0].contains('.') {
            segments.iter().take(3).copied().collect::<Vec<_>>().join("/")
        } else {
            segments[0].to_string()
        };
        ImportResolution::External(name)
    }

    /// `mod name;`
    fn rust_mod(&self, from: &str, name: &str) -> ImportResolution {
        let dir = rust_module_dir(from);
        let stem = under(&dir, name);
        match self
            .index
            .first_existing([format!("{stem}.rs"), format!("{stem}/mod.rs")])
        {
            Some(file) => ImportResolution::files(vec![file]),
            None => ImportResolution::Dangling,
        }
    }

    /// `use crate::a::b`, `use super::c::{d, e}`, `use other_crate::x`
    fn rust_use(&self, from: &str, target: &str, names: &[String]) -> ImportResolution {
        let segments: Vec<&str> = target.split("::").filter(|s| !s.is_empty()).collect();
        let Some(&first) = segments.first() else {
            return ImportResolution::Dangling;
        };

        let mut rest = &segments[1..];
        let base = match first {
            "crate" => rust_crate_root(from),
            "self" => rust_module_dir(from),
            "super" => {
                let mut dir = parent_dir(&rust_module_dir(from)).to_string();
                while rest.first() == Some(&"super") {
                    dir = parent_dir(&dir).to_string();
                    rest = &rest[1..];
                }
                dir
            }
            other => match self.workspace_crate(other) {
                Some(root) => root,
                None => return ImportResolution::External(other.to_string()),
            },
        };

        let module_file = |segs: &[&str]| {
            let stem = under(&base, &segs.join("/"));
            self.index
                .first_existing([format!("{stem}.rs"), format!("{stem}/mod.rs")])
        };

        let mut found = Vec::new();
        for name in names.iter().filter(|n| n.as_str() != "*" && n.as_str() != "self") {
            let mut segs = rest.to_vec();
            segs.push(name);
            push_unique(&mut found, module_file(&segs));
        }
        if found.is_empty() {
            for len in (1..=rest.len()).rev() {
                if let Some(file) = module_file(&rest[..len]) {
                    found.push(file);
                    break;
                }
            }
        }
        if found.is_empty() {
            // Items re-exported from or defined in the base module itself.
            push_unique(
                &mut found,
                self.index.first_existing([
                    format!("{base}.rs"),
                    format!("{base}/mod.rs"),
                    format!("{base}/lib.rs"),
                    format!("{base}/main.rs"),
                ]),
            );
        }

        if found.is_empty() {
            match first {
                "crate" | "self" | "super" => ImportResolution::Dangling,
                other => ImportResolution::External(other.to_string()),
            }
        } else {
            ImportResolution::files(found)
        }
    }

    /// Source root of a crate in the same repository, looked up by its
    /// `snake_case` or `kebab-case` name.
    fn workspace_crate(&self, name: &str) -> Option<String> {
        let kebab = name.replace('_', "-");
        [name, kebab.as_str()].iter().find_map(|n| {
            self.index
                .ending_with(&format!("{n}/src/lib.rs"))
                .first()
                .map(|lib| parent_dir(lib).to_string())
        })
    }

    /// `import Core`: a SwiftPM target directory of that name.
    fn swift(&self, target: &str) -> ImportResolution {
        for dir in self.index.dirs_ending_with(target) {
            if dir.rsplit('/').next() != Some(target) {
                continue;
            }
            let files: Vec<String> = self
                .index
                .under_dir(dir)
                .into_iter()
                .filter(|p| p.ends_with(".swift"))
                .map(str::to_string)
                .collect();
            if !files.is_empty() {
                return ImportResolution::package(files);
            }
        }
        ImportResolution::External(target.to_string())
    }
}

fn first_segment<'s>(target: &'s str, separators: &[char]) -> &'s str {
    target
        .split(|c| separators.contains(&c))
        .find(|s| !s.is_empty())
        .unwrap_or(target)
}

/// npm package name: `@scope/pkg/sub` -> `@scope/pkg`, `lodash/fp` -> `lodash`.
fn package_name(target: &str) -> String {
    let mut parts = target.split('/');
    let first = parts.next().unwrap_or(target);
    match (first.starts_with('@'), parts.next()) {
        (true, Some(second)) => format!("{first}/{second}"),
        _ => first.to_string(),
    }
}

/// Directory holding the submodules of the module defined by `path`.
fn rust_module_dir(path: &str) -> String {
    let dir = parent_dir(path);
    let file = path.rsplit('/').next().unwrap_or(path);
    match file {
        "mod.rs" | "lib.rs" | "main.rs" => dir.to_string(),
        _ => under(dir, file.strip_suffix(".rs").unwrap_or(file)),
    }
}

/// The `src` directory enclosing `path`, or the file's own directory.
fn rust_crate_root(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').collect();
    match segments.iter().rposition(|s| *s == "src") {
        Some(idx) if idx + 1 < segments.len() => segments[..=idx].join("/"),
        _ => parent_dir(path).to_string(),
    }
}
