//! Edge aggregation from file level up to package level

use crate::model::{ImportEdge, ImportTarget};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Directory names that hold packages rather than being packages themselves.
pub const SOURCE_ROOTS: &[&str] = &["src", "lib", "Sources", "source"];

/// A summary edge between two modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedEdge {
    pub source: String,
    pub target: String,
    /// How many file-level import edges this represents.
    pub count: u32,
    pub target_is_local: bool,
}

/// Top-level package a repository file belongs to.
///
/// `pkg/a/b.py` -> `pkg`, `src/pkg/b.py` -> `pkg`, `main.py` -> `main`,
/// `src/lib.rs` -> `src`.
pub fn module_of_path(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').collect();
    match parts.as_slice() {
        [] => String::new(),
        [file] => file_stem(file).to_string(),
        [root, next, _, ..] if SOURCE_ROOTS.contains(root) => (*next).to_string(),
        [first, ..] => (*first).to_string(),
    }
}

fn file_stem(file: &str) -> &str {
    match file.rfind('.') {
        Some(0) | None => file,
        Some(idx) => &file[..idx],
    }
}

/// Collapse file-level import edges into module-level edges. Edges whose
/// endpoints fall into the same module are dropped.
pub fn aggregate_edges(edges: &[ImportEdge]) -> Vec<AggregatedEdge> {
    let mut agg: BTreeMap<(String, String), AggregatedEdge> = BTreeMap::new();

    for edge in edges {
        let source = module_of_path(&edge.source);
        let target = match &edge.target {
            ImportTarget::File(path) => module_of_path(path),
            ImportTarget::Module(name) => name.clone(),
        };

        if source == target {
            continue;
        }

        let entry = agg
            .entry((source.clone(), target.clone()))
            .or_insert_with(|| AggregatedEdge {
                source,
                target,
                count: 0,
                target_is_local: edge.is_local,
            });
        entry.count += 1;
    }

    agg.into_values().collect()
}
