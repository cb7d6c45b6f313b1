//! Integration tests for coderank
//!
//! These tests walk a repository on disk and drive it through the indexer,
//! the engine and the exporter together.

use coderank::load_repository;
use coderank_core::{CodeRankError, EngineConfig, EntityKind, Language};
use coderank_engine::{Analyzer, Exporter, Focus, Session};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, path: &str, content: &str) {
    let full = root.join(path);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(full, content).unwrap();
}

/// main -> service -> util, both as imports and as calls.
fn sample_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        "app/main.py",
        "import app.service\nimport os\n\n\ndef main():\n    run()\n",
    );
    write(
        root,
        "app/service.py",
        "import app.util\n\n\ndef run():\n    helper()\n",
    );
    write(root, "app/util.py", "def helper():\n    return 1\n");
    write(root, "README.md", "# sample\n");
    dir
}

fn ids(view: &coderank_engine::TopN) -> Vec<&str> {
    view.entries.iter().map(|e| e.id.as_str()).collect()
}

#[test]
fn test_end_to_end_rankings() {
    let repo = sample_repo();
    let files = load_repository(repo.path()).unwrap();
    assert_eq!(files.len(), 4);

    let session = Session::new();
    let bundle = session
        .load(&Analyzer::new(EngineConfig::default()), &files)
        .unwrap();
    let exporter = Exporter::new(&bundle);

    let stats = exporter.summary();
    assert_eq!(stats.total_files, 4);
    assert_eq!(stats.source_files, 3);
    assert_eq!(stats.languages.get(&Language::Python), Some(&3));
    assert_eq!(stats.functions, 3);
    assert_eq!(stats.import_edges, 2);
    assert_eq!(stats.call_edges, 2);
    assert_eq!(stats.import_resolution.external, 1);

    let top_files = exporter.top_n(EntityKind::File, 3);
    assert!(!top_files.degraded);
    assert_eq!(top_files.entries[0].id, "app/util.py");
    assert!(!ids(&top_files).contains(&"README.md"));

    let top_functions = exporter.top_n(EntityKind::Function, 1);
    assert_eq!(ids(&top_functions), vec!["app/util.py::helper"]);

    let central = exporter.central_functions(5);
    assert_eq!(ids(&central), vec!["app/service.py::run"]);

    let modules = exporter.top_n(EntityKind::Module, 10);
    let os = modules.entries.iter().find(|e| e.id == "os").unwrap();
    assert!(!os.is_local);
    let app = modules.entries.iter().find(|e| e.id == "app").unwrap();
    assert!(app.is_local);
}

#[test]
fn test_hubs_and_authorities_follow_imports() {
    let repo = sample_repo();
    let files = load_repository(repo.path()).unwrap();
    let bundle = Analyzer::new(EngineConfig::default())
        .analyze(&files, 1)
        .unwrap();
    let exporter = Exporter::new(&bundle);

    let hubs = exporter.hubs(10);
    assert!(ids(&hubs).contains(&"app/main.py"));
    assert!(!ids(&hubs).contains(&"app/util.py"));

    let authorities = exporter.authorities(10);
    assert!(ids(&authorities).contains(&"app/util.py"));
    assert!(!ids(&authorities).contains(&"app/main.py"));
}

#[test]
fn test_subgraph_around_file() {
    let repo = sample_repo();
    let files = load_repository(repo.path()).unwrap();
    let bundle = Analyzer::new(EngineConfig::default())
        .analyze(&files, 7)
        .unwrap();

    let graph = Exporter::new(&bundle)
        .subgraph(EntityKind::File, &Focus::Entity("app/service.py".into()))
        .unwrap();
    assert_eq!(graph.generation, 7);
    let nodes: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(nodes, vec!["app/service.py", "app/main.py", "app/util.py"]);
    assert!(graph.nodes[0].is_focus);
    assert_eq!(graph.edges.len(), 2);

    let json = serde_json::to_value(&graph).unwrap();
    assert_eq!(json["focus"], "app/service.py");
    assert_eq!(json["kind"], "file");
}

#[test]
fn test_file_metrics_from_disk() {
    let repo = sample_repo();
    let files = load_repository(repo.path()).unwrap();
    let bundle = Analyzer::new(EngineConfig::default())
        .analyze(&files, 1)
        .unwrap();

    let metrics = Exporter::new(&bundle).file_metrics("app/main.py").unwrap();
    assert_eq!(metrics.language, Language::Python);
    assert_eq!(metrics.functions, vec!["main"]);
    assert_eq!(metrics.imports, vec!["app.service", "os"]);
    assert_eq!(metrics.imports_count, 1);
    assert_eq!(metrics.imported_by_count, 0);
}

#[test]
fn test_reload_bumps_generation() {
    let repo = sample_repo();
    let analyzer = Analyzer::new(EngineConfig::default());
    let session = Session::new();

    let files = load_repository(repo.path()).unwrap();
    let first = session.load(&analyzer, &files).unwrap();
    assert_eq!(first.generation, 1);

    write(repo.path(), "app/extra.py", "import app.util\n");
    let files = load_repository(repo.path()).unwrap();
    let second = session.load(&analyzer, &files).unwrap();
    assert_eq!(second.generation, 2);
    assert_eq!(second.stats.total_files, 5);

    // A reader that captured the first generation sees it is stale.
    assert!(matches!(
        session.snapshot(first.generation),
        Err(CodeRankError::StaleGeneration { requested: 1, current: 2 })
    ));
    // The captured bundle itself is unchanged.
    assert_eq!(first.stats.total_files, 4);
}

#[test]
fn test_config_file_is_applied() {
    let repo = sample_repo();
    let config_path = repo.path().join("coderank.toml");
    fs::write(&config_path, "[pagerank]\ndamping = 0.5\n\n[export]\nmax_subgraph_nodes = 2\n").unwrap();
    let config = EngineConfig::load(&config_path).unwrap();

    let files = load_repository(repo.path()).unwrap();
    let bundle = Analyzer::new(config).analyze(&files, 1).unwrap();
    assert_eq!(bundle.config.pagerank.damping, 0.5);

    let total: f64 = bundle.file_rank.iter().map(|(_, s)| s).sum();
    assert!((total - 1.0).abs() < 1e-6);

    let whole = Exporter::new(&bundle)
        .subgraph(EntityKind::File, &Focus::All)
        .unwrap();
    assert_eq!(whole.nodes.len(), 2);
    assert!(whole.truncated);
}

#[test]
fn test_empty_repository_is_fatal() {
    let dir = TempDir::new().unwrap();
    let files = load_repository(dir.path()).unwrap();
    assert!(files.is_empty());
    let result = Analyzer::new(EngineConfig::default()).analyze(&files, 1);
    assert!(matches!(result, Err(CodeRankError::NoFiles)));
}

#[test]
fn test_mixed_language_repository() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "web/index.js", "import { api } from './api';\n\nfunction start() {\n  api();\n}\n");
    write(root, "web/api.js", "export function api() {\n  return 1;\n}\n");
    write(root, "cmd/main.go", "package main\n\nfunc main() {\n\trun()\n}\n\nfunc run() {\n}\n");

    let files = load_repository(root).unwrap();
    let bundle = Analyzer::new(EngineConfig::default())
        .analyze(&files, 1)
        .unwrap();

    let imports = &bundle.graphs.import_graph;
    assert_eq!(imports.weight("web/index.js", "web/api.js"), Some(1.0));
    let calls = &bundle.graphs.call_graph;
    assert_eq!(calls.weight("web/index.js::start", "web/api.js::api"), Some(1.0));
    assert_eq!(calls.weight("cmd/main.go::main", "cmd/main.go::run"), Some(1.0));
    assert_eq!(bundle.stats.languages.get(&Language::JavaScript), Some(&2));
    assert_eq!(bundle.stats.languages.get(&Language::Go), Some(&1));
}
