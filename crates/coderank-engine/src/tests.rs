//! Unit tests for coderank-engine module

use crate::*;
use coderank_core::{CodeRankError, EngineConfig, EntityKind, SourceFile};
use coderank_indexer::Coordinator;

fn sources(files: &[(&str, &str)]) -> Vec<SourceFile> {
    files
        .iter()
        .map(|(path, text)| SourceFile::detect(*path, *text))
        .collect()
}

fn analyzer(config: EngineConfig) -> Analyzer {
    Analyzer::new(config).with_coordinator(Coordinator::sequential())
}

fn analyze(files: &[(&str, &str)]) -> GraphBundle {
    analyze_with(EngineConfig::default(), files)
}

fn analyze_with(config: EngineConfig, files: &[(&str, &str)]) -> GraphBundle {
    analyzer(config).analyze(&sources(files), 1).unwrap()
}

fn ids(top: &TopN) -> Vec<&str> {
    top.entries.iter().map(|e| e.id.as_str()).collect()
}

const HELPER: &str = "def helper():\n    pass\n";
const CALLS_HELPER: &str = "def main():\n    helper()\n";

#[test]
fn test_same_directory_candidate_wins() {
    let bundle = analyze(&[
        ("dir1/a.py", HELPER),
        ("dir2/b.py", HELPER),
        ("dir1/c.py", CALLS_HELPER),
    ]);
    let calls = &bundle.graphs.call_graph;
    assert_eq!(calls.weight("dir1/c.py::main", "dir1/a.py::helper"), Some(1.0));
    assert_eq!(calls.weight("dir1/c.py::main", "dir2/b.py::helper"), None);
    assert_eq!(bundle.stats.call_resolution.proximity, 1);
}

#[test]
fn test_tied_candidates_get_reduced_edges() {
    let bundle = analyze(&[
        ("dir1/a.py", HELPER),
        ("dir1/b.py", HELPER),
        ("dir1/c.py", CALLS_HELPER),
    ]);
    let calls = &bundle.graphs.call_graph;
    assert_eq!(calls.weight("dir1/c.py::main", "dir1/a.py::helper"), Some(0.3));
    assert_eq!(calls.weight("dir1/c.py::main", "dir1/b.py::helper"), Some(0.3));
    assert_eq!(calls.edges_from("dir1/c.py::main").len(), 2);
}

#[test]
fn test_ambiguous_weight_is_configurable() {
    let mut config = EngineConfig::default();
    config.resolver.ambiguous_weight = 0.5;
    let bundle = analyze_with(
        config,
        &[("x/a.py", HELPER), ("y/b.py", HELPER), ("z/c.py", CALLS_HELPER)],
    );
    assert_eq!(
        bundle.graphs.call_graph.weight("z/c.py::main", "y/b.py::helper"),
        Some(0.5)
    );
}

#[test]
fn test_repeated_calls_accumulate_and_recursion_is_kept() {
    let bundle = analyze(&[(
        "m.py",
        "def fact(n):\n    return n * fact(n - 1)\n\ndef run():\n    fact(1)\n    fact(2)\n",
    )]);
    let calls = &bundle.graphs.call_graph;
    assert_eq!(calls.weight("m.py::fact", "m.py::fact"), Some(1.0));
    assert_eq!(calls.weight("m.py::run", "m.py::fact"), Some(2.0));
    assert_eq!(calls.edge_count(), 2);
}

#[test]
fn test_external_module_never_in_top_files() {
    let bundle = analyze(&[
        ("src/util.py", "import numpy\n\ndef f():\n    return numpy.zeros(3)\n"),
        ("src/main.py", "from util import f\n\ndef main():\n    f()\n"),
    ]);
    let exporter = Exporter::new(&bundle);

    let files = exporter.top_n(EntityKind::File, 10);
    assert!(!files.degraded);
    assert!(!ids(&files).contains(&"numpy"));
    assert_eq!(files.entries.len(), 2);

    let modules = exporter.top_n(EntityKind::Module, 10);
    let numpy = modules
        .entries
        .iter()
        .find(|e| e.id == "numpy")
        .expect("numpy is ranked as a module");
    assert!(!numpy.is_local);
    assert!(modules.entries.iter().any(|e| e.id == "src" && e.is_local));

    assert_eq!(
        bundle.graphs.import_graph.weight("src/main.py", "src/util.py"),
        Some(1.0)
    );
    assert_eq!(bundle.graphs.module_graph.weight("src", "numpy"), Some(1.0));
}

#[test]
fn test_external_name_matching_local_package_joins_local_node() {
    let bundle = analyze(&[
        ("requests/client.py", "def get():\n    pass\n"),
        ("main.py", "import requests.adapters\n"),
    ]);
    let graphs = &bundle.graphs;

    assert_eq!(graphs.import_stats.external, 1);
    let named: Vec<_> = graphs.modules.iter().filter(|m| m.name == "requests").collect();
    assert_eq!(named.len(), 1);
    assert!(named[0].is_local);
    assert!(graphs.module_graph.node("requests").unwrap().is_local);
    assert_eq!(graphs.module_graph.weight("main", "requests"), Some(1.0));
}

#[test]
fn test_import_chain_sink_outranks_source() {
    let bundle = analyze(&[
        ("a.py", "import b\n"),
        ("b.py", "import c\n"),
        ("c.py", "x = 1\n"),
    ]);
    let exporter = Exporter::new(&bundle);
    let a = exporter.score_of(EntityKind::File, "a.py").unwrap();
    let c = exporter.score_of(EntityKind::File, "c.py").unwrap();
    assert!(c > a, "c={c} a={a}");

    assert_eq!(ids(&exporter.hubs(10)), vec!["a.py", "b.py"]);
    assert_eq!(ids(&exporter.authorities(10)), vec!["b.py", "c.py"]);
}

#[test]
fn test_scores_sum_to_one() {
    let bundle = analyze(&[
        ("pkg/a.py", "from . import b\nimport os\n\ndef f():\n    g()\n"),
        ("pkg/b.py", "import sys\n\ndef g():\n    f()\n    h()\n"),
        ("pkg/c.py", "def h():\n    pass\n"),
        ("README.md", "# pkg\n"),
    ]);
    for kind in [EntityKind::File, EntityKind::Function, EntityKind::Module] {
        let total = bundle.ranking(kind).total();
        assert!((total - 1.0).abs() < 1e-9, "{kind}: {total}");
    }
}

#[test]
fn test_analysis_is_deterministic() {
    let files = [
        ("svc/a.py", "import svc.b\n\ndef run():\n    step()\n    step()\n"),
        ("svc/b.py", "def step():\n    pass\n"),
        ("other/c.py", "def step():\n    pass\n"),
        ("main.py", "import svc.a\n"),
    ];
    let first = analyze(&files);
    let second = analyze(&files);
    for kind in [EntityKind::File, EntityKind::Function, EntityKind::Module] {
        let a: Vec<(&str, f64)> = first.ranking(kind).iter().collect();
        let b: Vec<(&str, f64)> = second.ranking(kind).iter().collect();
        assert_eq!(a, b, "{kind}");
    }
}

#[test]
fn test_no_files_is_fatal() {
    let err = analyzer(EngineConfig::default()).analyze(&[], 1).unwrap_err();
    assert!(matches!(err, CodeRankError::NoFiles));
}

#[test]
fn test_non_source_repository_falls_back_with_flag() {
    let bundle = analyze(&[("README.md", "# hi\n"), ("docs/guide.md", "text\n")]);
    let exporter = Exporter::new(&bundle);

    let files = exporter.top_n(EntityKind::File, 5);
    assert!(files.degraded);
    assert_eq!(files.entries.len(), 2);
    let json = serde_json::to_value(&files).unwrap();
    assert_eq!(json["degraded"], serde_json::Value::Bool(true));
    assert_eq!(json["kind"], "file");

    let modules = exporter.top_n(EntityKind::Module, 5);
    assert!(modules.degraded);

    assert!(exporter.top_n(EntityKind::Function, 5).entries.is_empty());
    assert_eq!(bundle.stats.source_files, 0);
    assert_eq!(bundle.stats.total_files, 2);
}

const CHAIN: &str = "def a():\n    b()\n\ndef b():\n    c()\n\ndef c():\n    pass\n";

#[test]
fn test_subgraph_around_a_function() {
    let bundle = analyze(&[("m.py", CHAIN)]);
    let sub = Exporter::new(&bundle)
        .subgraph(EntityKind::Function, &Focus::Entity("m.py::b".into()))
        .unwrap();

    let nodes: Vec<(&str, bool)> = sub.nodes.iter().map(|n| (n.id.as_str(), n.is_focus)).collect();
    assert_eq!(nodes, vec![("m.py::b", true), ("m.py::a", false), ("m.py::c", false)]);
    let edges: Vec<(&str, &str)> = sub
        .edges
        .iter()
        .map(|e| (e.source.as_str(), e.target.as_str()))
        .collect();
    assert_eq!(edges, vec![("m.py::a", "m.py::b"), ("m.py::b", "m.py::c")]);
    assert_eq!(sub.nodes[0].score, bundle.function_rank.score("m.py::b").unwrap());
}

#[test]
fn test_subgraph_of_whole_graph_is_capped() {
    let mut config = EngineConfig::default();
    config.export.max_subgraph_nodes = 2;
    let bundle = analyze_with(config, &[("m.py", CHAIN)]);
    let sub = Exporter::new(&bundle)
        .subgraph(EntityKind::Function, &Focus::All)
        .unwrap();

    assert!(sub.truncated);
    let nodes: Vec<&str> = sub.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(nodes, vec!["m.py::c", "m.py::b"]);
    assert_eq!(sub.edges.len(), 1);
    assert_eq!(sub.edges[0].source, "m.py::b");
}

#[test]
fn test_subgraph_unknown_focus() {
    let bundle = analyze(&[("m.py", CHAIN)]);
    let err = Exporter::new(&bundle)
        .subgraph(EntityKind::File, &Focus::Entity("nope.py".into()))
        .unwrap_err();
    assert!(matches!(err, CodeRankError::UnknownEntity(ref id) if id == "nope.py"));
}

#[test]
fn test_central_functions() {
    let bundle = analyze(&[("m.py", CHAIN)]);
    let central = Exporter::new(&bundle).central_functions(5);
    assert_eq!(ids(&central), vec!["m.py::b"]);
}

#[test]
fn test_file_metrics() {
    let bundle = analyze(&[
        ("a.py", "import b\n"),
        ("b.py", "import c\n\nclass K:\n    def run(self):\n        pass\n"),
        ("c.py", "x = 1\n"),
    ]);
    let exporter = Exporter::new(&bundle);
    let metrics = exporter.file_metrics("b.py").unwrap();
    assert_eq!(metrics.imports_count, 1);
    assert_eq!(metrics.imported_by_count, 1);
    assert_eq!(metrics.functions, vec!["K.run"]);
    assert_eq!(metrics.classes, vec!["K"]);
    assert_eq!(metrics.imports, vec!["c"]);
    assert_eq!(metrics.lines, 5);
    assert!(metrics.pagerank > 0.0);

    assert!(matches!(
        exporter.file_metrics("missing.py"),
        Err(CodeRankError::UnknownEntity(_))
    ));
}

#[test]
fn test_repo_stats() {
    let bundle = analyze(&[
        ("app/main.py", "import requests\nfrom . import util\n\ndef main():\n    util.run()\n"),
        ("app/util.py", "def run():\n    pass\n"),
        ("README.md", "# app\n"),
    ]);
    let stats = &bundle.stats;
    assert_eq!(stats.total_files, 3);
    assert_eq!(stats.source_files, 2);
    assert_eq!(stats.functions, 2);
    assert_eq!(stats.imports, 2);
    assert_eq!(stats.import_edges, 1);
    assert_eq!(stats.import_resolution.external, 1);
    assert_eq!(stats.packages, 3);
    assert_eq!(stats.local_packages, 2);
    let languages: Vec<String> = stats
        .languages
        .iter()
        .map(|(language, count)| format!("{language}={count}"))
        .collect();
    assert_eq!(languages, vec!["python=2", "markdown=1"]);
}

#[test]
fn test_boost_formula() {
    assert!((boost(0.5, 0.2, 10.0) - 1.5).abs() < 1e-12);
    assert_eq!(boost(0.8, 0.0, 10.0), 0.8);
}

#[test]
fn test_session_generations() {
    let session = Session::new();
    assert!(matches!(session.current(), Err(CodeRankError::NotLoaded)));

    let analyzer = analyzer(EngineConfig::default());
    let first = session
        .load(&analyzer, &sources(&[("a.py", "def f():\n    pass\n")]))
        .unwrap();
    assert_eq!(first.generation, 1);
    assert_eq!(session.snapshot(1).unwrap().generation, 1);

    let second = session
        .load(&analyzer, &sources(&[("b.py", "def g():\n    pass\n")]))
        .unwrap();
    assert_eq!(second.generation, 2);
    assert_eq!(session.generation(), Some(2));

    let err = session.snapshot(1).unwrap_err();
    assert!(matches!(
        err,
        CodeRankError::StaleGeneration {
            requested: 1,
            current: 2
        }
    ));
    // A snapshot taken earlier still answers from its own generation.
    assert!(first.function_rank.score("a.py::f").is_some());
    assert!(first.function_rank.score("b.py::g").is_none());
}

#[test]
fn test_older_bundle_does_not_replace_newer() {
    let session = Session::new();
    let analyzer = analyzer(EngineConfig::default());
    let files = sources(&[("a.py", "x = 1\n")]);
    let old = analyzer.analyze(&files, session.next_generation()).unwrap();
    let new = analyzer.analyze(&files, session.next_generation()).unwrap();
    session.install(new);
    session.install(old);
    assert_eq!(session.generation(), Some(2));
}
