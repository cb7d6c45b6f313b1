//! CLI command implementations

use coderank::load_repository;
use coderank_core::{EngineConfig, EntityKind};
use coderank_engine::{Analyzer, Exporter, Focus, GraphBundle, RepoStats, Session, TopN};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Everything `analyze --json` prints.
#[derive(Serialize)]
struct Report<'a> {
    generation: u64,
    summary: &'a RepoStats,
    files: TopN,
    functions: TopN,
    modules: TopN,
    hubs: TopN,
    authorities: TopN,
    central_functions: TopN,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => {
            tracing::info!("Using configuration {}", path.display());
            Ok(EngineConfig::load(path)?)
        }
        None => Ok(EngineConfig::default()),
    }
}

fn run(root: &Path, config: Option<&Path>) -> anyhow::Result<Arc<GraphBundle>> {
    tracing::info!("Analyzing repository: {}", root.display());
    let config = load_config(config)?;
    let files = load_repository(root)?;

    let session = Session::new();
    let bundle = session.load(&Analyzer::new(config), &files)?;
    for warning in &bundle.warnings {
        tracing::debug!("{}: {}", warning.path, warning.message);
    }
    Ok(bundle)
}

pub fn analyze(root: &Path, config: Option<&Path>, top: usize, json: bool) -> anyhow::Result<()> {
    let bundle = run(root, config)?;
    let exporter = Exporter::new(&bundle);

    let report = Report {
        generation: exporter.generation(),
        summary: exporter.summary(),
        files: exporter.top_n(EntityKind::File, top),
        functions: exporter.top_n(EntityKind::Function, top),
        modules: exporter.top_n(EntityKind::Module, top),
        hubs: exporter.hubs(top),
        authorities: exporter.authorities(top),
        central_functions: exporter.central_functions(top),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render(&report));
    }
    Ok(())
}

pub fn subgraph(
    root: &Path,
    config: Option<&Path>,
    focus: Option<String>,
    kind: EntityKind,
) -> anyhow::Result<()> {
    let bundle = run(root, config)?;
    let focus = match focus {
        Some(id) => Focus::Entity(id),
        None => Focus::All,
    };
    let graph = Exporter::new(&bundle).subgraph(kind, &focus)?;
    println!("{}", serde_json::to_string_pretty(&graph)?);
    Ok(())
}

fn render(report: &Report<'_>) -> String {
    let s = report.summary;
    let mut out = String::new();
    out.push_str("Repository summary\n");
    out.push_str(&format!(
        "  files: {} ({} source)\n",
        s.total_files, s.source_files
    ));
    let languages: Vec<String> = s
        .languages
        .iter()
        .map(|(lang, count)| format!("{lang} {count}"))
        .collect();
    out.push_str(&format!("  languages: {}\n", languages.join(", ")));
    out.push_str(&format!(
        "  functions: {}  classes: {}  imports: {}\n",
        s.functions, s.classes, s.imports
    ));
    out.push_str(&format!(
        "  packages: {} ({} local)\n",
        s.packages, s.local_packages
    ));
    out.push_str(&format!(
        "  import edges: {}  call edges: {}\n",
        s.import_edges, s.call_edges
    ));
    out.push_str(&format!(
        "  avg file connections: {:.2}  avg function calls: {:.2}\n",
        s.avg_file_connections, s.avg_function_calls
    ));
    if s.warnings > 0 {
        out.push_str(&format!("  parse warnings: {}\n", s.warnings));
    }

    section(&mut out, "Most important files", &report.files, false);
    section(&mut out, "Most important functions", &report.functions, false);
    section(&mut out, "Most important modules", &report.modules, true);
    section(&mut out, "Hub files", &report.hubs, false);
    section(&mut out, "Authority files", &report.authorities, false);
    section(&mut out, "Central functions", &report.central_functions, false);
    out
}

fn section(out: &mut String, title: &str, view: &TopN, tag_locality: bool) {
    out.push('\n');
    out.push_str(title);
    if view.degraded {
        out.push_str(" (no source entities; showing best local)");
    }
    out.push('\n');
    if view.entries.is_empty() {
        out.push_str("  (none)\n");
        return;
    }
    for (rank, entry) in view.entries.iter().enumerate() {
        let tag = match (tag_locality, entry.is_local) {
            (false, _) => "",
            (true, true) => "  [local]",
            (true, false) => "  [external]",
        };
        out.push_str(&format!(
            "  {:>3}. {:.6}  {}{}\n",
            rank + 1,
            entry.score,
            entry.id,
            tag
        ));
    }
}
