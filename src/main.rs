//! coderank CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "coderank")]
#[command(about = "Rank the files, functions and modules of a code repository", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Repository root path (defaults to current directory)
    #[arg(short, long, global = true, default_value = ".")]
    root: PathBuf,

    /// Engine configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze the repository and print rankings
    Analyze {
        /// Entries per ranked view
        #[arg(short, long, default_value = "10")]
        top: usize,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the subgraph around one entity as JSON
    Subgraph {
        /// Entity id: a file path, `path::function` or a module name
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        focus: Option<String>,

        /// Export the whole graph, capped at the highest-ranked nodes
        #[arg(long)]
        all: bool,

        /// Graph to query: file, function or module
        #[arg(short, long, default_value = "file")]
        kind: coderank_core::EntityKind,
    },
    /// Show version
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!("coderank={}", log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Analyze { top, json } => commands::analyze(&cli.root, cli.config.as_deref(), top, json),
        Commands::Subgraph { focus, all: _, kind } => {
            commands::subgraph(&cli.root, cli.config.as_deref(), focus, kind)
        }
        Commands::Version => {
            println!("coderank v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
