//! vaultgraph CLI: vault indexer and graph query server.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use vaultgraph::indexer::{IndexConfig, index_vault};
use vaultgraph::scan::DEFAULT_EXCLUDES;
use vaultgraph::server::Server;
use vaultgraph::store::GraphStore;
use vaultgraph::vocab;

#[derive(Parser)]
#[command(name = "vaultgraph", version, about = "Markdown vault entity-relationship graph")]
struct Cli {
    /// Vault root directory (repeatable).
    #[arg(long, global = true)]
    vault: Vec<PathBuf>,

    /// Path to the append-only graph log.
    #[arg(long, global = true, default_value = "graph.jsonl")]
    log: PathBuf,

    /// Directory names to exclude from scanning (repeatable).
    #[arg(long, global = true)]
    exclude: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the vault and update the graph log.
    Index,

    /// Serve graph queries over stdio (line-delimited JSON-RPC).
    Serve,

    /// One-shot node search without starting the server.
    Query {
        /// Substring to search for.
        text: String,

        /// Restrict to one node type.
        #[arg(long)]
        r#type: Option<String>,

        /// Maximum results.
        #[arg(long, default_value = "50")]
        limit: usize,
    },

    /// Show graph statistics.
    Info,

    /// Rewrite deprecated type/tag synonyms in front matter.
    Normalize {
        /// Write changes back to the vault (default: dry-run report only).
        #[arg(long)]
        apply: bool,

        /// Where to write the Markdown report.
        #[arg(long, default_value = "normalize-report.md")]
        report: PathBuf,
    },

    /// Fail when deprecated tags appear anywhere in the vault (CI gate).
    Validate {
        /// Where to write the Markdown report.
        #[arg(long, default_value = "validate-report.md")]
        report: PathBuf,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let roots = if cli.vault.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        cli.vault.clone()
    };
    let excludes = if cli.exclude.is_empty() {
        DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect()
    } else {
        cli.exclude.clone()
    };

    match cli.command {
        Commands::Index => {
            let mut store = GraphStore::open(&cli.log).into_diagnostic()?;
            let config = IndexConfig {
                roots,
                excludes,
            };
            let report = index_vault(&mut store, &config)?;
            print!("{report}");
        }

        Commands::Serve => {
            let store = GraphStore::open(&cli.log).into_diagnostic()?;
            tracing::info!(
                log = %cli.log.display(),
                nodes = store.node_count(),
                edges = store.edge_count(),
                "serving graph over stdio"
            );
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            let mut server = Server::new(store);
            server.serve(stdin.lock(), stdout.lock())?;
        }

        Commands::Query {
            text,
            r#type,
            limit,
        } => {
            let store = GraphStore::open(&cli.log).into_diagnostic()?;
            let nodes = store.list_nodes(r#type.as_deref(), Some(&text), limit);
            if nodes.is_empty() {
                println!("No matching nodes.");
            } else {
                println!("Nodes ({}):", nodes.len());
                for node in nodes {
                    println!("  {} \"{}\" [{}]", node.id, node.title, node.rel_path);
                }
            }
        }

        Commands::Info => {
            let store = GraphStore::open(&cli.log).into_diagnostic()?;
            let log_bytes = std::fs::metadata(&cli.log).map(|m| m.len()).unwrap_or(0);
            println!("vaultgraph info");
            println!("  log:             {}", cli.log.display());
            println!("  log size:        {log_bytes} bytes");
            println!("  nodes:           {}", store.node_count());
            println!("  edges:           {}", store.edge_count());
            println!("  malformed lines: {}", store.malformed_lines);
        }

        Commands::Normalize { apply, report } => {
            let outcome = vocab::normalize(&roots, &excludes, apply)?;
            vocab::write_normalize_report(&outcome, &report)?;
            println!(
                "{} change(s) {} across {} document(s); report written to {}",
                outcome.changes.len(),
                if apply { "applied" } else { "planned" },
                outcome.scanned,
                report.display()
            );
        }

        Commands::Validate { report } => {
            let outcome = vocab::validate(&roots, &excludes)?;
            vocab::write_validate_report(&outcome, &report)?;
            if outcome.is_clean() {
                println!(
                    "No deprecated tags in {} document(s).",
                    outcome.scanned
                );
            } else {
                // The CI gate: violations fail the process.
                eprintln!(
                    "{} violation(s) found; see {}",
                    outcome.violations.len(),
                    report.display()
                );
                return Err(vaultgraph::error::VocabError::DeprecatedTags {
                    count: outcome.violations.len(),
                }
                .into());
            }
        }
    }

    Ok(())
}
