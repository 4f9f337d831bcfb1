//! Indexing pipeline: scan → derive → resolve → extract → append.
//!
//! A single-threaded, synchronous batch job. It fully scans the corpus,
//! derives all nodes, builds resolver tables over the union of log-known and
//! freshly derived nodes (so forward references within the run resolve),
//! then extracts and inserts all edges. Re-running over an unchanged corpus
//! appends zero log lines.

use std::path::PathBuf;

use crate::derive::derive_node;
use crate::error::VaultResult;
use crate::extract::extract_edges;
use crate::resolve::ResolverTables;
use crate::scan::{scan_vault, ScanOutcome};
use crate::store::GraphStore;

/// Configuration for one indexing run.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Vault roots to scan; may overlap.
    pub roots: Vec<PathBuf>,
    /// Directory names excluded from the scan.
    pub excludes: Vec<String>,
}

impl IndexConfig {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            excludes: crate::scan::DEFAULT_EXCLUDES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Summary of one indexing run.
#[derive(Debug, Default, Clone)]
pub struct IndexReport {
    pub files_scanned: usize,
    pub nodes_upserted: usize,
    pub nodes_unchanged: usize,
    pub edges_inserted: usize,
    pub edges_duplicate: usize,
    pub read_errors: usize,
    pub parse_errors: usize,
}

impl std::fmt::Display for IndexReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "indexing report")?;
        writeln!(f, "  files scanned:    {}", self.files_scanned)?;
        writeln!(f, "  nodes upserted:   {}", self.nodes_upserted)?;
        writeln!(f, "  nodes unchanged:  {}", self.nodes_unchanged)?;
        writeln!(f, "  edges inserted:   {}", self.edges_inserted)?;
        writeln!(f, "  duplicate edges:  {}", self.edges_duplicate)?;
        writeln!(f, "  read errors:      {}", self.read_errors)?;
        writeln!(f, "  parse errors:     {}", self.parse_errors)?;
        Ok(())
    }
}

/// Run the full indexing pass over the configured roots.
pub fn index_vault(store: &mut GraphStore, config: &IndexConfig) -> VaultResult<IndexReport> {
    let outcome = scan_vault(&config.roots, &config.excludes)?;
    index_scanned(store, outcome)
}

/// Index an already-scanned corpus (split out for tests and reuse).
pub fn index_scanned(store: &mut GraphStore, outcome: ScanOutcome) -> VaultResult<IndexReport> {
    let mut report = IndexReport {
        files_scanned: outcome.docs.len(),
        read_errors: outcome.read_errors,
        parse_errors: outcome.parse_errors,
        ..Default::default()
    };

    // Phase 1: derive and upsert every node.
    let derived: Vec<_> = outcome.docs.iter().map(derive_node).collect();
    for node in &derived {
        if store.upsert_node(node.clone())? {
            report.nodes_upserted += 1;
            tracing::debug!(id = %node.id, "node upserted");
        } else {
            report.nodes_unchanged += 1;
        }
    }

    // Phase 2: resolver tables over everything known, then edge extraction.
    // The store already materializes this run's nodes, so the tables see
    // log history and the current pass together.
    let tables = ResolverTables::build(store.nodes().collect::<Vec<_>>());
    for (doc, node) in outcome.docs.iter().zip(&derived) {
        for edge in extract_edges(&node.id, &doc.front_matter, &doc.body, &tables) {
            if store.insert_edge(edge)? {
                report.edges_inserted += 1;
            } else {
                report.edges_duplicate += 1;
            }
        }
    }

    tracing::info!(
        files = report.files_scanned,
        nodes = report.nodes_upserted,
        edges = report.edges_inserted,
        "indexing pass complete"
    );
    Ok(report)
}
