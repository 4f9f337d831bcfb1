//! Graph store: append-only log plus in-memory materialized view.
//!
//! The log is the source of truth; [`GraphStore`] owns the materialization
//! (`nodes` map, `edges` list, seen-key set) rebuilt by replaying the log in
//! order. Upserts are idempotent: re-indexing an unchanged corpus appends
//! nothing. There is no ambient/static state, so multiple stores coexist in
//! tests.

pub mod log;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::model::{Edge, LogRecord, Node};

pub use log::{GraphLog, StoreResult};

/// Materialized entity-relationship graph backed by the append-only log.
#[derive(Debug)]
pub struct GraphStore {
    log: GraphLog,
    nodes: HashMap<String, Node>,
    edges: Vec<Edge>,
    seen_edge_keys: HashSet<String>,
    /// Log mtime observed at the last load, for the staleness check.
    loaded_mtime: Option<SystemTime>,
    /// Malformed lines seen on the last replay.
    pub malformed_lines: usize,
}

impl GraphStore {
    /// Open a store over the given log path, replaying it end-to-end.
    pub fn open(log_path: impl Into<PathBuf>) -> StoreResult<Self> {
        let mut store = Self {
            log: GraphLog::new(log_path),
            nodes: HashMap::new(),
            edges: Vec::new(),
            seen_edge_keys: HashSet::new(),
            loaded_mtime: None,
            malformed_lines: 0,
        };
        store.reload()?;
        Ok(store)
    }

    pub fn log_path(&self) -> &Path {
        self.log.path()
    }

    /// Rebuild the in-memory view from the log, replacing the old view.
    pub fn reload(&mut self) -> StoreResult<()> {
        let replay = self.log.replay()?;
        self.nodes.clear();
        self.edges.clear();
        self.seen_edge_keys.clear();
        for record in replay.records {
            match record {
                LogRecord::Node(node) => {
                    // Later upserts overwrite earlier ones in the view.
                    self.nodes.insert(node.id.clone(), node);
                }
                LogRecord::Edge(edge) => {
                    if self.seen_edge_keys.insert(edge.key()) {
                        self.edges.push(edge);
                    }
                }
            }
        }
        self.malformed_lines = replay.malformed_lines;
        self.loaded_mtime = self.log.mtime();
        tracing::debug!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            malformed = self.malformed_lines,
            "graph log replayed"
        );
        Ok(())
    }

    /// Reload only if the log file changed since the last load.
    ///
    /// This is the per-request staleness check used by the server: simple,
    /// non-atomic cache invalidation with staleness bounded by one request.
    pub fn reload_if_changed(&mut self) -> StoreResult<bool> {
        if self.log.mtime() == self.loaded_mtime {
            return Ok(false);
        }
        self.reload()?;
        Ok(true)
    }

    /// Upsert a node: append to the log only when the candidate differs
    /// structurally from the materialized node of the same id.
    ///
    /// Returns `true` when a record was appended.
    pub fn upsert_node(&mut self, node: Node) -> StoreResult<bool> {
        if let Some(existing) = self.nodes.get(&node.id) {
            if existing.same_content(&node) {
                return Ok(false);
            }
        }
        self.log.append(&LogRecord::Node(node.clone()))?;
        self.nodes.insert(node.id.clone(), node);
        self.loaded_mtime = self.log.mtime();
        Ok(true)
    }

    /// Insert an edge unless its composite key was already seen.
    ///
    /// Returns `true` when a record was appended.
    pub fn insert_edge(&mut self, edge: Edge) -> StoreResult<bool> {
        let key = edge.key();
        if self.seen_edge_keys.contains(&key) {
            return Ok(false);
        }
        self.log.append(&LogRecord::Edge(edge.clone()))?;
        self.seen_edge_keys.insert(key);
        self.edges.push(edge);
        self.loaded_mtime = self.log.mtime();
        Ok(true)
    }

    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges whose source or destination is the given node id.
    pub fn edges_touching<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges
            .iter()
            .filter(move |e| e.src_id == id || e.dst_id == id)
    }

    /// Nodes matching an optional type filter and an optional lowercase
    /// substring query over the node's searchable text, capped at `limit`.
    /// Results are sorted by id for deterministic output.
    pub fn list_nodes(&self, type_filter: Option<&str>, query: Option<&str>, limit: usize) -> Vec<&Node> {
        let needle = query.map(|q| q.to_lowercase());
        let mut matches: Vec<&Node> = self
            .nodes
            .values()
            .filter(|n| type_filter.is_none_or(|t| n.node_type == t))
            .filter(|n| {
                needle
                    .as_deref()
                    .is_none_or(|q| searchable_text(n).contains(q))
            })
            .collect();
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        matches.truncate(limit);
        matches
    }
}

/// Concatenated lowercase haystack for substring search.
fn searchable_text(node: &Node) -> String {
    let mut text = format!(
        "{} {} {} {} {}",
        node.title, node.slug, node.node_type, node.path, node.rel_path
    );
    for part in node.aliases.iter().chain(&node.topics) {
        text.push(' ');
        text.push_str(part);
    }
    text.to_lowercase()
}
