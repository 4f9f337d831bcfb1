//! Query/mutation server: newline-delimited JSON-RPC over a byte stream.
//!
//! One JSON object per line. Requests carry `id`, `method`, `params`;
//! responses carry the matching `id` and either `result` or `error`.
//! Messages without an `id` are notifications and never receive a response.
//! The server is strictly single-threaded: one request is processed to
//! completion before the next is read, and the graph log's mtime is checked
//! once per incoming request.

use std::io::{BufRead, Write};

use serde_json::{Value, json};

use crate::error::ServerError;
use crate::model::{Edge, EdgeSource};
use crate::store::GraphStore;

/// Result type for server operations.
pub type ServerResult<T> = std::result::Result<T, ServerError>;

/// JSON-RPC error code for an unknown method.
const METHOD_NOT_FOUND: i64 = -32601;
/// JSON-RPC error code for malformed JSON.
const PARSE_ERROR: i64 = -32700;

/// Confidence assigned to manually inserted relations.
pub const MANUAL_CONFIDENCE: f64 = 0.9;

/// Default result cap for list and search tools.
const DEFAULT_LIMIT: usize = 50;

/// The graph query/mutation server.
pub struct Server {
    store: GraphStore,
}

impl Server {
    pub fn new(store: GraphStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Serve requests from `reader` until EOF, writing one response line per
    /// request to `writer`.
    pub fn serve(&mut self, reader: impl BufRead, mut writer: impl Write) -> ServerResult<()> {
        for line in reader.lines() {
            let line = line.map_err(|e| ServerError::Read { source: e })?;
            if line.trim().is_empty() {
                continue;
            }
            if let Some(response) = self.handle_line(&line) {
                let mut out = response.into_bytes();
                out.push(b'\n');
                writer
                    .write_all(&out)
                    .and_then(|_| writer.flush())
                    .map_err(|e| ServerError::Write { source: e })?;
            }
        }
        Ok(())
    }

    /// Handle one raw message line. Returns `None` for notifications.
    pub fn handle_line(&mut self, line: &str) -> Option<String> {
        let message: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                // No id is recoverable from a parse failure; answer with null id.
                return Some(error_response(
                    Value::Null,
                    PARSE_ERROR,
                    &format!("parse error: {e}"),
                ));
            }
        };

        let id = message.get("id").cloned();
        let method = message
            .get("method")
            .and_then(|m| m.as_str())
            .unwrap_or_default()
            .to_string();
        let params = message.get("params").cloned().unwrap_or(Value::Null);

        // Staleness check: one reload-if-changed per incoming request.
        if let Err(e) = self.store.reload_if_changed() {
            tracing::warn!(error = %e, "reload failed; serving last good view");
        }

        // Notifications get processed (for their side effects, of which the
        // lifecycle ones have none) but never answered.
        let Some(id) = id else {
            tracing::debug!(method, "notification received");
            return None;
        };

        let result = match method.as_str() {
            "initialize" => json!({
                "protocolVersion": "2024-11-05",
                "serverInfo": {
                    "name": "vaultgraph",
                    "version": env!("CARGO_PKG_VERSION"),
                },
                "capabilities": { "tools": {} },
            }),
            "tools/list" => json!({ "tools": tool_schemas() }),
            "tools/call" => self.handle_tool_call(&params),
            "ping" => json!({}),
            other => {
                return Some(error_response(
                    id,
                    METHOD_NOT_FOUND,
                    &format!("unknown method: {other}"),
                ));
            }
        };

        Some(
            json!({ "jsonrpc": "2.0", "id": id, "result": result }).to_string(),
        )
    }

    /// Dispatch a `tools/call` to one of the four graph tools.
    ///
    /// Tool-level failures come back as `isError` results, not protocol
    /// errors; the server stays alive either way.
    fn handle_tool_call(&mut self, params: &Value) -> Value {
        let name = params.get("name").and_then(|n| n.as_str()).unwrap_or("");
        let args = params.get("arguments").cloned().unwrap_or(json!({}));

        let outcome = match name {
            "list_nodes" => Ok(self.tool_list_nodes(&args)),
            "search" => Ok(self.tool_search(&args)),
            "get_node" => Ok(self.tool_get_node(&args)),
            "add_relation" => self.tool_add_relation(&args),
            other => Err(format!("unknown tool: {other}")),
        };

        match outcome {
            Ok(payload) => json!({
                "content": [{ "type": "text", "text": payload.to_string() }],
            }),
            Err(message) => json!({
                "content": [{ "type": "text", "text": message }],
                "isError": true,
            }),
        }
    }

    fn tool_list_nodes(&self, args: &Value) -> Value {
        let type_filter = args.get("type").and_then(|t| t.as_str());
        let query = args.get("query").and_then(|q| q.as_str());
        let limit = args
            .get("limit")
            .and_then(|l| l.as_u64())
            .map(|l| l as usize)
            .unwrap_or(DEFAULT_LIMIT);
        let nodes = self.store.list_nodes(type_filter, query, limit);
        json!({ "count": nodes.len(), "nodes": nodes })
    }

    fn tool_search(&self, args: &Value) -> Value {
        let text = args.get("text").and_then(|t| t.as_str());
        let limit = args
            .get("limit")
            .and_then(|l| l.as_u64())
            .map(|l| l as usize)
            .unwrap_or(DEFAULT_LIMIT);
        let nodes = self.store.list_nodes(None, text, limit);
        json!({ "count": nodes.len(), "nodes": nodes })
    }

    /// Node lookup plus its touching edges; a missing node is a `null`
    /// result, not an error.
    fn tool_get_node(&self, args: &Value) -> Value {
        let id = args.get("id").and_then(|i| i.as_str()).unwrap_or("");
        match self.store.get_node(id) {
            Some(node) => {
                let edges: Vec<&Edge> = self.store.edges_touching(id).collect();
                json!({ "node": node, "edges": edges })
            }
            None => json!({ "node": null, "edges": [] }),
        }
    }

    fn tool_add_relation(&mut self, args: &Value) -> Result<Value, String> {
        let field = |key: &str| {
            args.get(key)
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
        };
        let (Some(src_id), Some(dst_id), Some(rel_type)) =
            (field("src_id"), field("dst_id"), field("rel_type"))
        else {
            return Err("Missing required fields".to_string());
        };
        let note = field("note").map(|n| n.to_string());

        let edge = Edge {
            src_id: src_id.to_string(),
            dst_id: dst_id.to_string(),
            rel_type: rel_type.to_string(),
            confidence: MANUAL_CONFIDENCE,
            source: EdgeSource::Manual { note },
        };
        let inserted = self
            .store
            .insert_edge(edge)
            .map_err(|e| format!("failed to append edge: {e}"))?;
        Ok(json!({ "ok": true, "inserted": inserted }))
    }
}

/// Tool descriptors for `tools/list`.
fn tool_schemas() -> Value {
    json!([
        {
            "name": "list_nodes",
            "description": "List graph nodes, optionally filtered by type and substring query.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "type": { "type": "string" },
                    "query": { "type": "string" },
                    "limit": { "type": "integer", "default": DEFAULT_LIMIT },
                },
            },
        },
        {
            "name": "get_node",
            "description": "Get one node by id, with every edge touching it.",
            "inputSchema": {
                "type": "object",
                "properties": { "id": { "type": "string" } },
                "required": ["id"],
            },
        },
        {
            "name": "search",
            "description": "Full-text substring search over all nodes.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "text": { "type": "string" },
                    "limit": { "type": "integer", "default": DEFAULT_LIMIT },
                },
                "required": ["text"],
            },
        },
        {
            "name": "add_relation",
            "description": "Insert a manually-authored edge between two node ids.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "src_id": { "type": "string" },
                    "dst_id": { "type": "string" },
                    "rel_type": { "type": "string" },
                    "note": { "type": "string" },
                },
                "required": ["src_id", "dst_id", "rel_type"],
            },
        },
    ])
}

fn error_response(id: Value, code: i64, message: &str) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message },
    })
    .to_string()
}
