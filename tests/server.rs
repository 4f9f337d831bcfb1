//! Server integration tests: an indexed vault served over the line protocol.

use std::path::Path;

use serde_json::{Value, json};

use vaultgraph::indexer::{IndexConfig, index_vault};
use vaultgraph::server::Server;
use vaultgraph::store::GraphStore;

fn fixture_vault(vault: &Path) {
    let write = |rel: &str, content: &str| {
        let path = vault.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    };
    write(
        "people/Adam Back.md",
        "---\naliases:\n  - adam\n---\nInvented [[Hashcash]].\n",
    );
    write("people/Wei Dai.md", "Proposed [[B-Money]].\n");
    write("papers/Hashcash.md", "Proof of work.\n");
}

fn indexed_server(vault: &Path, data: &Path) -> Server {
    let log = data.join("graph.jsonl");
    let mut store = GraphStore::open(&log).unwrap();
    index_vault(&mut store, &IndexConfig::new(vec![vault.to_path_buf()])).unwrap();
    Server::new(store)
}

fn call(server: &mut Server, id: u64, method: &str, params: Value) -> Value {
    let line = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params })
        .to_string();
    serde_json::from_str(&server.handle_line(&line).expect("response")).unwrap()
}

fn tool_call(server: &mut Server, id: u64, name: &str, arguments: Value) -> Value {
    let response = call(
        server,
        id,
        "tools/call",
        json!({ "name": name, "arguments": arguments }),
    );
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    serde_json::from_str(text).unwrap()
}

#[test]
fn search_is_a_subset_of_type_listing() {
    let vault = tempfile::TempDir::new().unwrap();
    let data = tempfile::TempDir::new().unwrap();
    fixture_vault(vault.path());
    let mut server = indexed_server(vault.path(), data.path());

    let all = tool_call(&mut server, 1, "list_nodes", json!({ "type": "person" }));
    let filtered = tool_call(
        &mut server,
        2,
        "list_nodes",
        json!({ "type": "person", "query": "adam" }),
    );

    let all_ids: Vec<&str> = all["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["id"].as_str().unwrap())
        .collect();
    assert_eq!(all_ids.len(), 2);
    for node in filtered["nodes"].as_array().unwrap() {
        assert!(all_ids.contains(&node["id"].as_str().unwrap()));
    }
    assert_eq!(filtered["count"], 1);
}

#[test]
fn search_tool_matches_list_nodes_query() {
    let vault = tempfile::TempDir::new().unwrap();
    let data = tempfile::TempDir::new().unwrap();
    fixture_vault(vault.path());
    let mut server = indexed_server(vault.path(), data.path());

    let by_search = tool_call(&mut server, 1, "search", json!({ "text": "hashcash" }));
    let by_list = tool_call(&mut server, 2, "list_nodes", json!({ "query": "hashcash" }));
    assert_eq!(by_search["nodes"], by_list["nodes"]);
}

#[test]
fn manual_relation_survives_reindex_and_restart() {
    let vault = tempfile::TempDir::new().unwrap();
    let data = tempfile::TempDir::new().unwrap();
    fixture_vault(vault.path());
    let log = data.path().join("graph.jsonl");
    let mut server = indexed_server(vault.path(), data.path());

    let added = tool_call(
        &mut server,
        1,
        "add_relation",
        json!({
            "src_id": "person:adam-back",
            "dst_id": "person:wei-dai",
            "rel_type": "knows",
            "note": "curated",
        }),
    );
    assert_eq!(added["inserted"], true);

    // Re-index over the same log: the manual edge is not duplicated or lost.
    let mut store = GraphStore::open(&log).unwrap();
    index_vault(&mut store, &IndexConfig::new(vec![vault.path().to_path_buf()])).unwrap();
    let manual: Vec<_> = store
        .edges()
        .iter()
        .filter(|e| e.rel_type == "knows")
        .collect();
    assert_eq!(manual.len(), 1);
    assert_eq!(manual[0].source.tag(), "manual:curated");
    assert!((manual[0].confidence - 0.9).abs() < f64::EPSILON);
}

#[test]
fn server_picks_up_external_log_changes_per_request() {
    let vault = tempfile::TempDir::new().unwrap();
    let data = tempfile::TempDir::new().unwrap();
    fixture_vault(vault.path());
    let log = data.path().join("graph.jsonl");
    let mut server = indexed_server(vault.path(), data.path());

    let before = tool_call(&mut server, 1, "get_node", json!({ "id": "note:b-money" }));
    assert!(before["node"].is_null());

    // A new document is indexed by a separate process (second store).
    std::fs::write(vault.path().join("B-Money.md"), "An anonymous cash proposal.\n").unwrap();
    let mut other = GraphStore::open(&log).unwrap();
    index_vault(&mut other, &IndexConfig::new(vec![vault.path().to_path_buf()])).unwrap();

    // The staleness check runs per request; the server sees the new node.
    let after = tool_call(&mut server, 2, "get_node", json!({ "id": "note:b-money" }));
    assert_eq!(after["node"]["id"], "note:b-money");
}

#[test]
fn get_node_includes_incoming_and_outgoing_edges() {
    let vault = tempfile::TempDir::new().unwrap();
    let data = tempfile::TempDir::new().unwrap();
    fixture_vault(vault.path());
    let mut server = indexed_server(vault.path(), data.path());

    let payload = tool_call(&mut server, 1, "get_node", json!({ "id": "paper:hashcash" }));
    let edges = payload["edges"].as_array().unwrap();
    // Incoming mention from Adam Back's page.
    assert!(
        edges
            .iter()
            .any(|e| e["src_id"] == "person:adam-back" && e["dst_id"] == "paper:hashcash")
    );
}
