//! # vaultgraph
//!
//! A lightweight entity-relationship graph extracted from a Markdown vault.
//! Each document becomes a node (person, organization, note, idea, paper, …);
//! front-matter relations and in-body `[[wikilinks]]` become edges. The graph
//! is persisted as an append-only JSONL log and served over a line-delimited
//! JSON-RPC interface.
//!
//! ## Architecture
//!
//! - **Scanner** (`scan`): vault enumeration and front-matter splitting
//! - **Deriver** (`derive`): canonical node identity from path + front matter
//! - **Extractor/Resolver** (`extract`, `resolve`): edges with confidence
//!   tie-breaks (slug 1.0 → alias 0.8 → placeholder 0.4)
//! - **Store** (`store`): append-only log materialized into in-memory indices
//! - **Server** (`server`): `initialize` / `tools/list` / `tools/call` over stdio
//! - **Vocabulary** (`vocab`): canonical type/tag normalization and CI gate
//!
//! ## Library usage
//!
//! ```no_run
//! use vaultgraph::indexer::{index_vault, IndexConfig};
//! use vaultgraph::store::GraphStore;
//!
//! let mut store = GraphStore::open("graph.jsonl").unwrap();
//! let config = IndexConfig::new(vec!["vault".into()]);
//! let report = index_vault(&mut store, &config).unwrap();
//! println!("{report}");
//! ```

pub mod derive;
pub mod error;
pub mod extract;
pub mod indexer;
pub mod model;
pub mod resolve;
pub mod scan;
pub mod server;
pub mod store;
pub mod vocab;
