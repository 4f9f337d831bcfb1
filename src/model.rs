//! Core data model: nodes, edges, and append-only log records.
//!
//! A [`Node`] is the canonical record for one vault document; an [`Edge`] is a
//! directed, typed, confidence-scored relation between two node ids. Both are
//! persisted as [`LogRecord`] lines in the append-only graph log.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Canonical record for one vault document.
///
/// The four identity fields (`id`, `node_type`, `slug`, `title`) are always
/// non-empty once derived. `id` has the form `"<type>:<slug>"` and is the one
/// true unique key; `path`/`rel_path` locate the source file but are not part
/// of identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub slug: String,
    pub title: String,
    pub path: String,
    pub rel_path: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Epoch seconds of the last (re)derivation.
    #[serde(default)]
    pub updated_at: u64,
}

impl Node {
    /// Structural equality for upsert-if-changed.
    ///
    /// `updated_at` is deliberately excluded so that re-scanning an unchanged
    /// document compares equal and appends nothing.
    pub fn same_content(&self, other: &Node) -> bool {
        self.id == other.id
            && self.node_type == other.node_type
            && self.slug == other.slug
            && self.title == other.title
            && self.path == other.path
            && self.rel_path == other.rel_path
            && self.aliases == other.aliases
            && self.topics == other.topics
            && self.tags == other.tags
    }
}

/// Provenance of an edge: where the relation was asserted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EdgeSource {
    /// Typed relation from a front-matter `relations` map.
    FrontMatter,
    /// `[[wikilink]]` found in the document body.
    Wikilink,
    /// Inserted through the server's `add_relation` tool.
    Manual { note: Option<String> },
}

impl EdgeSource {
    /// Wire/provenance tag: `frontmatter`, `wikilink`, `manual`, `manual:<note>`.
    pub fn tag(&self) -> String {
        match self {
            EdgeSource::FrontMatter => "frontmatter".to_string(),
            EdgeSource::Wikilink => "wikilink".to_string(),
            EdgeSource::Manual { note: None } => "manual".to_string(),
            EdgeSource::Manual { note: Some(n) } => format!("manual:{n}"),
        }
    }

    /// Parse a provenance tag back from the log.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "frontmatter" => EdgeSource::FrontMatter,
            "wikilink" => EdgeSource::Wikilink,
            "manual" => EdgeSource::Manual { note: None },
            other => match other.strip_prefix("manual:") {
                Some(note) => EdgeSource::Manual {
                    note: Some(note.to_string()),
                },
                // Unknown tags survive round trips as manual annotations.
                None => EdgeSource::Manual {
                    note: Some(other.to_string()),
                },
            },
        }
    }
}

impl Serialize for EdgeSource {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.tag())
    }
}

impl<'de> Deserialize<'de> for EdgeSource {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(EdgeSource::from_tag(&tag))
    }
}

/// Directed, typed relation between two node ids.
///
/// `dst_id` may reference a node not yet present in the graph (forward
/// reference); this is legal and expected. Self-edges are legal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub src_id: String,
    pub dst_id: String,
    pub rel_type: String,
    /// Confidence in (0, 1] that `dst_id` is the intended target.
    pub confidence: f64,
    pub source: EdgeSource,
}

impl Edge {
    /// Composite dedup key: an edge is unique by (src, dst, rel, source).
    pub fn key(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.src_id,
            self.dst_id,
            self.rel_type,
            self.source.tag()
        )
    }
}

/// One line of the append-only graph log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum LogRecord {
    Node(Node),
    Edge(Edge),
}

/// Kebab-case a title or free-text reference: lowercase, non-alphanumeric
/// runs collapsed to single hyphens, leading/trailing hyphens trimmed.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Current time as epoch seconds.
pub fn now_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
