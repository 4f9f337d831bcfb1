//! Identity resolution: map free-text references to canonical node ids.
//!
//! Lookup tables are rebuilt from the full node set on every indexing pass
//! (log-known nodes plus nodes derived in the current pass), so forward
//! references within one run resolve correctly.

use std::collections::HashMap;

use crate::model::{Node, slugify};

/// Confidence for an exact slug match.
pub const CONFIDENCE_SLUG: f64 = 1.0;
/// Confidence for an alias match.
pub const CONFIDENCE_ALIAS: f64 = 0.8;
/// Confidence for a synthesized placeholder id.
pub const CONFIDENCE_PLACEHOLDER: f64 = 0.4;

/// Slug and alias lookup tables, derived (never persisted).
#[derive(Debug, Default)]
pub struct ResolverTables {
    /// Canonical slug (and title-kebab fallback) → node id.
    slug_to_id: HashMap<String, String>,
    /// Kebab-cased alias → node id.
    alias_to_id: HashMap<String, String>,
}

/// A resolved reference: target id plus resolution confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub id: String,
    pub confidence: f64,
}

impl ResolverTables {
    /// Build tables from every currently known node.
    ///
    /// Nodes are inserted in id order, so when two nodes share a kebab
    /// string the winner is the same on every run for a fixed node set; the
    /// conflict is logged so silently lost reachability is at least visible.
    pub fn build<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Self {
        let mut nodes: Vec<&Node> = nodes.into_iter().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        let mut tables = Self::default();
        for node in nodes {
            insert_keyed(&mut tables.slug_to_id, &node.slug, &node.id, "slug");
            let title_kebab = slugify(&node.title);
            if title_kebab != node.slug {
                insert_keyed(&mut tables.slug_to_id, &title_kebab, &node.id, "slug");
            }
            for alias in &node.aliases {
                let key = slugify(alias);
                if !key.is_empty() {
                    insert_keyed(&mut tables.alias_to_id, &key, &node.id, "alias");
                }
            }
        }
        tables
    }

    /// Resolve a free-text target in strict priority order:
    /// exact slug (1.0), then alias (0.8), then placeholder `note:<kebab>` (0.4).
    ///
    /// Targets with no alphanumeric content kebab to the empty string and
    /// yield `None`: there is no usable placeholder id for them.
    pub fn resolve(&self, target: &str) -> Option<Resolution> {
        let key = slugify(target);
        if key.is_empty() {
            return None;
        }
        if let Some(id) = self.slug_to_id.get(&key) {
            return Some(Resolution {
                id: id.clone(),
                confidence: CONFIDENCE_SLUG,
            });
        }
        if let Some(id) = self.alias_to_id.get(&key) {
            return Some(Resolution {
                id: id.clone(),
                confidence: CONFIDENCE_ALIAS,
            });
        }
        Some(Resolution {
            id: format!("note:{key}"),
            confidence: CONFIDENCE_PLACEHOLDER,
        })
    }
}

fn insert_keyed(table: &mut HashMap<String, String>, key: &str, id: &str, kind: &str) {
    if let Some(prev) = table.insert(key.to_string(), id.to_string()) {
        if prev != id {
            tracing::warn!(
                key,
                kind,
                kept = id,
                displaced = %prev,
                "lookup-table conflict: last writer wins"
            );
        }
    }
}
