//! Reference extraction: outgoing edges from one document.
//!
//! Two sources, concatenated: typed relations in front matter, and
//! `[[wikilink]]` tokens in the body. Self-links are kept; consumers must
//! tolerate self-references.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::{Edge, EdgeSource};
use crate::resolve::ResolverTables;
use crate::scan::FrontMatter;

/// Relation type assigned to every wikilink edge.
pub const WIKILINK_REL: &str = "mentions";

fn wikilink_pattern() -> &'static Regex {
    // [[target]], [[target#section]], [[target|alias]] — section and alias
    // parts are ignored for resolution.
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\[([^\[\]#|]+)(?:[#|][^\[\]]*)?\]\]").expect("valid pattern"))
}

/// Extract edges asserted in a front-matter `relations` map.
///
/// Only values that already look like node ids (contain a `:`) become
/// edges; anything else is an annotation, not a reference.
pub fn frontmatter_edges(src_id: &str, fm: &FrontMatter) -> Vec<Edge> {
    let mut edges = Vec::new();
    for (rel_type, values) in fm.relations() {
        for value in values {
            let value = value.trim();
            if value.contains(':') {
                edges.push(Edge {
                    src_id: src_id.to_string(),
                    dst_id: value.to_string(),
                    rel_type: rel_type.clone(),
                    confidence: 1.0,
                    source: EdgeSource::FrontMatter,
                });
            }
        }
    }
    edges
}

/// Extract `mentions` edges from body wikilinks, resolving each target
/// through the resolver tables.
pub fn wikilink_edges(src_id: &str, body: &str, tables: &ResolverTables) -> Vec<Edge> {
    wikilink_pattern()
        .captures_iter(body)
        .filter_map(|cap| {
            let target = cap.get(1)?.as_str().trim();
            let resolution = tables.resolve(target)?;
            Some(Edge {
                src_id: src_id.to_string(),
                dst_id: resolution.id,
                rel_type: WIKILINK_REL.to_string(),
                confidence: resolution.confidence,
                source: EdgeSource::Wikilink,
            })
        })
        .collect()
}

/// All outgoing edges for one document: front-matter relations first,
/// then body wikilinks.
pub fn extract_edges(
    src_id: &str,
    fm: &FrontMatter,
    body: &str,
    tables: &ResolverTables,
) -> Vec<Edge> {
    let mut edges = frontmatter_edges(src_id, fm);
    edges.extend(wikilink_edges(src_id, body, tables));
    edges
}
