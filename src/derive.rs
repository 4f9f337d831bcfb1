//! Node derivation: turn a scanned document into a canonical [`Node`].
//!
//! Pure function of its input. Type inference runs a fixed, ordered list of
//! rules so the heuristic stays auditable and testable in isolation.

use std::path::Path;

use regex::Regex;
use std::sync::OnceLock;

use crate::model::{Node, now_epoch, slugify};
use crate::scan::{FrontMatter, ScannedDoc};

/// Fallback type when no rule matches.
pub const DEFAULT_TYPE: &str = "note";

/// Path-segment rules, checked in order: a directory named `segment`
/// anywhere in the relative path assigns `node_type`.
const PATH_RULES: &[(&str, &str)] = &[
    ("people", "person"),
    ("persons", "person"),
    ("orgs", "organization"),
    ("organizations", "organization"),
    ("papers", "paper"),
    ("projects", "project"),
    ("ideas", "idea"),
    ("notes", "note"),
];

fn id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z]+:[a-z0-9-]+$").expect("valid id pattern"))
}

/// Derive the canonical node for a scanned document.
pub fn derive_node(doc: &ScannedDoc) -> Node {
    let title = doc
        .path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled")
        .to_string();

    let node_type = infer_type(&doc.rel_path, &doc.front_matter);

    let slug = doc
        .front_matter
        .str_field("slug")
        .map(|s| s.to_string())
        .unwrap_or_else(|| slugify(&title));

    // Front-matter id wins only when it already looks like a node id.
    let id = doc
        .front_matter
        .str_field("id")
        .filter(|candidate| id_pattern().is_match(candidate))
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("{node_type}:{slug}"));

    let mut aliases = doc.front_matter.string_list("aliases");
    let mut topics = doc.front_matter.string_list("topics");
    let mut tags = doc.front_matter.string_list("tags");
    // Order-irrelevant sets: sort so structural equality survives reordering.
    aliases.sort();
    topics.sort();
    tags.sort();

    Node {
        id,
        node_type,
        slug,
        title,
        path: doc.path.display().to_string(),
        rel_path: doc.rel_path.clone(),
        aliases,
        topics,
        tags,
        updated_at: now_epoch(),
    }
}

/// Resolve the node type: explicit front matter, then path-segment rules,
/// then content rules, then [`DEFAULT_TYPE`].
pub fn infer_type(rel_path: &str, fm: &FrontMatter) -> String {
    if let Some(explicit) = fm.str_field("type") {
        return explicit.to_string();
    }

    let segments: Vec<&str> = Path::new(rel_path)
        .iter()
        .filter_map(|s| s.to_str())
        .collect();
    for (segment, node_type) in PATH_RULES {
        // The file name itself is not a directory segment.
        if segments[..segments.len().saturating_sub(1)]
            .iter()
            .any(|s| s.eq_ignore_ascii_case(segment))
        {
            return node_type.to_string();
        }
    }

    let tags = fm.string_list("tags");
    if tags.iter().any(|t| t == "person")
        || fm.contains_key("emails")
        || fm.contains_key("reminders")
    {
        return "person".to_string();
    }

    DEFAULT_TYPE.to_string()
}
