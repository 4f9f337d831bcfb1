//! Vocabulary normalization and validation for vault front matter.
//!
//! Maintains the canonical set of type and tag values, rewrites deprecated
//! synonyms, and reports (or fails) on drift. Normalization is an offline
//! batch pass over source documents; it never touches the graph store —
//! future indexing runs pick the changes up.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::VocabError;
use crate::scan::{ScannedDoc, scan_vault, split_front_matter};

/// Result type for vocabulary operations.
pub type VocabResult<T> = std::result::Result<T, VocabError>;

/// Type synonym → canonical type.
const TYPE_SYNONYMS: &[(&str, &str)] = &[
    ("humans", "person"),
    ("people", "person"),
    ("person-page", "person"),
    ("company", "organization"),
    ("org", "organization"),
    ("orgs", "organization"),
    ("notes", "note"),
    ("papers", "paper"),
    ("ideas", "idea"),
];

/// Tag synonym → canonical tag.
const TAG_SYNONYMS: &[(&str, &str)] = &[
    ("people", "person"),
    ("humans", "person"),
    ("orgs", "organization"),
    ("company", "organization"),
];

/// Tags that must no longer appear anywhere, front matter or inline.
const DEPRECATED_TAGS: &[&str] = &["people", "orgs", "humans", "company"];

fn hashtag_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|\s)#([A-Za-z][A-Za-z0-9_-]*)").expect("valid pattern"))
}

pub fn canonical_type(value: &str) -> &str {
    TYPE_SYNONYMS
        .iter()
        .find(|(syn, _)| *syn == value)
        .map(|(_, canon)| *canon)
        .unwrap_or(value)
}

pub fn canonical_tag(value: &str) -> &str {
    TAG_SYNONYMS
        .iter()
        .find(|(syn, _)| *syn == value)
        .map(|(_, canon)| *canon)
        .unwrap_or(value)
}

pub fn is_deprecated_tag(value: &str) -> bool {
    DEPRECATED_TAGS.contains(&value)
}

/// Canonicalize a tag list, deduplicating while keeping first-seen order.
fn canonical_tag_list(tags: &[String]) -> Vec<String> {
    let mut seen = std::collections::BTreeSet::new();
    tags.iter()
        .map(|t| canonical_tag(t).to_string())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// Normalize
// ---------------------------------------------------------------------------

/// One planned (or applied) front-matter rewrite.
#[derive(Debug, Clone)]
pub struct PlannedChange {
    pub path: PathBuf,
    pub field: String,
    pub from: String,
    pub to: String,
}

/// Outcome of a normalization pass.
#[derive(Debug, Default)]
pub struct NormalizeReport {
    pub scanned: usize,
    pub changes: Vec<PlannedChange>,
    pub applied: bool,
    /// Documents skipped because their front matter failed to parse.
    pub errors: usize,
}

/// Recompute canonical `type` and `tags` for every document; report the
/// diff, and rewrite files when `apply` is set.
pub fn normalize(roots: &[PathBuf], excludes: &[String], apply: bool) -> VocabResult<NormalizeReport> {
    let outcome = scan_vault(roots, excludes)?;
    let mut report = NormalizeReport {
        scanned: outcome.docs.len(),
        applied: apply,
        errors: outcome.parse_errors,
        ..Default::default()
    };

    for doc in &outcome.docs {
        if !doc.front_matter_ok {
            continue;
        }
        let changes = plan_changes(doc);
        if changes.is_empty() {
            continue;
        }
        if apply {
            rewrite_front_matter(doc, &changes)?;
            tracing::info!(path = %doc.path.display(), changes = changes.len(), "front matter normalized");
        }
        report.changes.extend(changes);
    }
    Ok(report)
}

/// Diff one document's front matter against the canonical vocabulary.
fn plan_changes(doc: &ScannedDoc) -> Vec<PlannedChange> {
    let mut changes = Vec::new();

    if let Some(current) = doc.front_matter.str_field("type") {
        let canon = canonical_type(current);
        if canon != current {
            changes.push(PlannedChange {
                path: doc.path.clone(),
                field: "type".into(),
                from: current.to_string(),
                to: canon.to_string(),
            });
        }
    }

    let tags = doc.front_matter.string_list("tags");
    if !tags.is_empty() {
        let canon = canonical_tag_list(&tags);
        if canon != tags {
            changes.push(PlannedChange {
                path: doc.path.clone(),
                field: "tags".into(),
                from: tags.join(", "),
                to: canon.join(", "),
            });
        }
    }

    changes
}

/// Rewrite only the changed front-matter lines, leaving the body and all
/// other front-matter lines byte-identical.
fn rewrite_front_matter(doc: &ScannedDoc, changes: &[PlannedChange]) -> VocabResult<()> {
    let raw = std::fs::read_to_string(&doc.path).map_err(|e| VocabError::Rewrite {
        path: doc.path.display().to_string(),
        source: e,
    })?;

    let mut updated = raw.clone();
    for change in changes {
        match change.field.as_str() {
            "type" => {
                updated = rewrite_type(&updated, &change.to);
            }
            "tags" => {
                updated = rewrite_tags(&updated);
            }
            _ => {}
        }
    }

    if updated != raw {
        std::fs::write(&doc.path, updated).map_err(|e| VocabError::Rewrite {
            path: doc.path.display().to_string(),
            source: e,
        })?;
    }
    Ok(())
}

/// Replace the first front-matter line whose key is `type` with the
/// canonical value, re-emitting the field unquoted. Only whole lines inside
/// the fence are candidates, so keys that merely end in `type` (such as
/// `subtype`) and body text are never touched.
fn rewrite_type(raw: &str, to: &str) -> String {
    let stripped = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut out: Vec<String> = Vec::new();
    let mut in_fence = false;
    let mut done = false;
    for line in stripped.lines() {
        if !done {
            let trimmed = line.trim_end();
            if out.is_empty() && trimmed == "---" {
                in_fence = true;
                out.push(line.to_string());
                continue;
            }
            if in_fence {
                if trimmed == "---" || trimmed == "..." {
                    done = true;
                } else if trimmed.trim_start().starts_with("type:") {
                    out.push(format!("type: {to}"));
                    done = true;
                    continue;
                }
            }
        }
        out.push(line.to_string());
    }
    let mut rebuilt = out.join("\n");
    if stripped.ends_with('\n') {
        rebuilt.push('\n');
    }
    rebuilt
}

/// Replace the document's front-matter `tags` entry with its canonical
/// form, re-emitting the field as a flow-style list.
fn rewrite_tags(raw: &str) -> String {
    let (fm, ok, _body) = split_front_matter(raw);
    if !ok {
        return raw.to_string();
    }
    let canon = canonical_tag_list(&fm.string_list("tags"));
    let rendered = format!("tags: [{}]", canon.join(", "));

    // Reconstruct the fence with the tags field swapped out. Block-style
    // tag lists collapse to the flow form; every other line is untouched.
    let stripped = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut out: Vec<String> = Vec::new();
    let mut in_fence = false;
    let mut in_tags_block = false;
    let mut done = false;
    for line in stripped.lines() {
        if !done {
            let trimmed = line.trim_end();
            if out.is_empty() && trimmed == "---" {
                in_fence = true;
                out.push(line.to_string());
                continue;
            }
            if in_fence {
                if trimmed == "---" || trimmed == "..." {
                    in_fence = false;
                    done = true;
                    out.push(line.to_string());
                    continue;
                }
                if in_tags_block {
                    if line.trim_start().starts_with('-') {
                        continue; // swallow old block entries
                    }
                    in_tags_block = false;
                }
                if trimmed.starts_with("tags:") {
                    in_tags_block = trimmed == "tags:";
                    out.push(rendered.clone());
                    continue;
                }
            }
        }
        out.push(line.to_string());
    }
    let mut rebuilt = out.join("\n");
    if stripped.ends_with('\n') {
        rebuilt.push('\n');
    }
    rebuilt
}

// ---------------------------------------------------------------------------
// Validate
// ---------------------------------------------------------------------------

/// One deprecated-tag occurrence.
#[derive(Debug, Clone)]
pub struct Violation {
    pub path: PathBuf,
    /// 1-based line number, 0 for front-matter fields.
    pub line: usize,
    pub tag: String,
    pub context: String,
}

/// Outcome of a validation pass.
#[derive(Debug, Default)]
pub struct ValidateReport {
    pub scanned: usize,
    pub violations: Vec<Violation>,
    pub errors: usize,
}

impl ValidateReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Scan every document for deprecated tags, front matter and inline.
pub fn validate(roots: &[PathBuf], excludes: &[String]) -> VocabResult<ValidateReport> {
    let outcome = scan_vault(roots, excludes)?;
    let mut report = ValidateReport {
        scanned: outcome.docs.len(),
        errors: outcome.parse_errors,
        ..Default::default()
    };

    for doc in &outcome.docs {
        for tag in doc.front_matter.string_list("tags") {
            let tag = tag.to_lowercase();
            if is_deprecated_tag(&tag) {
                report.violations.push(Violation {
                    path: doc.path.clone(),
                    line: 0,
                    tag,
                    context: "front matter".into(),
                });
            }
        }
        for (idx, line) in doc.body.lines().enumerate() {
            for cap in hashtag_pattern().captures_iter(line) {
                let tag = cap[1].to_lowercase();
                if is_deprecated_tag(&tag) {
                    report.violations.push(Violation {
                        path: doc.path.clone(),
                        line: idx + 1,
                        tag,
                        context: line.trim().to_string(),
                    });
                }
            }
        }
    }
    Ok(report)
}

// ---------------------------------------------------------------------------
// Markdown reports
// ---------------------------------------------------------------------------

/// Write a normalization report as Markdown.
pub fn write_normalize_report(report: &NormalizeReport, path: &Path) -> VocabResult<()> {
    let mut out = String::from("# Vocabulary normalization report\n\n");
    out.push_str(&format!(
        "- Documents scanned: {}\n- Planned changes: {}\n- Parse errors: {}\n- Mode: {}\n\n",
        report.scanned,
        report.changes.len(),
        report.errors,
        if report.applied { "applied" } else { "dry-run" },
    ));
    if !report.changes.is_empty() {
        out.push_str("| File | Field | From | To |\n|---|---|---|---|\n");
        for c in &report.changes {
            out.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                c.path.display(),
                c.field,
                c.from,
                c.to
            ));
        }
    }
    std::fs::write(path, out).map_err(|e| VocabError::Report {
        path: path.display().to_string(),
        source: e,
    })
}

/// Write a validation report as Markdown.
pub fn write_validate_report(report: &ValidateReport, path: &Path) -> VocabResult<()> {
    let mut out = String::from("# Vocabulary validation report\n\n");
    out.push_str(&format!(
        "- Documents scanned: {}\n- Violations: {}\n- Parse errors: {}\n\n",
        report.scanned,
        report.violations.len(),
        report.errors,
    ));
    if !report.violations.is_empty() {
        out.push_str("| File | Line | Tag | Context |\n|---|---|---|---|\n");
        for v in &report.violations {
            out.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                v.path.display(),
                if v.line == 0 {
                    "front matter".to_string()
                } else {
                    v.line.to_string()
                },
                v.tag,
                v.context
            ));
        }
    }
    std::fs::write(path, out).map_err(|e| VocabError::Report {
        path: path.display().to_string(),
        source: e,
    })
}
