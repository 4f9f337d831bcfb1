//! Document scanner: enumerate vault Markdown files and split front matter.
//!
//! Scanning is deterministic (paths sorted) and duplicate-free across
//! overlapping roots. Unreadable or unparsable files are skipped with a
//! warning, never fatal to the run.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde_json::Value;
use walkdir::WalkDir;

use crate::error::ScanError;

/// Result type for scan operations.
pub type ScanResult<T> = std::result::Result<T, ScanError>;

/// Directory names excluded from scanning by default.
pub const DEFAULT_EXCLUDES: &[&str] = &[".git", ".obsidian", "data", "logs", "node_modules"];

/// Parsed front matter: a flat or nested key-value map.
///
/// Wraps the raw YAML-as-JSON map behind normalizing accessors so the rest
/// of the system never sees source format variance (scalar vs. list vs.
/// nested object for the same logical field).
#[derive(Debug, Clone, Default)]
pub struct FrontMatter(BTreeMap<String, Value>);

impl FrontMatter {
    pub fn new(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// A single string field; non-strings and empty strings yield `None`.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim()),
            _ => None,
        }
    }

    /// A string-sequence field, tolerating a lone scalar. Non-string
    /// elements are dropped; missing or malformed fields yield an empty
    /// sequence. The result is deduplicated with original order kept.
    pub fn string_list(&self, key: &str) -> Vec<String> {
        let values = match self.0.get(key) {
            Some(Value::Array(items)) => items.clone(),
            Some(v @ Value::String(_)) => vec![v.clone()],
            _ => return Vec::new(),
        };
        let mut seen = BTreeSet::new();
        values
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                _ => None,
            })
            .filter(|s| seen.insert(s.clone()))
            .collect()
    }

    /// The `relations` map: rel_type → values, each value list normalized
    /// through the same scalar-or-list rule.
    pub fn relations(&self) -> Vec<(String, Vec<String>)> {
        let Some(Value::Object(map)) = self.0.get("relations") else {
            return Vec::new();
        };
        map.iter()
            .map(|(rel, v)| {
                let values = match v {
                    Value::Array(items) => items
                        .iter()
                        .filter_map(|i| i.as_str())
                        .map(|s| s.to_string())
                        .collect(),
                    Value::String(s) => vec![s.clone()],
                    _ => Vec::new(),
                };
                (rel.clone(), values)
            })
            .collect()
    }
}

/// One scanned vault document, front matter already split from the body.
#[derive(Debug, Clone)]
pub struct ScannedDoc {
    pub path: PathBuf,
    pub rel_path: String,
    /// `None` when the document has no front-matter block; `Some` even when
    /// the block failed to parse (then `front_matter` is empty and
    /// `front_matter_ok` is false).
    pub front_matter: FrontMatter,
    pub front_matter_ok: bool,
    pub body: String,
}

/// Outcome of scanning one or more vault roots.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub docs: Vec<ScannedDoc>,
    /// Files that could not be read.
    pub read_errors: usize,
    /// Documents whose front-matter block failed to parse.
    pub parse_errors: usize,
}

/// Enumerate Markdown documents under the given roots.
///
/// Roots may overlap; each file appears at most once. `excludes` names
/// directories (at any depth) that are skipped entirely.
pub fn scan_vault(roots: &[PathBuf], excludes: &[String]) -> ScanResult<ScanOutcome> {
    for root in roots {
        if !root.exists() {
            return Err(ScanError::MissingRoot {
                path: root.display().to_string(),
            });
        }
    }

    let mut seen = BTreeSet::new();
    let mut outcome = ScanOutcome::default();

    for root in roots {
        for entry in WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            // The root itself is exempt: a vault directory may legally share
            // a name with an excluded directory.
            .filter_entry(|e| e.depth() == 0 || !is_excluded(e.path(), excludes))
        {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable directory entry");
                    outcome.read_errors += 1;
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_markdown(entry.path()) {
                continue;
            }
            let canonical = entry
                .path()
                .canonicalize()
                .unwrap_or_else(|_| entry.path().to_path_buf());
            if !seen.insert(canonical.clone()) {
                continue;
            }

            let raw = match std::fs::read_to_string(entry.path()) {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(path = %entry.path().display(), error = %e, "skipping unreadable file");
                    outcome.read_errors += 1;
                    continue;
                }
            };

            let rel_path = entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .display()
                .to_string();

            let (front_matter, front_matter_ok, body) = split_front_matter(&raw);
            if !front_matter_ok {
                tracing::warn!(path = %entry.path().display(), "front matter failed to parse");
                outcome.parse_errors += 1;
            }
            outcome.docs.push(ScannedDoc {
                path: canonical,
                rel_path,
                front_matter,
                front_matter_ok,
                body,
            });
        }
    }

    // Deterministic ordering regardless of filesystem iteration order.
    outcome.docs.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(outcome)
}

fn is_markdown(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("md") | Some("markdown")
    )
}

fn is_excluded(path: &Path, excludes: &[String]) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    excludes.iter().any(|ex| ex == name)
}

/// Split a raw document into (front matter, parse-ok, body).
///
/// The front-matter block is a leading `---` fence (BOM tolerated) closed
/// by `---` or `...`. Documents without a fence get an empty map and an
/// untouched body.
pub fn split_front_matter(raw: &str) -> (FrontMatter, bool, String) {
    let stripped = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut lines = stripped.lines();

    if lines.next().map(|l| l.trim_end()) != Some("---") {
        return (FrontMatter::default(), true, stripped.to_string());
    }

    let mut yaml_lines: Vec<&str> = Vec::new();
    let mut body_lines: Vec<&str> = Vec::new();
    let mut in_body = false;
    for line in lines {
        if in_body {
            body_lines.push(line);
        } else if line.trim_end() == "---" || line.trim_end() == "..." {
            in_body = true;
        } else {
            yaml_lines.push(line);
        }
    }
    if !in_body {
        // Unterminated fence: treat the whole document as body.
        return (FrontMatter::default(), true, stripped.to_string());
    }

    let body = body_lines.join("\n");
    let raw_yaml = yaml_lines.join("\n");
    if raw_yaml.trim().is_empty() {
        return (FrontMatter::default(), true, body);
    }

    match serde_yaml::from_str::<serde_yaml::Value>(&raw_yaml)
        .ok()
        .and_then(|y| serde_json::to_value(y).ok())
    {
        Some(Value::Object(map)) => (
            FrontMatter::new(map.into_iter().collect()),
            true,
            body,
        ),
        _ => (FrontMatter::default(), false, body),
    }
}
