//! Append-only JSONL graph log.
//!
//! One JSON object per line, UTF-8, appended in chronological order, never
//! reordered or rewritten in place. A partial write can only lose the last
//! unflushed record, never corrupt prior history.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::StoreError;
use crate::model::LogRecord;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Handle on the on-disk log file.
#[derive(Debug, Clone)]
pub struct GraphLog {
    path: PathBuf,
}

/// Outcome of replaying the log end-to-end.
#[derive(Debug, Default)]
pub struct Replay {
    pub records: Vec<LogRecord>,
    /// Lines that failed to parse (skipped, never fatal).
    pub malformed_lines: usize,
}

impl GraphLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Modification time of the log file, if it exists.
    pub fn mtime(&self) -> Option<SystemTime> {
        std::fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .ok()
    }

    /// Replay every line of the log in order. A missing file is an empty
    /// log; malformed lines are counted and skipped.
    pub fn replay(&self) -> StoreResult<Replay> {
        let mut replay = Replay::default();
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(r) => r,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(replay),
            Err(e) => {
                return Err(StoreError::Io {
                    path: self.path.display().to_string(),
                    source: e,
                });
            }
        };

        for (lineno, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<LogRecord>(line) {
                Ok(record) => replay.records.push(record),
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        line = lineno + 1,
                        error = %e,
                        "skipping malformed log line"
                    );
                    replay.malformed_lines += 1;
                }
            }
        }
        Ok(replay)
    }

    /// Append one record as a single complete line.
    pub fn append(&self, record: &LogRecord) -> StoreResult<()> {
        let json = serde_json::to_string(record).map_err(|e| StoreError::Serialize {
            message: e.to_string(),
        })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                    path: parent.display().to_string(),
                    source: e,
                })?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::Io {
                path: self.path.display().to_string(),
                source: e,
            })?;

        // One write_all per record keeps the line atomic for a single writer.
        let mut line = json.into_bytes();
        line.push(b'\n');
        file.write_all(&line).map_err(|e| StoreError::Io {
            path: self.path.display().to_string(),
            source: e,
        })
    }

    /// Number of lines currently in the log (test and report helper).
    pub fn line_count(&self) -> usize {
        std::fs::read_to_string(&self.path)
            .map(|s| s.lines().filter(|l| !l.trim().is_empty()).count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, EdgeSource, LogRecord};

    fn edge(dst: &str) -> LogRecord {
        LogRecord::Edge(Edge {
            src_id: "note:a".into(),
            dst_id: dst.into(),
            rel_type: "mentions".into(),
            confidence: 1.0,
            source: EdgeSource::Wikilink,
        })
    }

    #[test]
    fn missing_log_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let log = GraphLog::new(dir.path().join("graph.jsonl"));
        let replay = log.replay().unwrap();
        assert!(replay.records.is_empty());
        assert_eq!(replay.malformed_lines, 0);
    }

    #[test]
    fn append_then_replay_in_order() {
        let dir = tempfile::TempDir::new().unwrap();
        let log = GraphLog::new(dir.path().join("graph.jsonl"));
        log.append(&edge("note:b")).unwrap();
        log.append(&edge("note:c")).unwrap();

        let replay = log.replay().unwrap();
        assert_eq!(replay.records.len(), 2);
        match &replay.records[1] {
            LogRecord::Edge(e) => assert_eq!(e.dst_id, "note:c"),
            _ => panic!("expected edge"),
        }
    }

    #[test]
    fn malformed_lines_are_skipped_and_counted() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("graph.jsonl");
        let log = GraphLog::new(&path);
        log.append(&edge("note:b")).unwrap();
        std::fs::write(
            &path,
            format!("{}\nnot json at all\n", std::fs::read_to_string(&path).unwrap().trim_end()),
        )
        .unwrap();
        log.append(&edge("note:c")).unwrap();

        let replay = log.replay().unwrap();
        assert_eq!(replay.records.len(), 2);
        assert_eq!(replay.malformed_lines, 1);
    }

    #[test]
    fn mtime_appears_after_first_append() {
        let dir = tempfile::TempDir::new().unwrap();
        let log = GraphLog::new(dir.path().join("graph.jsonl"));
        assert!(log.mtime().is_none());
        log.append(&edge("note:b")).unwrap();
        assert!(log.mtime().is_some());
    }
}
