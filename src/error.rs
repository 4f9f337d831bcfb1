//! Rich diagnostic error types for vaultgraph.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so users know exactly what
//! went wrong and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for vaultgraph.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, source spans) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum VaultError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Server(#[from] ServerError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Vocab(#[from] VocabError),
}

// ---------------------------------------------------------------------------
// Scan errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ScanError {
    #[error("vault root does not exist: {path}")]
    #[diagnostic(
        code(vaultgraph::scan::missing_root),
        help(
            "Check the vault path. Pass it explicitly with `--vault <DIR>` \
             or run from inside the vault directory."
        )
    )]
    MissingRoot { path: String },

    #[error("failed to read {path}: {source}")]
    #[diagnostic(
        code(vaultgraph::scan::io),
        help(
            "The file exists but could not be read. Check permissions and \
             that the file is valid UTF-8."
        )
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("I/O error on graph log {path}: {source}")]
    #[diagnostic(
        code(vaultgraph::store::io),
        help(
            "A filesystem operation on the append-only log failed. Check that \
             the data directory exists, has correct permissions, and that the \
             disk is not full."
        )
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize log record: {message}")]
    #[diagnostic(
        code(vaultgraph::store::serialize),
        help(
            "A node or edge record could not be encoded as JSON. This is a bug \
             in the record being appended, not in the log on disk."
        )
    )]
    Serialize { message: String },
}

// ---------------------------------------------------------------------------
// Server errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ServerError {
    #[error("failed to read request stream: {source}")]
    #[diagnostic(
        code(vaultgraph::server::read),
        help("The incoming byte stream closed abnormally or is not valid UTF-8.")
    )]
    Read {
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write response: {source}")]
    #[diagnostic(
        code(vaultgraph::server::write),
        help("The outgoing byte stream was closed by the peer.")
    )]
    Write {
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// Vocabulary errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum VocabError {
    #[error("failed to rewrite {path}: {source}")]
    #[diagnostic(
        code(vaultgraph::vocab::rewrite),
        help(
            "The document could not be rewritten in place. Check write \
             permissions on the file and its directory."
        )
    )]
    Rewrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write report to {path}: {source}")]
    #[diagnostic(
        code(vaultgraph::vocab::report),
        help("Check that the report path's parent directory exists and is writable.")
    )]
    Report {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{count} deprecated tag(s) found in vault")]
    #[diagnostic(
        code(vaultgraph::vocab::deprecated_tags),
        help(
            "Deprecated tags must be migrated to their canonical forms before \
             this check passes. See the generated report for every occurrence, \
             or run `vaultgraph normalize --apply` to fix front matter."
        )
    )]
    DeprecatedTags { count: usize },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Scan(#[from] ScanError),
}

/// Convenience alias for functions returning vaultgraph results.
pub type VaultResult<T> = std::result::Result<T, VaultError>;
