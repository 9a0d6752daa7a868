//! Validation errors for rename and rollback requests.
//!
//! These are the failures reported as `Invalid argument: ...`. I/O failures
//! travel as `anyhow::Error` with context instead.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidArgument {
    #[error("Cannot specify both --file-only and --dir-only")]
    FileAndDirOnly,

    #[error("At least one action (delete, replace, append, prepend, attr) must be specified")]
    NoAction,

    #[error("Random string length must be positive")]
    RandomLength,

    #[error("Match pattern must be in the format 'type:pattern'")]
    MatchFormat(String),

    #[error("Invalid match type: {0}")]
    MatchType(String),

    #[error("Invalid regular expression '{pattern}': {message}")]
    Regex { pattern: String, message: String },

    #[error("Rollback cannot be combined with other operations")]
    RollbackCombined,

    #[error("Unsupported archive format. Use .zip, .gz, or .tar")]
    ArchiveFormat(PathBuf),

    #[error("Specified path does not exist: {}", .0.display())]
    PathMissing(PathBuf),

    #[error("Invalid attribute '{0}': use r, w, x or h, optionally prefixed with '-'")]
    Attribute(String),

    #[error("Invalid date format '{0}'")]
    DateFormat(String),

    #[error("Invalid sort key '{0}': use name, mtime or ctime")]
    SortKey(String),
}

/// The process lacks read, write or traverse access to a root
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Insufficient permissions to access '{}'", .0.display())]
pub struct PermissionDenied(pub PathBuf);
