use crate::error::InvalidArgument;
use crate::pattern::{is_excluded, MatchPattern};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::SystemTime;
use tracing::warn;
use walkdir::WalkDir;

/// Ordering of matches within one directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Name,
    Mtime,
    Ctime,
}

impl FromStr for SortKey {
    type Err = InvalidArgument;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "mtime" => Ok(Self::Mtime),
            "ctime" => Ok(Self::Ctime),
            other => Err(InvalidArgument::SortKey(other.to_string())),
        }
    }
}

/// Restrict matches to files or directories
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntryFilter {
    #[default]
    Any,
    FilesOnly,
    DirsOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Other,
}

#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub recursive: bool,
    pub filter: EntryFilter,
    pub excludes: Vec<String>,
    pub sort: Option<SortKey>,
}

/// A directory entry selected for renaming
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub path: PathBuf,
    pub dir: PathBuf,
    pub name: String,
    pub kind: EntryKind,
    /// Depth below the scanned root, 1 for direct children
    pub depth: usize,
}

/// Select matching entries under `root`.
///
/// Directories are visited top-down. All matches of one directory are
/// emitted together, in `sort` order or in listing order without one.
pub fn scan_root(root: &Path, pattern: &MatchPattern, options: &ScanOptions) -> Result<Vec<Candidate>> {
    let max_depth = if options.recursive { usize::MAX } else { 0 };
    let mut candidates = Vec::new();

    for entry in WalkDir::new(root).max_depth(max_depth).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {e}");
                continue;
            },
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        candidates.extend(scan_dir(entry.path(), entry.depth() + 1, pattern, options)?);
    }

    Ok(candidates)
}

fn scan_dir(
    dir: &Path,
    depth: usize,
    pattern: &MatchPattern,
    options: &ScanOptions,
) -> Result<Vec<Candidate>> {
    let mut found = Vec::new();

    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to list directory: {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list directory: {}", dir.display()))?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            warn!(
                "Skipping '{}': name is not valid UTF-8",
                entry.path().display()
            );
            continue;
        };

        let path = entry.path();
        let kind = entry_kind(&path);
        let keep = match options.filter {
            EntryFilter::Any => true,
            EntryFilter::FilesOnly => kind == EntryKind::File,
            EntryFilter::DirsOnly => kind == EntryKind::Dir,
        };
        if !keep || is_excluded(&name, &options.excludes) || !pattern.is_match(&name) {
            continue;
        }

        found.push(Candidate {
            path,
            dir: dir.to_path_buf(),
            name,
            kind,
            depth,
        });
    }

    if let Some(key) = options.sort {
        sort_candidates(&mut found, key);
    }
    Ok(found)
}

/// Kind as seen through symlinks; dangling links are `Other`
fn entry_kind(path: &Path) -> EntryKind {
    match fs::metadata(path) {
        Ok(m) if m.is_dir() => EntryKind::Dir,
        Ok(m) if m.is_file() => EntryKind::File,
        _ => EntryKind::Other,
    }
}

pub fn sort_candidates(candidates: &mut [Candidate], key: SortKey) {
    match key {
        SortKey::Name => candidates.sort_by(|a, b| a.name.cmp(&b.name)),
        SortKey::Mtime => candidates.sort_by(|a, b| compare_times(modified(&a.path), modified(&b.path), a, b)),
        SortKey::Ctime => candidates.sort_by(|a, b| compare_times(created(&a.path), created(&b.path), a, b)),
    }
}

fn compare_times(
    left: Option<SystemTime>,
    right: Option<SystemTime>,
    a: &Candidate,
    b: &Candidate,
) -> Ordering {
    left.cmp(&right).then_with(|| a.name.cmp(&b.name))
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::symlink_metadata(path).and_then(|m| m.modified()).ok()
}

/// Creation time where the platform records it, modification time otherwise
fn created(path: &Path) -> Option<SystemTime> {
    let metadata = fs::symlink_metadata(path).ok()?;
    metadata.created().or_else(|_| metadata.modified()).ok()
}
