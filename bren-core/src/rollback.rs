use crate::output::{FailedItem, RollbackResult};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// One completed rename
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameRecord {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Log of the renames performed under one root, in the order they happened
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackLog {
    pub created_at: String,
    pub root: PathBuf,
    pub entries: Vec<RenameRecord>,
}

impl RollbackLog {
    pub fn new(root: &Path) -> Self {
        Self {
            created_at: Local::now().to_rfc3339(),
            root: root.to_path_buf(),
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, from: PathBuf, to: PathBuf) {
        self.entries.push(RenameRecord { from, to });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load a log. Plain `old,new` lines are accepted as well.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read rollback log: {}", path.display()))?;

        if let Ok(log) = serde_json::from_str::<Self>(&content) {
            return Ok(log);
        }

        let mut entries = Vec::new();
        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut parts = line.split(',');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(from), Some(to), None) => entries.push(RenameRecord {
                    from: PathBuf::from(from),
                    to: PathBuf::from(to),
                }),
                _ => {
                    return Err(anyhow!(
                        "Failed to parse rollback log {} at line {}",
                        path.display(),
                        number + 1
                    ))
                },
            }
        }

        Ok(Self {
            created_at: String::new(),
            root: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            entries,
        })
    }

    /// Write the log through a temporary file and a rename
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to serialize rollback log")?;

        let temp_path = path.with_extension("tmp");
        {
            let mut file = fs::File::create(&temp_path)
                .with_context(|| format!("Failed to create temporary file {}", temp_path.display()))?;
            file.write_all(content.as_bytes())
                .context("Failed to write rollback log")?;
            file.sync_all().context("Failed to sync rollback log")?;
        }

        fs::rename(&temp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                path.display()
            )
        })
    }
}

/// `<root name>_ren_<YYYYmmdd_HHMMSSmmm>.log`
pub fn log_file_name(root: &Path, now: DateTime<Local>) -> String {
    let root_name = root
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .or_else(|| root.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "root".to_string());

    format!(
        "{}_ren_{}{:03}.log",
        root_name,
        now.format("%Y%m%d_%H%M%S"),
        now.timestamp_subsec_millis() % 1000
    )
}

/// Undo the renames recorded in `log_path`, newest first.
///
/// Entries whose renamed path is gone are skipped with a warning. An entry is
/// refused if its original path has been taken in the meantime. The log is
/// deleted once every entry has been restored or skipped.
pub fn rollback(log_path: &Path) -> Result<RollbackResult> {
    if !log_path.exists() {
        return Err(anyhow!("Log file '{}' not found.", log_path.display()));
    }
    let log = RollbackLog::load(log_path)?;

    let mut result = RollbackResult {
        log: log_path.to_path_buf(),
        ..Default::default()
    };

    for record in log.entries.iter().rev() {
        if fs::symlink_metadata(&record.to).is_err() {
            warn!(
                "File '{}' not found, skipping rollback.",
                record.to.display()
            );
            result.skipped.push(record.to.clone());
            continue;
        }

        if fs::symlink_metadata(&record.from).is_ok() {
            let reason = format!("'{}' already exists", record.from.display());
            error!("Failed to roll back '{}': {reason}", record.to.display());
            result.failed.push(FailedItem {
                path: record.to.clone(),
                reason,
            });
            continue;
        }

        match fs::rename(&record.to, &record.from) {
            Ok(()) => {
                info!(
                    "Rolled back: '{}' to '{}'",
                    record.to.display(),
                    record.from.display()
                );
                result.restored.push(record.clone());
            },
            Err(e) => {
                error!("Failed to roll back '{}': {e}", record.to.display());
                result.failed.push(FailedItem {
                    path: record.to.clone(),
                    reason: e.to_string(),
                });
            },
        }
    }

    if result.failed.is_empty() {
        fs::remove_file(log_path)
            .with_context(|| format!("Failed to remove log file '{}'", log_path.display()))?;
        info!("Removed log file: {}", log_path.display());
        result.log_removed = true;
    } else {
        warn!(
            "Keeping log file {} because {} entries could not be rolled back",
            log_path.display(),
            result.failed.len()
        );
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_log_file_name() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("Photos");
        fs::create_dir(&root).unwrap();
        let now = Local.with_ymd_and_hms(2024, 8, 15, 22, 10, 15).unwrap()
            + chrono::Duration::milliseconds(333);

        assert_eq!(log_file_name(&root, now), "Photos_ren_20240815_221015333.log");
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x_ren.log");
        let mut log = RollbackLog::new(dir.path());
        log.push(dir.path().join("a, b.txt"), dir.path().join("c.txt"));
        log.save(&path).unwrap();

        let loaded = RollbackLog::load(&path).unwrap();
        assert_eq!(loaded.entries, log.entries);
        assert!(!dir.path().join("x_ren.tmp").exists());
    }

    #[test]
    fn test_load_plain_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("old.log");
        fs::write(&path, "/tmp/a.txt,/tmp/a_old.txt\n\n/tmp/b.txt,/tmp/b_old.txt\n").unwrap();

        let log = RollbackLog::load(&path).unwrap();
        assert_eq!(log.entries.len(), 2);
        assert_eq!(log.entries[1].to, PathBuf::from("/tmp/b_old.txt"));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.log");
        fs::write(&path, "no separator here\n").unwrap();
        assert!(RollbackLog::load(&path).is_err());
    }

    #[test]
    fn test_rollback_restores_in_reverse_order() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        let c = dir.path().join("c.txt");
        // a -> b, then b -> c: only reverse order restores a
        fs::write(&c, "content").unwrap();

        let mut log = RollbackLog::new(dir.path());
        log.push(a.clone(), b.clone());
        log.push(b.clone(), c.clone());
        let log_path = dir.path().join("run.log");
        log.save(&log_path).unwrap();

        let result = rollback(&log_path).unwrap();
        assert_eq!(result.restored.len(), 2);
        assert!(a.exists());
        assert!(!c.exists());
        assert!(!log_path.exists());
        assert!(result.log_removed);
    }

    #[test]
    fn test_rollback_skips_missing_targets() {
        let dir = TempDir::new().unwrap();
        let mut log = RollbackLog::new(dir.path());
        log.push(dir.path().join("gone.txt"), dir.path().join("gone_old.txt"));
        let log_path = dir.path().join("run.log");
        log.save(&log_path).unwrap();

        let result = rollback(&log_path).unwrap();
        assert_eq!(result.skipped, vec![dir.path().join("gone_old.txt")]);
        assert!(result.restored.is_empty());
        assert!(!log_path.exists());
    }

    #[test]
    fn test_rollback_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let original = dir.path().join("a.txt");
        let renamed = dir.path().join("a_old.txt");
        fs::write(&original, "new file").unwrap();
        fs::write(&renamed, "renamed file").unwrap();

        let mut log = RollbackLog::new(dir.path());
        log.push(original.clone(), renamed.clone());
        let log_path = dir.path().join("run.log");
        log.save(&log_path).unwrap();

        let result = rollback(&log_path).unwrap();
        assert_eq!(result.failed.len(), 1);
        assert_eq!(fs::read_to_string(&original).unwrap(), "new file");
        assert!(log_path.exists());
        assert!(!result.log_removed);
    }

    #[test]
    fn test_rollback_missing_log() {
        let dir = TempDir::new().unwrap();
        let err = rollback(&dir.path().join("missing.log")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
