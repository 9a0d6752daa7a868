use crate::rollback::RenameRecord;
use crate::scanner::EntryKind;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt::Write;
use std::path::PathBuf;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Summary,
    Json,
}

/// A rename that was planned (and, outside preview, attempted)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedRename {
    pub from: PathBuf,
    pub to: PathBuf,
    pub kind: EntryKind,
}

/// An item that could not be renamed or restored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedItem {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of a rename run over one or more roots
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RenameResult {
    pub pattern: String,
    pub dry_run: bool,
    /// Every rename in plan order
    pub planned: Vec<PlannedRename>,
    /// Final paths of the items that were renamed, in plan order
    pub renamed: Vec<PathBuf>,
    /// Matches whose name would not change
    pub unchanged: usize,
    pub failed: Vec<FailedItem>,
    /// Rollback logs written by this run
    pub log_paths: Vec<PathBuf>,
    pub interrupted: bool,
}

impl RenameResult {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Merge the result for another root into this one
    pub fn absorb(&mut self, other: Self) {
        self.planned.extend(other.planned);
        self.renamed.extend(other.renamed);
        self.unchanged += other.unchanged;
        self.failed.extend(other.failed);
        self.log_paths.extend(other.log_paths);
        self.interrupted |= other.interrupted;
    }
}

/// Result of a rollback
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RollbackResult {
    pub log: PathBuf,
    pub restored: Vec<RenameRecord>,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<FailedItem>,
    pub log_removed: bool,
}

/// Trait for formatting output in different formats
pub trait OutputFormatter {
    fn format(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => self.format_json(),
            OutputFormat::Summary => self.format_summary(),
        }
    }
    fn format_json(&self) -> String;
    fn format_summary(&self) -> String;
}

impl OutputFormatter for RenameResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "success": !self.has_failures(),
            "operation": if self.dry_run { "preview" } else { "rename" },
            "pattern": self.pattern,
            "summary": {
                "planned": self.planned.len(),
                "renamed": self.renamed.len(),
                "unchanged": self.unchanged,
                "failed": self.failed.len(),
            },
            "renames": self.planned,
            "failed": self.failed,
            "log_paths": self.log_paths,
            "interrupted": self.interrupted,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        let mut output = String::new();

        if self.dry_run {
            writeln!(
                output,
                "Would rename {} items matching '{}'",
                self.planned.len(),
                self.pattern
            )
            .unwrap();
            return output;
        }

        writeln!(output, "✓ Renamed {} items", self.renamed.len()).unwrap();
        if !self.failed.is_empty() {
            writeln!(output, "✗ {} items could not be renamed", self.failed.len()).unwrap();
        }
        if self.interrupted {
            output.push_str("Interrupted before all items were processed\n");
        }

        match self.log_paths.last() {
            Some(log) => {
                writeln!(
                    output,
                    "To rollback this operation, use: bren --rollback {}",
                    log.display()
                )
                .unwrap();
            },
            None if self.renamed.is_empty() => {
                output.push_str("No files were renamed\n");
            },
            None => {},
        }

        output
    }
}

impl OutputFormatter for RollbackResult {
    fn format_json(&self) -> String {
        serde_json::to_string(&json!({
            "success": self.failed.is_empty(),
            "operation": "rollback",
            "log": self.log,
            "summary": {
                "restored": self.restored.len(),
                "skipped": self.skipped.len(),
                "failed": self.failed.len(),
            },
            "failed": self.failed,
            "log_removed": self.log_removed,
        }))
        .unwrap_or_default()
    }

    fn format_summary(&self) -> String {
        let mut output = format!("✓ Rolled back {} renames\n", self.restored.len());

        if !self.skipped.is_empty() {
            writeln!(output, "Skipped {} missing items", self.skipped.len()).unwrap();
        }
        if !self.failed.is_empty() {
            writeln!(output, "✗ {} items could not be restored", self.failed.len()).unwrap();
        }
        if self.log_removed {
            writeln!(output, "Removed log file: {}", self.log.display()).unwrap();
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RenameResult {
        RenameResult {
            pattern: "suffix:.txt".to_string(),
            planned: vec![PlannedRename {
                from: PathBuf::from("a.txt"),
                to: PathBuf::from("a_old.txt"),
                kind: EntryKind::File,
            }],
            renamed: vec![PathBuf::from("a_old.txt")],
            log_paths: vec![PathBuf::from("tmp_ren_20240101_000000000.log")],
            ..Default::default()
        }
    }

    #[test]
    fn test_rename_summary_mentions_rollback() {
        let summary = sample().format_summary();
        assert!(summary.contains("Renamed 1 items"));
        assert!(summary.contains("bren --rollback tmp_ren_20240101_000000000.log"));
    }

    #[test]
    fn test_rename_json() {
        let json: serde_json::Value = serde_json::from_str(&sample().format_json()).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["operation"], "rename");
        assert_eq!(json["summary"]["renamed"], 1);
        assert_eq!(json["renames"][0]["kind"], "file");
    }

    #[test]
    fn test_dry_run_summary() {
        let mut result = sample();
        result.dry_run = true;
        assert_eq!(
            result.format(OutputFormat::Summary),
            "Would rename 1 items matching 'suffix:.txt'\n"
        );
    }

    #[test]
    fn test_absorb() {
        let mut total = sample();
        total.absorb(sample());
        assert_eq!(total.planned.len(), 2);
        assert_eq!(total.log_paths.len(), 2);
    }
}
