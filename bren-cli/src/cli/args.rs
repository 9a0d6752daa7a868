use clap::{ArgGroup, Args, Parser};
use std::path::PathBuf;

use super::types::{OutputFormat, PreviewArg, SortArg};

/// Batch rename files and directories by pattern
#[derive(Parser, Debug)]
#[command(name = "bren")]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("operation").args(["match_spec", "rollback"]).required(true).multiple(true)))]
pub struct Cli {
    /// Paths to process (read from stdin when omitted and stdin is not a terminal)
    pub paths: Vec<PathBuf>,

    /// Single path to process; overrides positional paths
    #[arg(short = 'p', long = "path", value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Rename inside a .zip, .tar or .gz archive
    #[arg(short = 'g', long = "archive", value_name = "FILE")]
    pub archive: Option<PathBuf>,

    /// Match items by TYPE:PATTERN (prefix, suffix, contain or regex)
    #[arg(short = 'm', long = "match", value_name = "TYPE:PATTERN")]
    pub match_spec: Option<String>,

    /// Undo the renames recorded in a log file
    #[arg(long, value_name = "LOG")]
    pub rollback: Option<PathBuf>,

    #[command(flatten)]
    pub actions: ActionArgs,

    #[command(flatten)]
    pub scan: ScanArgs,

    #[command(flatten)]
    pub placeholders: PlaceholderArgs,

    /// Show what would be renamed without renaming anything
    #[arg(short = 'v', long)]
    pub preview: bool,

    /// Same as --preview
    #[arg(long)]
    pub dry_run: bool,

    /// Preview format
    #[arg(long, value_enum)]
    pub preview_format: Option<PreviewArg>,

    /// Do not write a rollback log
    #[arg(long)]
    pub no_log: bool,

    /// Also write diagnostics to FILE
    #[arg(short = 'l', long = "log", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "summary")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ActionArgs {
    /// Delete every match of REGEX from the name
    #[arg(long, value_name = "REGEX")]
    pub delete: Option<String>,

    /// Replace every occurrence of OLD with NEW
    #[arg(long, num_args = 2, value_names = ["OLD", "NEW"])]
    pub replace: Option<Vec<String>>,

    /// Insert TEXT before the extension
    #[arg(long, value_name = "TEXT", allow_hyphen_values = true)]
    pub append: Option<String>,

    /// Insert TEXT before the name
    #[arg(long, value_name = "TEXT", allow_hyphen_values = true)]
    pub prepend: Option<String>,

    /// Change attributes: r, w, x, h, optionally prefixed with '-' to remove
    #[arg(long, value_name = "SPEC", allow_hyphen_values = true)]
    pub attr: Option<String>,
}

impl ActionArgs {
    pub fn any(&self) -> bool {
        self.delete.is_some()
            || self.replace.is_some()
            || self.append.is_some()
            || self.prepend.is_some()
            || self.attr.is_some()
    }

    pub fn replace_pair(&self) -> Option<(String, String)> {
        match self.replace.as_deref() {
            Some([old, new]) => Some((old.clone(), new.clone())),
            _ => None,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ScanArgs {
    /// Descend into subdirectories
    #[arg(short = 'R', long)]
    pub recursive: bool,

    /// Only rename files
    #[arg(short = 'f', long)]
    pub file_only: bool,

    /// Only rename directories
    #[arg(short = 'd', long)]
    pub dir_only: bool,

    /// Skip names containing TEXT (repeatable)
    #[arg(short = 'x', long = "exclude", value_name = "TEXT")]
    pub exclude: Vec<String>,

    /// Order matches within each directory
    #[arg(long, value_enum)]
    pub sort: Option<SortArg>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PlaceholderArgs {
    /// First number of a # sequence
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub num_start: Option<i64>,

    /// Step between sequence numbers
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub num_step: Option<i64>,

    /// strftime format for ${date}, or "ms" for epoch milliseconds
    #[arg(long, value_name = "FMT")]
    pub date_format: Option<String>,

    /// Length of ${random} strings
    #[arg(long = "random", value_name = "N")]
    pub random_length: Option<usize>,

    /// ${random} uses lowercase letters and digits
    #[arg(long, conflicts_with = "random_uppercase")]
    pub random_lowercase: bool,

    /// ${random} uses uppercase letters and digits
    #[arg(long)]
    pub random_uppercase: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_rename() {
        let cli = Cli::try_parse_from([
            "bren", "-m", "suffix:.txt", "--replace", "a", "b", "-R", "-x", "tmp", "dir",
        ])
        .unwrap();
        assert_eq!(cli.match_spec.as_deref(), Some("suffix:.txt"));
        assert_eq!(
            cli.actions.replace_pair(),
            Some(("a".to_string(), "b".to_string()))
        );
        assert!(cli.scan.recursive);
        assert_eq!(cli.scan.exclude, vec!["tmp"]);
        assert_eq!(cli.paths, vec![PathBuf::from("dir")]);
    }

    #[test]
    fn test_match_or_rollback_required() {
        assert!(Cli::try_parse_from(["bren", "--append", "x"]).is_err());
        assert!(Cli::try_parse_from(["bren", "--rollback", "x.log"]).is_ok());
    }

    #[test]
    fn test_negative_numbers() {
        let cli =
            Cli::try_parse_from(["bren", "-m", "prefix:a", "--append", "#", "--num-step", "-2"])
                .unwrap();
        assert_eq!(cli.placeholders.num_step, Some(-2));
    }

    #[test]
    fn test_random_case_flags_conflict() {
        assert!(Cli::try_parse_from([
            "bren",
            "-m",
            "prefix:a",
            "--append",
            "${random}",
            "--random-lowercase",
            "--random-uppercase",
        ])
        .is_err());
    }
}
