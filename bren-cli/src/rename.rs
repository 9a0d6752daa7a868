use anyhow::Result;
use bren_core::{
    render_preview, rename_operation, Config, OutputFormatter, PlaceholderOptions, Preview,
    RandomCase, RenameRequest, RenameResult,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::AtomicBool;

use crate::cli::{Cli, OutputFormat};

/// Merge flags over config defaults
pub fn build_request(cli: &Cli, config: &Config, paths: Vec<PathBuf>) -> RenameRequest {
    let defaults = &config.defaults;
    let args = &cli.placeholders;

    let random_case = if args.random_lowercase {
        RandomCase::Lower
    } else if args.random_uppercase {
        RandomCase::Upper
    } else {
        defaults.random_case
    };

    RenameRequest {
        paths,
        archive: cli.archive.clone(),
        match_spec: cli.match_spec.clone().unwrap_or_default(),
        delete: cli.actions.delete.clone(),
        replace: cli.actions.replace_pair(),
        append: cli.actions.append.clone(),
        prepend: cli.actions.prepend.clone(),
        attr: cli.actions.attr.clone(),
        recursive: cli.scan.recursive,
        file_only: cli.scan.file_only,
        dir_only: cli.scan.dir_only,
        excludes: cli.scan.exclude.clone(),
        sort: cli.scan.sort.map(Into::into).or(defaults.sort),
        placeholders: PlaceholderOptions {
            num_start: args.num_start.unwrap_or(defaults.num_start),
            num_step: args.num_step.unwrap_or(defaults.num_step),
            date_format: args
                .date_format
                .clone()
                .unwrap_or_else(|| defaults.date_format.clone()),
            random_length: args.random_length.unwrap_or(defaults.random_length),
            random_case,
        },
        dry_run: cli.preview || cli.dry_run,
        no_log: cli.no_log || defaults.no_log,
    }
}

/// Returns whether every item was renamed
pub fn handle_rename(
    cli: &Cli,
    config: &Config,
    paths: Vec<PathBuf>,
    interrupted: &AtomicBool,
    use_color: bool,
) -> Result<bool> {
    let request = build_request(cli, config, paths);
    let result = rename_operation(&request, interrupted)?;

    match cli.output {
        OutputFormat::Json => println!("{}", result.format_json()),
        OutputFormat::Summary if result.dry_run => {
            let preview = cli.preview_format.map_or_else(
                || Preview::from_str(&config.defaults.preview_format).unwrap_or(Preview::Table),
                Into::into,
            );
            print!("{}", render_preview(&result, preview, use_color));
        },
        OutputFormat::Summary => {
            // stdout carries only the renamed paths, for `xargs -0`
            eprint!("{}", result.format_summary());
            write_renamed_paths(&mut io::stdout().lock(), &result)?;
        },
    }

    Ok(!result.has_failures())
}

/// Write every resulting path followed by a NUL byte
pub fn write_renamed_paths<W: Write>(out: &mut W, result: &RenameResult) -> io::Result<()> {
    for path in &result.renamed {
        out.write_all(path_bytes(path).as_ref())?;
        out.write_all(b"\0")?;
    }
    out.flush()
}

#[cfg(unix)]
fn path_bytes(path: &Path) -> std::borrow::Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    std::borrow::Cow::Borrowed(path.as_os_str().as_bytes())
}

#[cfg(not(unix))]
fn path_bytes(path: &Path) -> std::borrow::Cow<'_, [u8]> {
    match path.to_string_lossy() {
        std::borrow::Cow::Borrowed(s) => std::borrow::Cow::Borrowed(s.as_bytes()),
        std::borrow::Cow::Owned(s) => std::borrow::Cow::Owned(s.into_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bren_core::SortKey;
    use clap::Parser;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "bren",
            "-m",
            "prefix:a",
            "--append",
            "#",
            "--num-start",
            "7",
            "--random-uppercase",
            "--dry-run",
        ])
        .unwrap();
        let mut config = Config::default();
        config.defaults.num_start = 3;
        config.defaults.num_step = 5;
        config.defaults.sort = Some(SortKey::Mtime);
        config.defaults.no_log = true;

        let request = build_request(&cli, &config, vec![]);
        assert_eq!(request.placeholders.num_start, 7);
        assert_eq!(request.placeholders.num_step, 5);
        assert_eq!(request.placeholders.random_case, RandomCase::Upper);
        assert_eq!(request.sort, Some(SortKey::Mtime));
        assert!(request.no_log);
        assert!(request.dry_run);
    }

    #[test]
    fn test_write_renamed_paths() {
        let result = RenameResult {
            renamed: vec![PathBuf::from("a b.txt"), PathBuf::from("c.txt")],
            ..Default::default()
        };
        let mut out = Vec::new();
        write_renamed_paths(&mut out, &result).unwrap();
        assert_eq!(out, b"a b.txt\0c.txt\0");
    }
}
