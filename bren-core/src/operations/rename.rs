use crate::actions::RenameActions;
use crate::archive::{process_archive, ArchiveFormat};
use crate::error::InvalidArgument;
use crate::output::RenameResult;
use crate::pattern::MatchPattern;
use crate::placeholder::{format_date, PlaceholderOptions};
use crate::rename::{check_permissions, rename_root, RenameOptions};
use crate::scanner::{EntryFilter, ScanOptions, SortKey};
use anyhow::Result;
use chrono::Local;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use tracing::info;

/// A rename run as requested on the command line, before validation
#[derive(Debug, Clone, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct RenameRequest {
    pub paths: Vec<PathBuf>,
    pub archive: Option<PathBuf>,
    pub match_spec: String,
    pub delete: Option<String>,
    pub replace: Option<(String, String)>,
    pub append: Option<String>,
    pub prepend: Option<String>,
    pub attr: Option<String>,
    pub recursive: bool,
    pub file_only: bool,
    pub dir_only: bool,
    pub excludes: Vec<String>,
    pub sort: Option<SortKey>,
    pub placeholders: PlaceholderOptions,
    pub dry_run: bool,
    pub no_log: bool,
}

impl RenameRequest {
    /// Check the request and build pipeline options.
    ///
    /// Checks run in a fixed order so the first problem reported is stable:
    /// file/dir filters, actions, random length, match pattern, date
    /// format, archive extension, then path existence.
    pub fn validate(&self) -> Result<RenameOptions, InvalidArgument> {
        if self.file_only && self.dir_only {
            return Err(InvalidArgument::FileAndDirOnly);
        }

        let actions = RenameActions::new(
            self.delete.as_deref(),
            self.replace.clone(),
            self.append.clone(),
            self.prepend.clone(),
            self.attr.as_deref(),
        )?;

        if self.placeholders.random_length < 1 {
            return Err(InvalidArgument::RandomLength);
        }

        let pattern = MatchPattern::parse(&self.match_spec)?;
        format_date(&self.placeholders.date_format, Local::now())?;

        if let Some(archive) = &self.archive {
            ArchiveFormat::detect(archive)?;
        }

        for path in self.roots() {
            if !path.exists() {
                return Err(InvalidArgument::PathMissing(path));
            }
        }

        let filter = if self.file_only {
            EntryFilter::FilesOnly
        } else if self.dir_only {
            EntryFilter::DirsOnly
        } else {
            EntryFilter::Any
        };

        Ok(RenameOptions {
            pattern,
            actions,
            scan: ScanOptions {
                recursive: self.recursive,
                filter,
                excludes: self.excludes.clone(),
                sort: self.sort,
            },
            placeholders: self.placeholders.clone(),
            dry_run: self.dry_run,
            write_log: !self.no_log,
            directory_name: None,
        })
    }

    /// The archive when one is given, the paths otherwise, `.` by default
    pub fn roots(&self) -> Vec<PathBuf> {
        if let Some(archive) = &self.archive {
            return vec![archive.clone()];
        }
        if self.paths.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            self.paths.clone()
        }
    }
}

/// Rename operation - returns structured data.
///
/// Every root is validated and permission-checked before the first rename.
pub fn rename_operation(request: &RenameRequest, interrupted: &AtomicBool) -> Result<RenameResult> {
    let options = request.validate()?;
    let roots = request.roots();
    for root in &roots {
        check_permissions(root)?;
    }

    if let Some(archive) = &request.archive {
        info!("Processing archive: {}", archive.display());
        let mut result = process_archive(archive, &options, interrupted)?;
        result.pattern = request.match_spec.clone();
        return Ok(result);
    }

    let mut total = RenameResult {
        pattern: request.match_spec.clone(),
        dry_run: request.dry_run,
        ..Default::default()
    };
    for root in &roots {
        let result = rename_root(root, &options, interrupted)?;
        let stop = result.interrupted;
        total.absorb(result);
        if stop {
            break;
        }
    }

    Ok(total)
}
