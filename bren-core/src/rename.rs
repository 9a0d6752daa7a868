use crate::actions::{ItemContext, RenameActions};
use crate::attributes::apply_attributes;
use crate::error::PermissionDenied;
use crate::output::{FailedItem, PlannedRename, RenameResult};
use crate::pattern::MatchPattern;
use crate::placeholder::{current_user, PlaceholderOptions};
use crate::rollback::{log_file_name, RollbackLog};
use crate::scanner::{scan_root, Candidate, ScanOptions};
use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};

/// Everything needed to rename the matches under one root
#[derive(Debug, Clone)]
pub struct RenameOptions {
    pub pattern: MatchPattern,
    pub actions: RenameActions,
    pub scan: ScanOptions,
    pub placeholders: PlaceholderOptions,
    /// Plan and report, never touch the disk
    pub dry_run: bool,
    pub write_log: bool,
    /// Value of `$W` for every item instead of the parent directory name
    pub directory_name: Option<String>,
}

/// A candidate together with its computed name
#[derive(Debug, Clone)]
pub struct PlannedItem {
    pub candidate: Candidate,
    pub new_name: String,
    pub new_path: PathBuf,
}

impl PlannedItem {
    pub fn is_rename(&self) -> bool {
        self.new_name != self.candidate.name
    }

    fn to_planned_rename(&self) -> PlannedRename {
        PlannedRename {
            from: self.candidate.path.clone(),
            to: self.new_path.clone(),
            kind: self.candidate.kind,
        }
    }
}

/// Compute new names for every match under `root`, in scan order.
///
/// Numbering restarts at 1 for each root. Placeholder errors (a bad date
/// format, say) abort the plan before anything is renamed.
pub fn plan_root(root: &Path, options: &RenameOptions) -> Result<Vec<PlannedItem>> {
    let candidates = scan_root(root, &options.pattern, &options.scan)?;
    let user = current_user();
    let now = Local::now();

    let mut plan = Vec::with_capacity(candidates.len());
    for (i, candidate) in candidates.into_iter().enumerate() {
        let directory_name = match &options.directory_name {
            Some(name) => name.clone(),
            None => directory_name(&candidate.dir),
        };
        let item = ItemContext {
            index: i + 1,
            directory_name: &directory_name,
            user: &user,
            now,
        };
        let new_name = options
            .actions
            .transform(&candidate.name, &options.placeholders, &item)?;
        let new_path = candidate.dir.join(&new_name);
        plan.push(PlannedItem {
            candidate,
            new_name,
            new_path,
        });
    }

    Ok(plan)
}

fn directory_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Rename the matches under `root`.
///
/// The plan is applied deepest path first so that renaming a directory
/// never invalidates a pending path below it. Failed items are reported
/// in the result and do not stop the batch. When `interrupted` becomes
/// true no further renames are started; the rollback log still covers
/// everything that was done.
pub fn rename_root(
    root: &Path,
    options: &RenameOptions,
    interrupted: &AtomicBool,
) -> Result<RenameResult> {
    let root = root
        .canonicalize()
        .with_context(|| format!("Failed to resolve path: {}", root.display()))?;
    info!("Processing path: {}", root.display());

    let plan = plan_root(&root, options)?;
    let mut result = RenameResult {
        pattern: options.pattern.to_string(),
        dry_run: options.dry_run,
        ..Default::default()
    };

    for item in &plan {
        if item.is_rename() {
            result.planned.push(item.to_planned_rename());
        } else {
            result.unchanged += 1;
        }
    }

    if options.dry_run {
        for item in plan.iter().filter(|item| item.is_rename()) {
            info!(
                "Would rename '{}' to '{}'",
                item.candidate.path.display(),
                item.new_path.display()
            );
        }
        return Ok(result);
    }

    apply_plan(&root, &plan, options, &mut result, || {
        interrupted.load(Ordering::SeqCst)
    })?;
    Ok(result)
}

/// Apply `plan` under `root`, checking `should_stop` before each item
fn apply_plan<F: Fn() -> bool>(
    root: &Path,
    plan: &[PlannedItem],
    options: &RenameOptions,
    result: &mut RenameResult,
    should_stop: F,
) -> Result<()> {
    let mut order: Vec<usize> = (0..plan.len()).collect();
    order.sort_by(|&a, &b| plan[b].candidate.depth.cmp(&plan[a].candidate.depth));

    let mut log = RollbackLog::new(root);
    let mut done: Vec<(usize, PathBuf)> = Vec::new();
    let mut moved_dirs: Vec<(PathBuf, PathBuf)> = Vec::new();

    for index in order {
        if should_stop() {
            warn!("Interrupted, stopping before remaining renames");
            result.interrupted = true;
            break;
        }

        let item = &plan[index];
        let from = &item.candidate.path;
        let to = &item.new_path;

        if item.is_rename() {
            if let Err(reason) = check_new_name(&item.new_name) {
                report_failure(result, from, reason);
                continue;
            }
            if target_taken(from, to) {
                report_failure(
                    result,
                    from,
                    format!("'{}' already exists", to.display()),
                );
                continue;
            }
            if let Err(e) = perform_rename(from, to) {
                report_failure(result, from, format!("{e:#}"));
                continue;
            }

            info!("Renamed '{}' to '{}'", from.display(), to.display());
            log.push(from.clone(), to.clone());
            if to.is_dir() {
                moved_dirs.push((from.clone(), to.clone()));
            }
            done.push((index, to.clone()));
        }

        if let Some(attr) = &options.actions.attr {
            if let Err(e) = apply_attributes(to, attr) {
                report_failure(result, to, format!("{e:#}"));
            }
        }
    }

    // Paths recorded before an ancestor moved are rewritten to where they
    // ended up, in plan order.
    done.sort_by_key(|(index, _)| *index);
    result.renamed = done
        .into_iter()
        .map(|(_, path)| final_path(&path, &moved_dirs))
        .collect();

    if options.write_log && !log.is_empty() {
        let log_path = root.join(log_file_name(root, Local::now()));
        log.save(&log_path)?;
        info!("Rollback log written to {}", log_path.display());
        result.log_paths.push(log_path);
    }

    Ok(())
}

fn report_failure(result: &mut RenameResult, path: &Path, reason: String) {
    error!("Failed to rename '{}': {reason}", path.display());
    result.failed.push(FailedItem {
        path: path.to_path_buf(),
        reason,
    });
}

/// Names that cannot be created as a single directory entry
fn check_new_name(name: &str) -> Result<(), String> {
    let separator = name.contains('/') || (cfg!(windows) && name.contains('\\'));
    if name.is_empty() || name == "." || name == ".." || separator {
        return Err(format!("'{name}' is not a valid file name"));
    }
    Ok(())
}

/// Whether `to` names an entry other than `from` itself
fn target_taken(from: &Path, to: &Path) -> bool {
    match fs::symlink_metadata(to) {
        Ok(_) => !same_entry(from, to),
        Err(_) => false,
    }
}

#[cfg(unix)]
fn same_entry(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    match (fs::symlink_metadata(a), fs::symlink_metadata(b)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn same_entry(a: &Path, b: &Path) -> bool {
    a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
}

fn perform_rename(from: &Path, to: &Path) -> Result<()> {
    let case_only =
        from.to_string_lossy().to_lowercase() == to.to_string_lossy().to_lowercase() && from != to;

    if case_only && same_entry(from, to) {
        // Case-insensitive file system: go through a temporary name
        let temp_name = from.with_extension(format!("{}.bren.tmp", std::process::id()));
        fs::rename(from, &temp_name)
            .with_context(|| format!("Failed to rename {} to temp", from.display()))?;
        fs::rename(&temp_name, to)
            .with_context(|| format!("Failed to rename temp to {}", to.display()))?;
    } else {
        fs::rename(from, to)
            .with_context(|| format!("Failed to rename {} to {}", from.display(), to.display()))?;
    }
    Ok(())
}

/// Apply directory moves, in the order they happened, to `path`
fn final_path(path: &Path, moved_dirs: &[(PathBuf, PathBuf)]) -> PathBuf {
    let mut current = path.to_path_buf();
    for (from, to) in moved_dirs {
        if let Ok(rest) = current.strip_prefix(from) {
            if !rest.as_os_str().is_empty() {
                current = to.join(rest);
            }
        }
    }
    current
}

/// Refuse roots the current user cannot read, write and traverse
#[cfg(unix)]
pub fn check_permissions(path: &Path) -> Result<(), PermissionDenied> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let denied = || PermissionDenied(path.to_path_buf());
    let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| denied())?;
    let mode = if path.is_dir() {
        libc::R_OK | libc::W_OK | libc::X_OK
    } else {
        libc::R_OK | libc::W_OK
    };
    // SAFETY: c_path is a valid NUL-terminated string for the duration of the call
    let rc = unsafe { libc::access(c_path.as_ptr(), mode) };
    if rc == 0 {
        Ok(())
    } else {
        Err(denied())
    }
}

#[cfg(not(unix))]
pub fn check_permissions(path: &Path) -> Result<(), PermissionDenied> {
    match fs::metadata(path) {
        Ok(metadata) if !metadata.permissions().readonly() => Ok(()),
        _ => Err(PermissionDenied(path.to_path_buf())),
    }
}
