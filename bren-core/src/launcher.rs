//! Portable launcher for a script that lives next to the launcher binary.
//!
//! The launcher runs a fixed pipeline and stops at the first failure:
//!
//! 1. find the runtime on the search path,
//! 2. resolve the entry point relative to the launcher's real location,
//! 3. check that the entry point is a regular file,
//! 4. run `runtime entry_point args...` with inherited stdio,
//! 5. hand back the delegate's exit status unchanged.
//!
//! Arguments are forwarded as `OsString`s and are never parsed or re-quoted.

use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use tracing::debug;

/// Script the launcher delegates to.
pub const DEFAULT_ENTRY_POINT: &str = "bren.py";

#[cfg(windows)]
pub const DEFAULT_RUNTIME: &str = "python";
#[cfg(not(windows))]
pub const DEFAULT_RUNTIME: &str = "python3";

/// Exit code for every failure the launcher detects itself.
pub const PRECONDITION_FAILURE_CODE: i32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// The runtime could not be found on the search path
    #[error("{runtime} is not installed or not in PATH")]
    RuntimeUnavailable { runtime: String },

    /// The launcher could not determine its own location
    #[error("cannot resolve launcher location {}: {source}", path.display())]
    LauncherPath {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The co-located entry point does not exist
    #[error("{} not found", path.display())]
    EntryPointMissing { path: PathBuf },

    /// The runtime was found but could not be started
    #[error("failed to start {}: {source}", runtime.display())]
    Spawn {
        runtime: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LaunchError {
    pub fn exit_code(&self) -> i32 {
        PRECONDITION_FAILURE_CODE
    }
}

/// What to launch: a runtime name and the file name of the entry point.
#[derive(Debug, Clone)]
pub struct LaunchTarget {
    runtime: OsString,
    entry_point: OsString,
    search_path: Option<OsString>,
}

impl Default for LaunchTarget {
    fn default() -> Self {
        Self::new(DEFAULT_RUNTIME, DEFAULT_ENTRY_POINT)
    }
}

impl LaunchTarget {
    pub fn new(runtime: impl Into<OsString>, entry_point: impl Into<OsString>) -> Self {
        Self {
            runtime: runtime.into(),
            entry_point: entry_point.into(),
            search_path: None,
        }
    }

    /// Search this path list instead of the process `PATH`
    #[must_use]
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    pub fn entry_point(&self) -> &OsStr {
        &self.entry_point
    }

    /// Find the runtime executable on the search path
    pub fn validate_runtime(&self) -> Result<PathBuf, LaunchError> {
        let search_path = self
            .search_path
            .clone()
            .or_else(|| std::env::var_os("PATH"));

        find_executable(&self.runtime, search_path.as_deref()).ok_or_else(|| {
            LaunchError::RuntimeUnavailable {
                runtime: self.runtime.to_string_lossy().into_owned(),
            }
        })
    }

    /// Resolve the entry point next to the launcher's real location.
    ///
    /// `launcher` may be relative or a symlink; it is canonicalized first so
    /// the caller's working directory plays no part once the launcher path
    /// itself has been resolved.
    pub fn locate_entry_point(&self, launcher: &Path) -> Result<PathBuf, LaunchError> {
        let real = launcher
            .canonicalize()
            .map_err(|source| LaunchError::LauncherPath {
                path: launcher.to_path_buf(),
                source,
            })?;

        let dir = real.parent().unwrap_or_else(|| Path::new("/"));
        Ok(dir.join(&self.entry_point))
    }

    /// Run the three precondition steps in order.
    pub fn prepare(&self, launcher: &Path) -> Result<Launch, LaunchError> {
        let runtime = self.validate_runtime()?;
        debug!(runtime = %runtime.display(), "runtime found");

        let entry_point = self.locate_entry_point(launcher)?;
        check_entry_point(&entry_point)?;
        debug!(entry_point = %entry_point.display(), "entry point found");

        Ok(Launch {
            runtime,
            entry_point,
        })
    }
}

/// Fail unless `path` is an existing regular file
pub fn check_entry_point(path: &Path) -> Result<(), LaunchError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(LaunchError::EntryPointMissing {
            path: path.to_path_buf(),
        })
    }
}

/// A runtime and entry point that passed every precondition.
#[derive(Debug, Clone)]
pub struct Launch {
    pub runtime: PathBuf,
    pub entry_point: PathBuf,
}

impl Launch {
    /// Run the delegate and wait for it. Stdio is inherited untouched.
    pub fn delegate<I, S>(&self, args: I) -> Result<LaunchOutcome, LaunchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let status = Command::new(&self.runtime)
            .arg(&self.entry_point)
            .args(args)
            .status()
            .map_err(|source| LaunchError::Spawn {
                runtime: self.runtime.clone(),
                source,
            })?;

        Ok(LaunchOutcome {
            code: exit_status_code(status),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchOutcome {
    pub code: i32,
}

impl LaunchOutcome {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Run the whole launcher pipeline for `launcher` with `args`.
pub fn launch<I, S>(
    target: &LaunchTarget,
    launcher: &Path,
    args: I,
) -> Result<LaunchOutcome, LaunchError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    target.prepare(launcher)?.delegate(args)
}

/// Numeric status for a finished child. Signals map to `128 + signo` like a shell.
pub fn exit_status_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    PRECONDITION_FAILURE_CODE
}

/// Look `name` up on `search_path`.
///
/// A name containing a path separator is checked directly, mirroring how
/// shells treat `./tool` or `/usr/bin/tool`.
pub fn find_executable(name: &OsStr, search_path: Option<&OsStr>) -> Option<PathBuf> {
    let as_path = Path::new(name);
    if as_path.components().count() > 1 {
        return candidates(as_path).into_iter().find(|p| is_executable(p));
    }

    let search_path = search_path?;
    std::env::split_paths(search_path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| candidates(&dir.join(name)))
        .find(|p| is_executable(p))
}

#[cfg(windows)]
fn candidates(base: &Path) -> Vec<PathBuf> {
    let pathext = std::env::var_os("PATHEXT")
        .map(|v| v.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".COM;.EXE;.BAT;.CMD".to_string());

    let mut out = vec![base.to_path_buf()];
    for ext in pathext.split(';').filter(|e| !e.is_empty()) {
        let mut with_ext = base.as_os_str().to_os_string();
        with_ext.push(ext);
        out.push(PathBuf::from(with_ext));
    }
    out
}

#[cfg(not(windows))]
fn candidates(base: &Path) -> Vec<PathBuf> {
    vec![base.to_path_buf()]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
