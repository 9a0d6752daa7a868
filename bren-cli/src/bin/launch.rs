//! `bren-launch`: start `bren.py` with the system Python, passing every
//! argument through unchanged.

use bren_core::launcher::{launch, LaunchError, LaunchTarget};
use std::env;
use std::ffi::OsString;
use std::io;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    // Quiet unless RUST_LOG asks for more; stderr belongs to the delegate
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .without_time()
        .try_init();

    let args: Vec<OsString> = env::args_os().skip(1).collect();
    process::exit(run(args));
}

fn run(args: Vec<OsString>) -> i32 {
    let launcher = match env::current_exe() {
        Ok(path) => path,
        Err(source) => {
            let e = LaunchError::LauncherPath {
                path: env::args_os().next().map(Into::into).unwrap_or_default(),
                source,
            };
            eprintln!("Error: {e}");
            return e.exit_code();
        },
    };

    let target = LaunchTarget::default();
    match launch(&target, &launcher, args) {
        Ok(outcome) if outcome.success() => 0,
        Ok(outcome) => {
            eprintln!(
                "Error: {} exited with status {}",
                target.entry_point().to_string_lossy(),
                outcome.code
            );
            outcome.code
        },
        Err(e) => {
            eprintln!("Error: {e}");
            e.exit_code()
        },
    }
}
