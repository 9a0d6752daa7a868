use anyhow::Result;
use bren_core::{Config, InvalidArgument, PermissionDenied};
use clap::Parser;
use std::io::{self, BufRead, IsTerminal};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

mod cli;
mod logging;
mod rename;
mod rollback;

use cli::Cli;

const EXIT_FAILURE: i32 = 1;
const EXIT_INTERRUPTED: i32 = 130;

fn main() {
    // Set up signal handler for graceful shutdown (both SIGINT and SIGTERM)
    let interrupted = Arc::new(AtomicBool::new(false));

    let interrupted_clone = Arc::clone(&interrupted);
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("\nReceived SIGINT. Finishing current rename...");
        interrupted_clone.store(true, Ordering::SeqCst);
    }) {
        eprintln!("Warning: failed to set SIGINT handler: {e}");
    }

    #[cfg(unix)]
    {
        let interrupted_clone = Arc::clone(&interrupted);
        // SAFETY: the handler only performs an atomic store
        let registered = unsafe {
            signal_hook::low_level::register(signal_hook::consts::SIGTERM, move || {
                interrupted_clone.store(true, Ordering::SeqCst);
            })
        };
        if let Err(e) = registered {
            eprintln!("Warning: failed to set SIGTERM handler: {e}");
        }
    }

    let cli = Cli::parse();
    let use_color = !cli.no_color && io::stderr().is_terminal();

    if let Err(e) = logging::init(cli.log_file.as_deref(), use_color) {
        eprintln!("Error: {e:#}");
        process::exit(EXIT_FAILURE);
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Ignoring config: {e:#}");
            Config::default()
        },
    };
    let preview_color = if cli.no_color {
        false
    } else {
        bren_core::preview::should_use_color(config.defaults.use_color)
    };

    let result = run(&cli, &config, &interrupted, preview_color);

    // Interrupted runs have already written their rollback log
    if interrupted.load(Ordering::SeqCst) {
        eprintln!("Operation interrupted");
        process::exit(EXIT_INTERRUPTED);
    }

    match result {
        Ok(true) => process::exit(0),
        Ok(false) => process::exit(EXIT_FAILURE),
        Err(e) => {
            if let Some(invalid) = e.downcast_ref::<InvalidArgument>() {
                eprintln!("Invalid argument: {invalid}");
            } else if let Some(denied) = e.downcast_ref::<PermissionDenied>() {
                eprintln!("Error: {denied}");
            } else {
                eprintln!("Error: {e:#}");
            }
            process::exit(EXIT_FAILURE);
        },
    }
}

fn run(cli: &Cli, config: &Config, interrupted: &AtomicBool, use_color: bool) -> Result<bool> {
    if let Some(log) = &cli.rollback {
        return rollback::handle_rollback(cli, log);
    }
    let paths = input_paths(cli)?;
    rename::handle_rename(cli, config, paths, interrupted, use_color)
}

/// `-p` wins, then positional paths, then one path per line of piped stdin
fn input_paths(cli: &Cli) -> Result<Vec<PathBuf>> {
    if let Some(path) = &cli.path {
        return Ok(vec![path.clone()]);
    }
    if !cli.paths.is_empty() || cli.archive.is_some() {
        return Ok(cli.paths.clone());
    }

    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(Vec::new());
    }
    read_paths(stdin.lock())
}

fn read_paths<R: BufRead>(reader: R) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() {
            paths.push(PathBuf::from(line));
        }
    }
    Ok(paths)
}
