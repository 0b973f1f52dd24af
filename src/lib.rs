// src/lib.rs

pub mod capture;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod group;
pub mod logging;
pub mod runner;
pub mod types;
pub mod ui;

use anyhow::Result;
use tracing::debug;

use crate::cli::CliArgs;
use crate::config::loader::{default_config_path, load_and_validate};
use crate::config::ConfigFile;
use crate::runner::RunOptions;

pub use crate::exec::{CancelToken, Cancelled, Future, WorkError, WorkQueue};
pub use crate::group::{spin, SpinGroup, TaskHandle, TaskOutcome, TaskResult};

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the config, applies CLI overrides, then runs every
/// task in one spin group. Returns whether all tasks succeeded.
pub fn run(args: CliArgs) -> Result<bool> {
    let path = args.config.clone().unwrap_or_else(default_config_path);
    debug!(path = %path.display(), "loading config");
    let cfg = load_and_validate(&path)?;
    let options = RunOptions::from_config(&cfg.config).with_cli_overrides(&args);

    if args.dry_run {
        print_dry_run(&cfg, &options);
        return Ok(true);
    }

    Ok(runner::run_tasks(&cfg, &options)?)
}

/// Simple dry-run output: print settings and tasks in display order.
fn print_dry_run(cfg: &ConfigFile, options: &RunOptions) {
    println!("spingroup dry-run");
    match options.max_concurrent {
        Some(max) => println!("  max_concurrent = {max}"),
        None => println!("  max_concurrent = unbounded (one thread per task)"),
    }
    println!("  show_output = {:?}", options.show_output);
    println!("  mask_stdin = {}", options.mask_stdin);
    println!();

    println!("tasks ({}):", cfg.task.len());
    for task in &cfg.task {
        println!("  - {}", task.name);
        if let Some(ref title) = task.title {
            println!("      title: {title}");
        }
        println!("      cmd: {}", task.cmd);
    }

    debug!("dry-run complete (no execution)");
}
