// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::ShowOutput;

/// Command-line arguments for `spingroup`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "spingroup",
    version,
    about = "Run commands concurrently behind a live spinner display.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Defaults to `Spingroup.toml` in the current directory.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Run at most N tasks at once (overrides `[config].max_concurrent`).
    #[arg(long, value_name = "N")]
    pub max_concurrent: Option<usize>,

    /// Which finished tasks to report: failures, all or never.
    #[arg(long, value_name = "MODE")]
    pub show_output: Option<ShowOutput>,

    /// Skip the post-run report; only the exit code tells.
    #[arg(long)]
    pub no_debrief: bool,

    /// Disable ANSI colors.
    #[arg(long)]
    pub no_color: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SPINGROUP_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the task list, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
