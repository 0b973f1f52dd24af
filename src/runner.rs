// src/runner.rs

//! Runs the tasks of a loaded config as one spin group.

use tracing::{info, warn};

use crate::capture;
use crate::cli::CliArgs;
use crate::config::{ConfigFile, ConfigSection};
use crate::cprintln;
use crate::errors::Result;
use crate::exec::run_command;
use crate::group::{write_report, SpinGroup, TaskHandle, TaskOutcome, TaskResult};
use crate::types::ShowOutput;
use crate::ui::{status, RenderState};

/// Effective run settings: `[config]` values with CLI overrides applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub max_concurrent: Option<usize>,
    pub show_output: ShowOutput,
    pub mask_stdin: bool,
    pub color: bool,
}

impl RunOptions {
    pub fn from_config(cfg: &ConfigSection) -> Self {
        let show_output = if cfg.auto_debrief {
            cfg.show_output
        } else {
            ShowOutput::Never
        };
        Self {
            max_concurrent: cfg.max_concurrent,
            show_output,
            mask_stdin: cfg.mask_stdin,
            color: cfg.color,
        }
    }

    pub fn with_cli_overrides(mut self, args: &CliArgs) -> Self {
        if let Some(max) = args.max_concurrent {
            self.max_concurrent = Some(max);
        }
        if let Some(show) = args.show_output {
            self.show_output = show;
        }
        if args.no_debrief {
            self.show_output = ShowOutput::Never;
        }
        if args.no_color {
            self.color = false;
        }
        self
    }
}

/// Work for one configured command: success on a zero exit status, the
/// `Failed` outcome (with the status noted on stderr) otherwise.
pub fn run_command_task(cmd: &str, task: &TaskHandle<'_>) -> TaskResult {
    let status = run_command(cmd, task.cancel_token())?;
    if status.success() {
        Ok(TaskOutcome::Success)
    } else {
        crate::ceprintln!("command exited with {status}");
        Ok(TaskOutcome::Failed)
    }
}

/// Build a group for `cfg` with every task added (and therefore started).
pub fn build_group(cfg: &ConfigFile, options: &RunOptions) -> Result<SpinGroup> {
    let state = RenderState::new(options.color);

    let mut builder = SpinGroup::builder()
        .auto_debrief(options.show_output != ShowOutput::Never)
        .mask_stdin(options.mask_stdin)
        .render_state(state.clone());

    if let Some(max) = options.max_concurrent {
        builder = builder.max_concurrent(max);
    }

    if options.show_output == ShowOutput::All {
        builder = builder.on_success(move |report| {
            if let Err(e) = write_report(&mut capture::stdout(), report, &state) {
                warn!(task = %report.title, error = %e, "failed to write success report");
            }
        });
    }

    let group = builder.build()?;
    for task in &cfg.task {
        let cmd = task.cmd.clone();
        group.add(task.display_title(), move |handle| run_command_task(&cmd, handle));
    }
    Ok(group)
}

/// Run every task in `cfg` and report whether all of them succeeded.
pub fn run_tasks(cfg: &ConfigFile, options: &RunOptions) -> Result<bool> {
    info!(
        tasks = cfg.task.len(),
        max_concurrent = ?options.max_concurrent,
        "starting spin group"
    );

    let group = build_group(cfg, options)?;
    let all_succeeded = group.wait();

    cprintln!(
        "{}",
        status::render(group.status_counts(), group.render_state())
    );
    info!(all_succeeded, "spin group finished");
    Ok(all_succeeded)
}
