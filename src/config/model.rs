// src/config/model.rs

use serde::Deserialize;

use crate::types::ShowOutput;

/// Configuration as read from TOML, before validation.
///
/// ```toml
/// [config]
/// max_concurrent = 2
/// show_output = "failures"
///
/// [[task]]
/// name = "build"
/// title = "Building {{bold:app}}"
/// cmd = "cargo build"
/// ```
///
/// Tasks are an array of tables so that declaration order, which is also
/// display order, survives deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub task: Vec<TaskConfig>,
}

/// Validated configuration. Build one with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub task: Vec<TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(config: ConfigSection, task: Vec<TaskConfig>) -> Self {
        Self { config, task }
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Cap on simultaneously running tasks. Absent means one thread per task.
    #[serde(default)]
    pub max_concurrent: Option<usize>,

    /// Print reports for failed tasks once all tasks are done.
    #[serde(default = "default_true")]
    pub auto_debrief: bool,

    /// Which tasks get their output printed after the run.
    #[serde(default)]
    pub show_output: ShowOutput,

    /// Make stdin read as end-of-file for code running inside tasks.
    #[serde(default = "default_true")]
    pub mask_stdin: bool,

    /// Emit ANSI colors.
    #[serde(default = "default_true")]
    pub color: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            max_concurrent: None,
            auto_debrief: true,
            show_output: ShowOutput::default(),
            mask_stdin: true,
            color: true,
        }
    }
}

/// One `[[task]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Unique identifier, used in logs and as the default title.
    pub name: String,

    /// Line shown next to the spinner. May contain `{{tag:text}}` markup.
    #[serde(default)]
    pub title: Option<String>,

    /// Shell command to run.
    pub cmd: String,
}

impl TaskConfig {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}
