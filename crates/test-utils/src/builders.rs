#![allow(dead_code)]

use spingroup::config::{ConfigFile, ConfigSection, RawConfigFile, TaskConfig};
use spingroup::types::ShowOutput;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                task: Vec::new(),
            },
        }
    }

    pub fn with_task(mut self, task: TaskConfig) -> Self {
        self.config.task.push(task);
        self
    }

    pub fn max_concurrent(mut self, max: usize) -> Self {
        self.config.config.max_concurrent = Some(max);
        self
    }

    pub fn show_output(mut self, show: ShowOutput) -> Self {
        self.config.config.show_output = show;
        self
    }

    pub fn color(mut self, val: bool) -> Self {
        self.config.config.color = val;
        self
    }

    /// The unvalidated config, for tests that exercise validation itself.
    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(name: &str, cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                name: name.to_string(),
                title: None,
                cmd: cmd.to_string(),
            },
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.task.title = Some(title.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
