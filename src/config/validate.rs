// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, SpinError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SpinError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.task))
    }
}

pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_tasks(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(SpinError::ConfigError(
            "config must contain at least one [[task]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    // show_output is strongly typed and validated during deserialization.
    if cfg.config.max_concurrent == Some(0) {
        return Err(SpinError::ConfigError(
            "[config].max_concurrent must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_tasks(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for (position, task) in cfg.task.iter().enumerate() {
        if task.name.trim().is_empty() {
            return Err(SpinError::ConfigError(format!(
                "task #{} has an empty name",
                position + 1
            )));
        }
        if !seen.insert(task.name.as_str()) {
            return Err(SpinError::ConfigError(format!(
                "duplicate task name '{}'",
                task.name
            )));
        }
        if task.cmd.trim().is_empty() {
            return Err(SpinError::ConfigError(format!(
                "task '{}' has an empty cmd",
                task.name
            )));
        }
    }
    Ok(())
}
