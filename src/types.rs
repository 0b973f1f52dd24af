// src/types.rs

use std::str::FromStr;

use serde::Deserialize;

/// Which finished tasks get their captured output printed after a run.
///
/// - `Failures`: only failed tasks are debriefed (default).
/// - `All`: successful tasks are reported too, through the group's success
///   callback.
/// - `Never`: the automatic debrief is skipped; only the exit code tells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShowOutput {
    #[default]
    Failures,
    All,
    Never,
}

impl FromStr for ShowOutput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "failures" | "failed" => Ok(ShowOutput::Failures),
            "all" => Ok(ShowOutput::All),
            "never" | "none" => Ok(ShowOutput::Never),
            other => Err(format!(
                "invalid show_output: {other} (expected \"failures\", \"all\" or \"never\")"
            )),
        }
    }
}
