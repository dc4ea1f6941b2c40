// src/types.rs

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// Which of the two build pipelines a watcher belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatcherRole {
    /// Renderer sources, served to the application over a live-reload channel.
    Renderer,
    /// Main-process sources, written to the entry file the application runs.
    Main,
}

impl fmt::Display for WatcherRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatcherRole::Renderer => f.write_str("Renderer"),
            WatcherRole::Main => f.write_str("Main"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    Success,
    Failure,
}

/// One completed compilation reported by a build watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildEvent {
    pub status: BuildStatus,
    /// Compiler output collected since the previous event.
    pub diagnostics: Vec<String>,
}

impl BuildEvent {
    pub fn success(diagnostics: Vec<String>) -> Self {
        Self {
            status: BuildStatus::Success,
            diagnostics,
        }
    }

    pub fn failure(diagnostics: Vec<String>) -> Self {
        Self {
            status: BuildStatus::Failure,
            diagnostics,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == BuildStatus::Success
    }
}

/// How a build watcher obtains its completion events.
///
/// - `Stream`: the command is a long-lived bundler in its own watch mode and
///   completions are recognised from its output.
/// - `Files`: devlaunch watches the source tree and re-runs the command as a
///   one-shot build after each batch of changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchMode {
    #[default]
    Stream,
    Files,
}

impl FromStr for WatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stream" => Ok(WatchMode::Stream),
            "files" => Ok(WatchMode::Files),
            other => Err(format!(
                "invalid watcher mode: {other} (expected \"stream\" or \"files\")"
            )),
        }
    }
}

/// Parse a simple duration string like `"5s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let seconds_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };

    value
        .checked_mul(seconds_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{}' is too large", s))
}
