// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::types::{WatchMode, WatcherRole};

/// Configuration exactly as read from `DevLaunch.toml`.
///
/// ```toml
/// [session]
/// restart_window = "5s"
///
/// [renderer]
/// cmd = "npx webpack serve --config webpack.renderer.js"
/// success_on_output = "compiled successfully"
/// serve_port = 9080
///
/// [main]
/// mode = "files"
/// cmd = "npx esbuild src/main/index.js --bundle --outfile=dist/electron/main.js"
/// watch = ["src/main/**/*.js"]
/// output = "dist/electron/main.js"
///
/// [app]
/// executable = "electron"
/// args = ["--inspect=5858"]
/// ```
///
/// Use [`ConfigFile`] (via `TryFrom`) for anything that needs validated values.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub session: SessionSection,

    /// Build watcher for the renderer sources.
    pub renderer: WatcherConfig,

    /// Build watcher for the main-process sources.
    pub main: WatcherConfig,

    /// How to launch the application once both builds are ready.
    pub app: AppConfig,
}

/// `[session]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSection {
    /// How long an exit of a process being replaced is tolerated after a
    /// restart was initiated.
    #[serde(default = "default_restart_window")]
    pub restart_window: String,
}

fn default_restart_window() -> String {
    "5s".to_string()
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            restart_window: default_restart_window(),
        }
    }
}

/// `[renderer]` / `[main]` sections.
#[derive(Debug, Clone, Deserialize)]
pub struct WatcherConfig {
    /// Shell command: a long-lived bundler (`stream`) or a one-shot build
    /// (`files`).
    pub cmd: String,

    #[serde(default)]
    pub mode: WatchMode,

    /// Regex marking a successful compile in the bundler output (`stream`).
    #[serde(default)]
    pub success_on_output: Option<String>,

    /// Regex marking a failed compile; checked before `success_on_output`.
    #[serde(default)]
    pub failure_on_output: Option<String>,

    /// Regex marking the start of a recompile (informational only).
    #[serde(default)]
    pub compiling_on_output: Option<String>,

    /// Renderer only: regex marking the dev server as able to serve output.
    #[serde(default)]
    pub ready_on_output: Option<String>,

    /// Renderer only: port probed after the first successful compile.
    #[serde(default)]
    pub serve_port: Option<u16>,

    /// Glob patterns (relative to the project root) that trigger a rebuild
    /// in `files` mode.
    #[serde(default)]
    pub watch: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    /// Quiet period before a rebuild in `files` mode, e.g. `"100ms"`.
    #[serde(default)]
    pub debounce: Option<String>,

    /// Main only: compiled entry file handed to the application.
    #[serde(default)]
    pub output: Option<String>,
}

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

impl WatcherConfig {
    /// Effective debounce; invalid values are rejected during validation.
    pub fn debounce_duration(&self) -> Duration {
        self.debounce
            .as_deref()
            .and_then(|s| crate::types::parse_duration(s).ok())
            .unwrap_or(DEFAULT_DEBOUNCE)
    }

    /// Whether any renderer-only serving readiness option is set.
    pub fn has_serve_probe(&self) -> bool {
        self.ready_on_output.is_some() || self.serve_port.is_some()
    }
}

/// `[app]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Application runtime, e.g. `electron`.
    pub executable: String,

    /// Arguments placed before the compiled main entry.
    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory, relative to the config file's directory.
    #[serde(default)]
    pub cwd: Option<String>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub restart_window: Duration,
    pub renderer: WatcherConfig,
    pub main: WatcherConfig,
    pub app: AppConfig,
    /// `main.output`, guaranteed present.
    pub main_output: String,
}

impl ConfigFile {
    /// Build from parts that have already been validated.
    pub(crate) fn new_unchecked(
        restart_window: Duration,
        renderer: WatcherConfig,
        main: WatcherConfig,
        app: AppConfig,
        main_output: String,
    ) -> Self {
        Self {
            restart_window,
            renderer,
            main,
            app,
            main_output,
        }
    }

    pub fn watcher(&self, role: WatcherRole) -> &WatcherConfig {
        match role {
            WatcherRole::Renderer => &self.renderer,
            WatcherRole::Main => &self.main,
        }
    }
}
