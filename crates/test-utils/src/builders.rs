#![allow(dead_code)]

use std::collections::BTreeMap;

use devlaunch::config::{AppConfig, ConfigFile, RawConfigFile, SessionSection, WatcherConfig};
use devlaunch::types::WatchMode;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from a valid config: a stream renderer, a files main watcher
/// writing `dist/main.js`, and `electron` as the app.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                session: SessionSection::default(),
                renderer: WatcherConfigBuilder::stream("npx webpack serve")
                    .success_on_output("compiled successfully")
                    .build(),
                main: WatcherConfigBuilder::files("npx esbuild src/main/index.js")
                    .watch("src/main/**/*.js")
                    .output("dist/main.js")
                    .build(),
                app: AppConfig {
                    executable: "electron".to_string(),
                    args: Vec::new(),
                    cwd: None,
                    env: BTreeMap::new(),
                },
            },
        }
    }

    pub fn restart_window(mut self, window: &str) -> Self {
        self.config.session.restart_window = window.to_string();
        self
    }

    pub fn renderer(mut self, watcher: WatcherConfig) -> Self {
        self.config.renderer = watcher;
        self
    }

    pub fn main(mut self, watcher: WatcherConfig) -> Self {
        self.config.main = watcher;
        self
    }

    pub fn app(mut self, executable: &str, args: &[&str]) -> Self {
        self.config.app.executable = executable.to_string();
        self.config.app.args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn app_env(mut self, key: &str, value: &str) -> Self {
        self.config.app.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn app_cwd(mut self, cwd: &str) -> Self {
        self.config.app.cwd = Some(cwd.to_string());
        self
    }

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

/// Builder for `WatcherConfig`.
pub struct WatcherConfigBuilder {
    watcher: WatcherConfig,
}

impl WatcherConfigBuilder {
    fn with_mode(cmd: &str, mode: WatchMode) -> Self {
        Self {
            watcher: WatcherConfig {
                cmd: cmd.to_string(),
                mode,
                success_on_output: None,
                failure_on_output: None,
                compiling_on_output: None,
                ready_on_output: None,
                serve_port: None,
                watch: Vec::new(),
                exclude: Vec::new(),
                debounce: None,
                output: None,
            },
        }
    }

    pub fn stream(cmd: &str) -> Self {
        Self::with_mode(cmd, WatchMode::Stream)
    }

    pub fn files(cmd: &str) -> Self {
        Self::with_mode(cmd, WatchMode::Files)
    }

    pub fn success_on_output(mut self, pattern: &str) -> Self {
        self.watcher.success_on_output = Some(pattern.to_string());
        self
    }

    pub fn failure_on_output(mut self, pattern: &str) -> Self {
        self.watcher.failure_on_output = Some(pattern.to_string());
        self
    }

    pub fn compiling_on_output(mut self, pattern: &str) -> Self {
        self.watcher.compiling_on_output = Some(pattern.to_string());
        self
    }

    pub fn ready_on_output(mut self, pattern: &str) -> Self {
        self.watcher.ready_on_output = Some(pattern.to_string());
        self
    }

    pub fn serve_port(mut self, port: u16) -> Self {
        self.watcher.serve_port = Some(port);
        self
    }

    pub fn watch(mut self, pattern: &str) -> Self {
        self.watcher.watch.push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.watcher.exclude.push(pattern.to_string());
        self
    }

    pub fn debounce(mut self, duration: &str) -> Self {
        self.watcher.debounce = Some(duration.to_string());
        self
    }

    pub fn output(mut self, path: &str) -> Self {
        self.watcher.output = Some(path.to_string());
        self
    }

    pub fn build(self) -> WatcherConfig {
        self.watcher
    }
}
