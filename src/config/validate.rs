// src/config/validate.rs

use globset::Glob;
use regex::Regex;

use crate::config::model::{AppConfig, ConfigFile, RawConfigFile, WatcherConfig};
use crate::errors::{DevlaunchError, Result};
use crate::types::{parse_duration, WatchMode, WatcherRole};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = DevlaunchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let restart_window =
            parse_nonzero_duration("[session].restart_window", &raw.session.restart_window)?;

        validate_watcher(WatcherRole::Renderer, &raw.renderer)?;
        validate_watcher(WatcherRole::Main, &raw.main)?;
        validate_app(&raw.app)?;

        let main_output = match raw.main.output.as_deref().map(str::trim) {
            Some(out) if !out.is_empty() => out.to_string(),
            _ => {
                return Err(DevlaunchError::ConfigError(
                    "[main].output must name the compiled entry file the app is launched with"
                        .to_string(),
                ));
            }
        };

        Ok(ConfigFile::new_unchecked(
            restart_window,
            raw.renderer,
            raw.main,
            raw.app,
            main_output,
        ))
    }
}

fn section(role: WatcherRole) -> &'static str {
    match role {
        WatcherRole::Renderer => "[renderer]",
        WatcherRole::Main => "[main]",
    }
}

fn validate_watcher(role: WatcherRole, cfg: &WatcherConfig) -> Result<()> {
    let section = section(role);

    if cfg.cmd.trim().is_empty() {
        return Err(DevlaunchError::ConfigError(format!(
            "{section}.cmd must not be empty"
        )));
    }

    for (key, pattern) in [
        ("success_on_output", &cfg.success_on_output),
        ("failure_on_output", &cfg.failure_on_output),
        ("compiling_on_output", &cfg.compiling_on_output),
        ("ready_on_output", &cfg.ready_on_output),
    ] {
        if let Some(pattern) = pattern {
            Regex::new(pattern).map_err(|e| {
                DevlaunchError::ConfigError(format!(
                    "{section}.{key} is not a valid regex ({pattern}): {e}"
                ))
            })?;
        }
    }

    if role == WatcherRole::Main && cfg.has_serve_probe() {
        return Err(DevlaunchError::ConfigError(
            "[main] cannot use ready_on_output or serve_port; serving readiness only applies to the renderer"
                .to_string(),
        ));
    }

    if let Some(ref debounce) = cfg.debounce {
        parse_nonzero_duration(&format!("{section}.debounce"), debounce)?;
    }

    match cfg.mode {
        WatchMode::Stream => {
            if cfg.success_on_output.is_none() {
                return Err(DevlaunchError::ConfigError(format!(
                    "{section}.success_on_output is required in stream mode"
                )));
            }
        }
        WatchMode::Files => {
            if cfg.watch.is_empty() {
                return Err(DevlaunchError::ConfigError(format!(
                    "{section}.watch needs at least one pattern in files mode"
                )));
            }
            if cfg.ready_on_output.is_some() {
                return Err(DevlaunchError::ConfigError(format!(
                    "{section}.ready_on_output is only supported in stream mode"
                )));
            }
            for pattern in cfg.watch.iter().chain(cfg.exclude.iter()) {
                Glob::new(pattern).map_err(|e| {
                    DevlaunchError::ConfigError(format!(
                        "{section} has an invalid glob pattern ({pattern}): {e}"
                    ))
                })?;
            }
        }
    }

    Ok(())
}

fn validate_app(app: &AppConfig) -> Result<()> {
    if app.executable.trim().is_empty() {
        return Err(DevlaunchError::ConfigError(
            "[app].executable must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn parse_nonzero_duration(key: &str, value: &str) -> Result<std::time::Duration> {
    let dur = parse_duration(value)
        .map_err(|e| DevlaunchError::ConfigError(format!("{key}: {e}")))?;
    if dur.is_zero() {
        return Err(DevlaunchError::ConfigError(format!(
            "{key} must be greater than zero"
        )));
    }
    Ok(dur)
}
