// src/exec/launch.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

use crate::config::ConfigFile;

/// Everything needed to start one application process.
///
/// The command line is `<executable> <args...> <entry>`, where `entry` is the
/// compiled main-process output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppLaunchSpec {
    pub executable: PathBuf,
    pub args: Vec<String>,
    pub entry: PathBuf,
    pub cwd: PathBuf,
    pub env: BTreeMap<String, String>,
}

impl AppLaunchSpec {
    /// Resolve the `[app]` section and `main.output` against the project root.
    pub fn from_config(cfg: &ConfigFile, root: &Path) -> Self {
        let executable = PathBuf::from(&cfg.app.executable);
        // Bare names are looked up on PATH; anything path-like is project relative.
        let executable = if executable.is_relative() && executable.components().count() > 1 {
            root.join(executable)
        } else {
            executable
        };

        let cwd = match cfg.app.cwd.as_deref() {
            Some(dir) => root.join(dir),
            None => root.to_path_buf(),
        };

        Self {
            executable,
            args: cfg.app.args.clone(),
            entry: root.join(&cfg.main_output),
            cwd,
            env: cfg.app.env.clone(),
        }
    }

    /// Command with piped output, ready to spawn.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.args(&self.args)
            .arg(&self.entry)
            .current_dir(&self.cwd)
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Human readable command line for logs and `--dry-run`.
    pub fn display(&self) -> String {
        let mut parts = vec![self.executable.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.push(self.entry.display().to_string());
        parts.join(" ")
    }
}
