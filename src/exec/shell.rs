// src/exec/shell.rs

use tokio::process::Command;

/// Build a shell command appropriate for the platform.
///
/// Watcher commands are written as shell lines in the config
/// (`npx webpack --watch ...`), so they go through `sh -c` / `cmd /C`.
pub fn shell_command(line: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(line);
        c
    }
}
