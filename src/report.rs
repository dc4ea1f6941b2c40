// src/report.rs

//! Human-facing log output for builds and application output.
//!
//! Build results are rendered as a framed block per pipeline:
//!
//! ```text
//! ┏ Main Process ---------------
//!
//!   build succeeded
//!   main.js  1.2 KiB
//!
//! ┗ ----------------------------
//! ```

use tracing::{info, warn};

use crate::types::{BuildEvent, BuildStatus, WatcherRole};

const HEADER_WIDTH: usize = 19;
const FOOTER_WIDTH: usize = 28;

/// Render a framed report block for one build event.
pub fn build_report(role: WatcherRole, event: &BuildEvent) -> String {
    let status = match event.status {
        BuildStatus::Success => "build succeeded",
        BuildStatus::Failure => "build failed",
    };

    let mut lines = vec![status.to_string()];
    lines.extend(event.diagnostics.iter().cloned());
    framed(role, &lines)
}

fn framed(role: WatcherRole, lines: &[String]) -> String {
    let name = role.to_string();
    let dashes = "-".repeat(HEADER_WIDTH.saturating_sub(name.len()));

    let mut out = format!("┏ {name} Process {dashes}\n\n");
    for line in lines {
        out.push_str("  ");
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');
    out.push_str("┗ ");
    out.push_str(&"-".repeat(FOOTER_WIDTH));
    out
}

pub fn log_build_event(role: WatcherRole, event: &BuildEvent) {
    let block = build_report(role, event);
    match event.status {
        BuildStatus::Success => info!(target: "build", %role, "\n{block}"),
        BuildStatus::Failure => warn!(target: "build", %role, "\n{block}"),
    }
}

pub fn log_compiling(role: WatcherRole) {
    info!(target: "build", %role, "\n{}", framed(role, &["compiling...".to_string()]));
}

/// True if the line has anything worth showing (at least one letter or digit).
pub fn has_visible_text(line: &str) -> bool {
    line.chars().any(char::is_alphanumeric)
}

/// Log one line of application output. Blank and decoration-only lines are
/// dropped.
pub fn log_app_output(stream: &str, line: &str) {
    if !has_visible_text(line) {
        return;
    }
    match stream {
        "stderr" => warn!(target: "app", stream, "{line}"),
        _ => info!(target: "app", stream, "{line}"),
    }
}
