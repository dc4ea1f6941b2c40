// src/watch/patterns.rs

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Compiled watch/exclude glob patterns for a `files` mode watcher.
///
/// Patterns are relative to the project root; [`WatchProfile::matches`]
/// expects root-relative paths with forward slashes (e.g. `"src/main/index.js"`).
#[derive(Clone)]
pub struct WatchProfile {
    watch_set: GlobSet,
    exclude_set: Option<GlobSet>,
}

impl fmt::Debug for WatchProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchProfile")
            .field("watch", &self.watch_set.len())
            .field("exclude", &self.exclude_set.as_ref().map(GlobSet::len))
            .finish()
    }
}

impl WatchProfile {
    pub fn new(watch: &[String], exclude: &[String]) -> Result<Self> {
        let watch_set = build_globset(watch).context("building watch globset")?;

        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(exclude).context("building exclude globset")?)
        };

        Ok(Self {
            watch_set,
            exclude_set,
        })
    }

    /// Returns true if a change to `rel_path` should trigger a rebuild.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.watch_set.is_match(rel_path) {
            return false;
        }
        match &self.exclude_set {
            Some(exclude) => !exclude.is_match(rel_path),
            None => true,
        }
    }

    /// Like [`matches`](Self::matches) for an absolute event path. Paths
    /// outside `root` never match.
    pub fn matches_path(&self, root: &Path, path: &Path) -> bool {
        relative_str(root, path)
            .map(|rel| self.matches(&rel))
            .unwrap_or(false)
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Convert `path` into a string relative to `root`, with forward slashes.
///
/// Falls back to comparing canonicalized paths, since some platforms report
/// events under a different absolute prefix (symlinks, `/private/var/...`).
/// A path that was just deleted cannot be canonicalized; its parent can.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_string_lossy().replace('\\', "/"));
    }

    let root_canon = root.canonicalize().ok()?;
    let path_canon = match path.canonicalize() {
        Ok(p) => p,
        Err(_) => {
            let parent = path.parent()?.canonicalize().ok()?;
            parent.join(path.file_name()?)
        }
    };

    path_canon
        .strip_prefix(&root_canon)
        .ok()
        .map(|rel| rel.to_string_lossy().replace('\\', "/"))
}
