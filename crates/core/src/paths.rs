// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Env var names and path resolution, lazily evaluated so tests can swap
//! working directory / environment without restarting the process.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

pub const ENV_DB_PATH: &str = "MINION_DB_PATH";
pub const ENV_DOCS_DIR: &str = "MINION_DOCS_DIR";
pub const ENV_PROJECT: &str = "MINION_PROJECT";
pub const ENV_CLASS: &str = "MINION_CLASS";
pub const ENV_FLOWS_DIR: &str = "MINION_FLOWS_DIR";
pub const ENV_MISSIONS_DIR: &str = "MINION_MISSIONS_DIR";

const WORK_ROOT: &str = "~/.minion_work";
const DEFAULT_DOCS_DIR: &str = "~/.minion_work/docs";
const WORK_DIR_NAME: &str = ".work";
const SWARM_DIR_NAME: &str = ".minion-swarm";

fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

static DB_PATH_CACHE: RwLock<Option<PathBuf>> = RwLock::new(None);

/// Resolve the comms/tasks SQLite path: `MINION_DB_PATH` > `MINION_PROJECT`
/// legacy layout > project-local `.work/minion.db`.
///
/// Cached after first resolution; call [`reset_db_path`] in tests that
/// change environment or working directory between cases.
pub fn resolve_db_path() -> PathBuf {
    if let Some(cached) = DB_PATH_CACHE.read().unwrap_or_else(PoisonError::into_inner).clone() {
        return cached;
    }
    let resolved = resolve_db_path_uncached();
    *DB_PATH_CACHE.write().unwrap_or_else(PoisonError::into_inner) = Some(resolved.clone());
    resolved
}

fn resolve_db_path_uncached() -> PathBuf {
    if let Ok(explicit) = std::env::var(ENV_DB_PATH) {
        if !explicit.is_empty() {
            return PathBuf::from(explicit);
        }
    }
    if let Ok(project) = std::env::var(ENV_PROJECT) {
        if !project.is_empty() {
            return expand_home(WORK_ROOT).join(project).join("minion.db");
        }
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(WORK_DIR_NAME)
        .join("minion.db")
}

/// Clear the cached DB path so the next call re-resolves from env/cwd.
pub fn reset_db_path() {
    *DB_PATH_CACHE.write().unwrap_or_else(PoisonError::into_inner) = None;
}

pub fn resolve_docs_dir() -> PathBuf {
    match std::env::var(ENV_DOCS_DIR) {
        Ok(v) if !v.is_empty() => PathBuf::from(v),
        _ => expand_home(DEFAULT_DOCS_DIR),
    }
}

pub fn resolve_work_dir(project_dir: Option<&Path>) -> PathBuf {
    let base = project_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    base.join(WORK_DIR_NAME)
}

pub fn resolve_swarm_runtime_dir(project_dir: Option<&Path>) -> PathBuf {
    let base = project_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    base.join(SWARM_DIR_NAME)
}

/// Resolve a possibly-relative path against a base directory, expanding `~`.
pub fn resolve_path(raw_value: &str, base: &Path) -> PathBuf {
    let expanded = expand_home(raw_value);
    if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
