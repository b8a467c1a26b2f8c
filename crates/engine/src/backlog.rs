// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backlog CRUD : add/list/show/update/kill/defer/
//! reopen. Promotion to a tracked requirement lives in [`crate::requirements::promote_from_backlog`].

use crate::error::{EngineError, EngineResult};
use minion_store::{BacklogItem, NewBacklogItem, Store};
use std::path::Path;

const BACKLOG_STATUSES: &[&str] = &["open", "killed", "deferred", "promoted"];
const BACKLOG_TYPE_DIRS: &[(&str, &str)] = &[
    ("bug", "bugs"),
    ("idea", "ideas"),
    ("request", "requests"),
    ("smell", "smells"),
    ("debt", "debt"),
];

pub fn add(
    store: &Store,
    file_path: &str,
    item_type: &str,
    title: &str,
    priority: &str,
    source: Option<&str>,
) -> EngineResult<BacklogItem> {
    if store.get_backlog_item(file_path)?.is_some() {
        return Err(EngineError::invalid(format!("backlog item {file_path} already exists")));
    }
    store
        .add_backlog_item(NewBacklogItem {
            file_path,
            item_type,
            title,
            priority,
            source,
        })
        .map_err(Into::into)
}

pub fn list(store: &Store) -> EngineResult<Vec<BacklogItem>> {
    store.list_backlog_items().map_err(Into::into)
}

pub fn show(store: &Store, file_path: &str) -> EngineResult<BacklogItem> {
    store
        .get_backlog_item(file_path)?
        .ok_or_else(|| EngineError::blocked(format!("backlog item {file_path} not found")))
}

pub fn update(
    store: &Store,
    file_path: &str,
    title: Option<&str>,
    priority: Option<&str>,
) -> EngineResult<BacklogItem> {
    show(store, file_path)?;
    store.update_backlog_item(file_path, title, priority)?;
    show(store, file_path)
}

fn set_status(store: &Store, file_path: &str, status: &str) -> EngineResult<BacklogItem> {
    if !BACKLOG_STATUSES.contains(&status) {
        return Err(EngineError::invalid(format!("unknown backlog status {status}")));
    }
    show(store, file_path)?;
    store.set_backlog_status(file_path, status, None)?;
    show(store, file_path)
}

pub fn kill(store: &Store, file_path: &str) -> EngineResult<BacklogItem> {
    set_status(store, file_path, "killed")
}

pub fn defer(store: &Store, file_path: &str) -> EngineResult<BacklogItem> {
    set_status(store, file_path, "deferred")
}

pub fn reopen(store: &Store, file_path: &str) -> EngineResult<BacklogItem> {
    set_status(store, file_path, "open")
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ReindexOutcome {
    pub registered: Vec<String>,
    pub skipped: Vec<String>,
}

/// Walks `<backlog_root>/{bugs,ideas,requests,smells,debt}/<slug>/README.md`
/// registering any item not already in the DB, title taken from the first
/// markdown heading (falling back to the slug). Idempotent: the filesystem
/// folder is the source of truth.
pub fn reindex(store: &Store, backlog_root: &Path, source: Option<&str>) -> EngineResult<ReindexOutcome> {
    let mut outcome = ReindexOutcome::default();
    for (item_type, dir_name) in BACKLOG_TYPE_DIRS {
        let type_dir = backlog_root.join(dir_name);
        let Ok(entries) = std::fs::read_dir(&type_dir) else { continue };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() || !path.join("README.md").is_file() {
                continue;
            }
            let slug = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
            let rel = format!("{dir_name}/{slug}/README.md");
            if store.get_backlog_item(&rel)?.is_some() {
                outcome.skipped.push(rel);
                continue;
            }
            let title = std::fs::read_to_string(path.join("README.md"))
                .ok()
                .and_then(|body| body.lines().find_map(|l| l.strip_prefix("# ").map(str::to_string)))
                .unwrap_or_else(|| slug.clone());
            store.add_backlog_item(NewBacklogItem {
                file_path: &rel,
                item_type,
                title: &title,
                priority: "normal",
                source,
            })?;
            outcome.registered.push(rel);
        }
    }
    Ok(outcome)
}
